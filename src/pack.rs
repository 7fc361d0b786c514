//! Pack engine: walk a descriptor in ascending tuple-id order, collapsing
//! contiguous same-shape ids into array tuples, and emit a self-describing
//! byte stream.
//!
//! Tuple shape is decided up front by counting the contiguous run before
//! writing anything, rather than mutating an already-written tuple in
//! place — this also means a tuple's shape and sub-header are known and
//! written exactly once.

use crate::error::{Result, TupError};
use crate::schema::{ActionStructDesc, ArrayKind, Elem, PackItem, Registry};
use crate::tuple::{align_to_next_tuple, Tuple};
use crate::validate::pack_value;
use crate::wire::{self, ElemsWord, HeaderWord, RouteWord};

const HEADER_BYTES: usize = 4;

fn ceil_words(bytes: u32) -> u16 {
    (((bytes + 3) / 4) as u16).max(0)
}

fn make_run_tuple(first: &Elem, count: u32) -> Result<Tuple> {
    let id = first.id;
    match (first.ty.array_kind(first.value2), count) {
        (ArrayKind::Micro, 1) => Ok(Tuple::Micro { id }),
        (ArrayKind::Micro, n) => Ok(Tuple::MicroArray { id, count: u16_count(n)? }),
        (ArrayKind::Std4, 1) => Ok(Tuple::Std { id, size_words: 1 }),
        (ArrayKind::Std4, n) => Ok(Tuple::StdArray { id, count: u16_count(n)? }),
        (ArrayKind::Var(width), 1) => Ok(Tuple::Std {
            id,
            size_words: ceil_words(width),
        }),
        (ArrayKind::Var(width), n) => Ok(Tuple::VarArray {
            id,
            count: u16_count(n)?,
            elem_bytes: u16::try_from(width).map_err(|_| TupError::MessageTooLong(width))?,
        }),
    }
}

fn u16_count(n: u32) -> Result<u16> {
    u16::try_from(n).map_err(|_| TupError::MessageTooLong(n))
}

/// Finds the length of the contiguous compressible run starting at `first`.
fn run_length(desc: &ActionStructDesc, first: &'static Elem) -> u32 {
    let mut count = 1u32;
    let mut last = first;
    loop {
        match desc.next_item(last.id) {
            Some(PackItem::Elem(next))
                if next.id == last.id + 1 && next.ty.arrayable_with(last.ty, last.value2, next.value2) =>
            {
                last = next;
                count += 1;
            }
            _ => break,
        }
    }
    count
}

/// Total packed byte length of one instance of `desc`, computed purely
/// from the schema (used to size a child's TUPLE_ARRAY `elem_bytes`).
/// Rounded up to a 4-byte multiple so that every array instance — not
/// just the first — starts its own tuple stream at a word boundary.
fn struct_body_size(desc: &ActionStructDesc) -> Result<u32> {
    let mut offset = 0usize;
    let mut item = desc.first_item();
    while let Some(it) = item {
        offset = align_to_next_tuple(offset);
        match it {
            PackItem::Elem(first) => {
                let count = run_length(desc, first);
                let tuple = make_run_tuple(first, count)?;
                offset += tuple.tuple_size();
                let last_id = first.id + (count as u16 - 1);
                item = desc.next_item(last_id);
            }
            PackItem::Child(child) => {
                let elem_bytes = struct_body_size(child)?;
                let tuple = Tuple::TupleArray {
                    id: child.tuple_id,
                    count: u16_count(child.array_elems)?,
                    elem_bytes: u16::try_from(elem_bytes)
                        .map_err(|_| TupError::MessageTooLong(elem_bytes))?,
                };
                offset += tuple.tuple_size();
                item = desc.next_item(child.tuple_id);
            }
        }
    }
    Ok(align_to_next_tuple(offset) as u32)
}

/// Writes the tuple stream for one instance of `desc`, rooted at `base`
/// within `src`. `tuple_count`, when present, is bumped once per tuple
/// written at this level — `None` for the contents of a nested
/// TUPLE_ARRAY instance, whose tuples are not separately counted in the
/// message's `num_tuples`: only top-level tuples are counted; recursion
/// into TUPLE_ARRAY is bounded by bytes, not count.
fn emit_struct(
    desc: &'static ActionStructDesc,
    src: &[u8],
    base: usize,
    dest: &mut [u8],
    offset: &mut usize,
    mut tuple_count: Option<&mut u32>,
) -> Result<()> {
    let mut item = desc.first_item();
    while let Some(it) = item {
        *offset = align_to_next_tuple(*offset);
        match it {
            PackItem::Elem(first) => {
                let count = run_length(desc, first);
                let tuple = make_run_tuple(first, count)?;
                let size = tuple.tuple_size();
                if *offset + size > dest.len() {
                    return Err(TupError::BufferTooSmall {
                        need: *offset + size,
                        have: dest.len(),
                    });
                }
                let data_start = tuple.write(dest, *offset)?;
                log::trace!("pack: elem run id={} count={} at {}", first.id, count, offset);
                let body = tuple.body_bytes();
                for b in &mut dest[data_start..data_start + body] {
                    *b = 0;
                }
                let mut e = first;
                let wwidth = e.wire_width() as usize;
                for i in 0..count as usize {
                    let src_off = base + e.offset as usize;
                    if src_off + e.native_width() as usize > src.len() {
                        return Err(TupError::BufferOverflow {
                            offset: src_off,
                            size: src.len(),
                        });
                    }
                    pack_value(e, src, src_off, dest, data_start + i * wwidth)?;
                    if i + 1 < count as usize {
                        e = match desc.next_item(e.id) {
                            Some(PackItem::Elem(next)) => next,
                            _ => unreachable!("run_length already validated this step"),
                        };
                    }
                }
                if let Some(tc) = tuple_count.as_mut() {
                    **tc += 1;
                }
                *offset = data_start + body;
                let last_id = first.id + (count as u16 - 1);
                item = desc.next_item(last_id);
            }
            PackItem::Child(child) => {
                let elem_bytes = struct_body_size(child)?;
                let tuple = Tuple::TupleArray {
                    id: child.tuple_id,
                    count: u16_count(child.array_elems)?,
                    elem_bytes: u16::try_from(elem_bytes)
                        .map_err(|_| TupError::MessageTooLong(elem_bytes))?,
                };
                let size = tuple.tuple_size();
                if *offset + size > dest.len() {
                    return Err(TupError::BufferTooSmall {
                        need: *offset + size,
                        have: dest.len(),
                    });
                }
                let data_start = tuple.write(dest, *offset)?;
                log::trace!(
                    "pack: child id={} array_elems={} elem_bytes={}",
                    child.tuple_id,
                    child.array_elems,
                    elem_bytes
                );
                // Each instance occupies a fixed `elem_bytes` stride (already
                // word-aligned by `struct_body_size`) so instances are placed
                // by arithmetic rather than by threading one offset through
                // all of them — that keeps every instance self-aligned even
                // when one instance's real content is shorter than the stride.
                for i in 0..child.array_elems as usize {
                    let child_base = base + child.offset as usize + i * child.size as usize;
                    let instance_start = data_start + i * elem_bytes as usize;
                    let mut inner_offset = instance_start;
                    emit_struct(child, src, child_base, dest, &mut inner_offset, None)?;
                    let instance_end = instance_start + elem_bytes as usize;
                    for b in &mut dest[inner_offset..instance_end] {
                        *b = 0;
                    }
                }
                if let Some(tc) = tuple_count.as_mut() {
                    **tc += 1;
                }
                *offset = data_start + child.array_elems as usize * elem_bytes as usize;
                item = desc.next_item(child.tuple_id);
            }
        }
    }
    Ok(())
}

/// Packs `src` (validated only by size against `desc.size`) under
/// `action_id` into `dest`, returning the number of bytes written.
/// `dest_addr` is accepted for signature parity with `unpack` but is not
/// placed on the wire by the core engine — see `pack_routed` for the
/// route-carrying extension.
pub fn pack(
    registry: &Registry,
    action_id: u32,
    src: &[u8],
    dest: &mut [u8],
    flags: u32,
    _dest_addr: u32,
) -> Result<usize> {
    pack_inner(registry, action_id, src, dest, flags, None)
}

/// Extension: also writes the optional route sub-header.
pub fn pack_routed(
    registry: &Registry,
    action_id: u32,
    src: &[u8],
    dest: &mut [u8],
    flags: u32,
    route: RouteWord,
) -> Result<usize> {
    pack_inner(registry, action_id, src, dest, flags, Some(route))
}

fn pack_inner(
    registry: &Registry,
    action_id: u32,
    src: &[u8],
    dest: &mut [u8],
    flags: u32,
    route: Option<RouteWord>,
) -> Result<usize> {
    let action_def = registry.get_action_def(action_id)?;
    let desc = action_def.desc;
    if src.len() < desc.size as usize {
        return Err(TupError::BufferTooSmall {
            need: desc.size as usize,
            have: src.len(),
        });
    }
    if flags & wire::FLAG_BROADCAST != 0 && route.is_none() {
        return Err(TupError::InvalidArgument(
            "BROADCAST requires pack_routed (route sub-header)",
        ));
    }

    let header_bytes = HEADER_BYTES + route.map_or(0, |_| RouteWord::BYTES) + ElemsWord::BYTES;
    if dest.len() < header_bytes {
        return Err(TupError::BufferTooSmall {
            need: header_bytes,
            have: dest.len(),
        });
    }

    let header = HeaderWord {
        class: wire::action_class(action_id),
        subclass: wire::action_subclass(action_id),
        action: wire::action_action(action_id),
        status: false,
        priority: flags & wire::FLAG_PRIORITY != 0,
        datagram: flags & wire::FLAG_DATAGRAM != 0,
        route_present: route.is_some(),
        elems_present: true,
        // FLAG_REPLY_ACK (bit 29) lands in this field's low bit alongside
        // whatever a caller passes as vendor data; FLAG_REPLY_NACK (bit 28)
        // has no corresponding header bit at all and is silently dropped.
        // The flag/header bit map doesn't actually give REPLY_ACK/NACK a
        // distinct home in `status`; reconciling that is unresolved.
        vendor: ((flags >> 29) & 0x7) as u8,
    };
    use packed_struct::PackedStruct;
    dest[0..HEADER_BYTES]
        .copy_from_slice(&header.pack().map_err(|_| TupError::InvalidArgument("header"))?);

    let mut offset = HEADER_BYTES;
    if let Some(r) = route {
        r.write(&mut dest[offset..offset + RouteWord::BYTES]);
        offset += RouteWord::BYTES;
    }
    let elems_offset = offset;
    offset += ElemsWord::BYTES;

    let mut tuple_count = 0u32;
    emit_struct(desc, src, 0, dest, &mut offset, Some(&mut tuple_count))?;

    // The last tuple written may end mid-word (an odd-count MICRO_ARRAY, or a
    // VAR_ARRAY whose count * elem_bytes isn't a multiple of 4) — every
    // interior tuple gets this padding for free from the `align_to_next_tuple`
    // at the top of each loop iteration, but nothing rounds up after the
    // final one. Pad it here the same way so the region always ends aligned.
    let aligned_offset = align_to_next_tuple(offset);
    if aligned_offset > dest.len() {
        return Err(TupError::BufferTooSmall {
            need: aligned_offset,
            have: dest.len(),
        });
    }
    for b in &mut dest[offset..aligned_offset] {
        *b = 0;
    }
    offset = aligned_offset;

    let body_bytes = offset - header_bytes;
    debug_assert_eq!(body_bytes % 4, 0);
    let size = (body_bytes / 4) as u32;
    if size >= ElemsWord::MAX_SIZE {
        return Err(TupError::MessageTooLong(size));
    }
    let elems = ElemsWord {
        num_tuples: tuple_count,
        remaining: 0,
        size,
    };
    elems.write(&mut dest[elems_offset..elems_offset + ElemsWord::BYTES])?;

    log::debug!(
        "pack: action=0x{:06x} tuples={} bytes={}",
        action_id,
        tuple_count,
        offset
    );
    Ok(offset)
}
