//! Unpack engine: validates an incoming wire message against a schema
//! registry and decodes it into a caller-owned record.
//!
//! Every byte here is untrusted. Bounds are checked before any read, unknown
//! tuple ids are dropped for forward compatibility, and recursion into
//! nested TUPLE_ARRAY records is capped the same way `schema::get_tuple_elem`
//! caps id resolution.

use packed_struct::prelude::*;

use crate::error::{Result, TupError};
use crate::schema::{ActionStructDesc, Registry, MAX_DEPTH};
use crate::tuple::{align_to_next_tuple, Tuple};
use crate::validate::unpack_value;
use crate::wire::{self, ElemsWord, HeaderWord, RouteWord};

const HEADER_BYTES: usize = 4;

/// Decodes a wire message into `dest`, returning `(action_id, dest_addr)`.
/// `dest_addr` comes from the route sub-header's receiver field when the
/// message carries one, 0 otherwise.
pub fn unpack(registry: &Registry, src: &[u8], dest: &mut [u8]) -> Result<(u32, u32)> {
    if src.len() < HEADER_BYTES {
        return Err(TupError::BufferOverflow {
            offset: 0,
            size: src.len(),
        });
    }
    let header = HeaderWord::unpack(src[0..HEADER_BYTES].try_into().unwrap())
        .map_err(|_| TupError::MalformedHeader("header word"))?;
    if !header.elems_present {
        return Err(TupError::MalformedHeader("elems_present clear"));
    }
    let action_id = wire::make_action_id(header.class, header.subclass, header.action);

    let mut pos = HEADER_BYTES;
    let route = if header.route_present {
        if pos + RouteWord::BYTES > src.len() {
            return Err(TupError::MalformedHeader("truncated route sub-header"));
        }
        let r = RouteWord::read(&src[pos..pos + RouteWord::BYTES]);
        pos += RouteWord::BYTES;
        Some(r)
    } else {
        None
    };

    if pos + ElemsWord::BYTES > src.len() {
        return Err(TupError::MalformedHeader("truncated elems sub-header"));
    }
    let elems = ElemsWord::read(&src[pos..pos + ElemsWord::BYTES])?;
    pos += ElemsWord::BYTES;
    if elems.size == 0 || elems.num_tuples == 0 {
        return Err(TupError::MalformedHeader("empty message"));
    }

    let header_bytes = pos;
    let region_end = header_bytes
        .checked_add(elems.size as usize * 4)
        .ok_or(TupError::MalformedHeader("size overflow"))?;
    if region_end > src.len() {
        return Err(TupError::MalformedHeader("size exceeds buffer"));
    }

    let action = registry.get_action_def(action_id)?;
    let dest_addr = route.map(|r| r.receiver).unwrap_or(0);

    let mut cursor = header_bytes;
    let mut tuples_seen = 0u32;
    while cursor < region_end {
        let end = unpack_tuple_at(src, cursor, region_end, action.desc, dest, 0, 0)?;
        tuples_seen += 1;
        cursor = align_to_next_tuple(end);
    }
    if cursor != region_end {
        return Err(TupError::MalformedHeader("trailing bytes after last tuple"));
    }
    if tuples_seen != elems.num_tuples {
        return Err(TupError::MalformedHeader("num_tuples does not match tuple stream"));
    }

    log::debug!(
        "unpacked action {:#08x}: {} tuples, {} bytes",
        action_id,
        tuples_seen,
        region_end - header_bytes
    );

    Ok((action_id, dest_addr))
}

/// Parses and applies one tuple at `src[pos..]`, returning the offset just
/// past its body. `dest_base` is added to every elem's schema offset — 0 at
/// the root, the enclosing sub-record's base inside a TUPLE_ARRAY instance.
fn unpack_tuple_at(
    src: &[u8],
    pos: usize,
    region_end: usize,
    desc: &'static ActionStructDesc,
    dest: &mut [u8],
    dest_base: usize,
    depth: u32,
) -> Result<usize> {
    if depth > MAX_DEPTH {
        return Err(TupError::TooDeep { cap: MAX_DEPTH });
    }
    let (tuple, data_start) = Tuple::parse(src, pos)?;
    let tuple_end = pos + tuple.tuple_size();
    if tuple_end > region_end {
        return Err(TupError::TruncatedTuple {
            offset: pos,
            size: tuple.tuple_size(),
            end: region_end,
        });
    }

    if let Tuple::TupleArray { id, count, elem_bytes } = tuple {
        if let Some(child) = desc.get_child_desc(id, 0) {
            for i in 0..count as usize {
                let inst_start = data_start + i * elem_bytes as usize;
                let inst_end = inst_start + elem_bytes as usize;
                let child_base = dest_base + child.offset as usize + i * child.size as usize;
                unpack_region(src, inst_start, inst_end, child, dest, child_base, depth + 1)?;
            }
        }
        // Unknown nested record id: bytes are still accounted for via
        // tuple_end, the inner stream is simply never decoded.
    } else {
        let wwidth = tuple.elem_wire_size() as usize;
        for i in 0..tuple.data_count() {
            let src_off = data_start + i as usize * wwidth;
            if src_off + wwidth > src.len() {
                return Err(TupError::BufferOverflow {
                    offset: src_off,
                    size: src.len(),
                });
            }
            if let Some(elem) = desc.get_tuple_elem(&tuple, i, 0) {
                if wwidth as u32 != elem.wire_width() {
                    return Err(TupError::TypeMismatch {
                        id: tuple.id(),
                        wire: wwidth as u32,
                        schema: elem.wire_width(),
                    });
                }
                unpack_value(elem, src, src_off, dest, dest_base + elem.offset as usize)?;
            }
        }
    }
    Ok(tuple_end)
}

/// Walks every tuple in `src[start..end)` against `desc`, used both as the
/// body of one TUPLE_ARRAY instance and (conceptually) the root stream.
fn unpack_region(
    src: &[u8],
    start: usize,
    end: usize,
    desc: &'static ActionStructDesc,
    dest: &mut [u8],
    dest_base: usize,
    depth: u32,
) -> Result<()> {
    let mut pos = start;
    while pos < end {
        let tuple_end = unpack_tuple_at(src, pos, end, desc, dest, dest_base, depth)?;
        pos = align_to_next_tuple(tuple_end);
    }
    if pos != end {
        return Err(TupError::TruncatedTuple {
            offset: pos,
            size: 0,
            end,
        });
    }
    Ok(())
}
