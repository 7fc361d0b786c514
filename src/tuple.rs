//! Tuple shapes: the five self-describing bodies that follow a tuple
//! descriptor on the wire.
//!
//! Every shape carries enough of its own header (size/count/elem width) to
//! be parsed and skipped without consulting the schema — the schema is
//! only needed afterwards, to resolve what an id's data *means*.

use crate::error::{Result, TupError};
use crate::wire::{align4, TupleDescriptor, TupleType};

/// One parsed tuple header, positioned at some offset in a message buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tuple {
    /// Single value, word-granular length — covers scalars ≥ 4 bytes as
    /// well as variable-length string/data/uuid singles.
    Std { id: u16, size_words: u16 },
    /// Single 8/16-bit scalar, widened to a 2-byte wire slot.
    Micro { id: u16 },
    /// Continuous run of 4-byte-wide STD-shape elems starting at `id`.
    StdArray { id: u16, count: u16 },
    /// Continuous run of MICRO-shape elems starting at `id`.
    MicroArray { id: u16, count: u16 },
    /// Continuous run of same-width STD-shape elems whose width isn't 4
    /// bytes (doubles, uuids, fixed-length strings), byte-granular.
    VarArray { id: u16, count: u16, elem_bytes: u16 },
    /// Array of `count` nested sub-records, `elem_bytes` bytes each,
    /// recursed into by the schema's child descriptors.
    TupleArray { id: u16, count: u16, elem_bytes: u16 },
}

impl Tuple {
    pub fn id(&self) -> u16 {
        match *self {
            Tuple::Std { id, .. }
            | Tuple::Micro { id }
            | Tuple::StdArray { id, .. }
            | Tuple::MicroArray { id, .. }
            | Tuple::VarArray { id, .. }
            | Tuple::TupleArray { id, .. } => id,
        }
    }

    pub fn descriptor_type(&self) -> TupleType {
        match self {
            Tuple::Std { .. } => TupleType::Std,
            Tuple::Micro { .. } => TupleType::Micro,
            Tuple::StdArray { .. } => TupleType::StdArray,
            Tuple::MicroArray { .. } => TupleType::MicroArray,
            Tuple::VarArray { .. } => TupleType::VarArray,
            Tuple::TupleArray { .. } => TupleType::TupleArray,
        }
    }

    /// Number of elems this tuple carries (1 for Std/Micro).
    pub fn data_count(&self) -> u32 {
        match *self {
            Tuple::Std { .. } | Tuple::Micro { .. } => 1,
            Tuple::StdArray { count, .. }
            | Tuple::MicroArray { count, .. }
            | Tuple::VarArray { count, .. }
            | Tuple::TupleArray { count, .. } => count as u32,
        }
    }

    /// Per-elem wire width in bytes.
    pub fn elem_wire_size(&self) -> u32 {
        match *self {
            Tuple::Std { size_words, .. } => size_words as u32 * 4,
            Tuple::Micro { .. } => 2,
            Tuple::StdArray { .. } => 4,
            Tuple::MicroArray { .. } => 2,
            Tuple::VarArray { elem_bytes, .. } | Tuple::TupleArray { elem_bytes, .. } => {
                elem_bytes as u32
            }
        }
    }

    /// Bytes occupied by this tuple's own header fields, after the 2-byte
    /// descriptor that precedes every tuple. VAR_ARRAY/TUPLE_ARRAY carry 2
    /// bytes of trailing padding here so that descriptor + sub-header
    /// (2 + 6 = 8) stays 4-byte aligned like every other shape's header —
    /// without it, a nested TUPLE_ARRAY's inner tuple stream would start
    /// at an odd alignment relative to its own schema-computed size.
    fn sub_header_len(&self) -> usize {
        match self {
            Tuple::Std { .. } => 2,
            Tuple::Micro { .. } => 0,
            Tuple::StdArray { .. } | Tuple::MicroArray { .. } => 2,
            Tuple::VarArray { .. } | Tuple::TupleArray { .. } => 6,
        }
    }

    /// Bytes of value data following this tuple's header.
    pub fn body_bytes(&self) -> usize {
        match *self {
            Tuple::Std { size_words, .. } => size_words as usize * 4,
            Tuple::Micro { .. } => 2,
            Tuple::StdArray { count, .. } => count as usize * 4,
            Tuple::MicroArray { count, .. } => count as usize * 2,
            Tuple::VarArray { count, elem_bytes, .. } | Tuple::TupleArray { count, elem_bytes, .. } => {
                count as usize * elem_bytes as usize
            }
        }
    }

    /// Total on-wire size of this tuple, descriptor included.
    pub fn tuple_size(&self) -> usize {
        TupleDescriptor::BYTES + self.sub_header_len() + self.body_bytes()
    }

    /// Parses the tuple header (descriptor plus any sub-header) starting at
    /// `buf[offset..]`, returning the tuple and the offset its data starts at.
    pub fn parse(buf: &[u8], offset: usize) -> Result<(Tuple, usize)> {
        if offset + TupleDescriptor::BYTES > buf.len() {
            return Err(TupError::TruncatedTuple {
                offset,
                size: TupleDescriptor::BYTES,
                end: buf.len(),
            });
        }
        let desc = TupleDescriptor::read(&buf[offset..offset + TupleDescriptor::BYTES])?;
        let mut pos = offset + TupleDescriptor::BYTES;
        let tuple = match desc.ty()? {
            TupleType::Std => {
                let size_words = read_u16(buf, pos)?;
                pos += 2;
                Tuple::Std {
                    id: desc.id,
                    size_words,
                }
            }
            TupleType::Micro => Tuple::Micro { id: desc.id },
            TupleType::StdArray => {
                let count = read_u16(buf, pos)?;
                pos += 2;
                Tuple::StdArray { id: desc.id, count }
            }
            TupleType::MicroArray => {
                let count = read_u16(buf, pos)?;
                pos += 2;
                Tuple::MicroArray { id: desc.id, count }
            }
            TupleType::VarArray => {
                let (count, elem_bytes) = read_count_elem(buf, pos)?;
                pos += 6;
                Tuple::VarArray {
                    id: desc.id,
                    count,
                    elem_bytes,
                }
            }
            TupleType::TupleArray => {
                let (count, elem_bytes) = read_count_elem(buf, pos)?;
                pos += 6;
                Tuple::TupleArray {
                    id: desc.id,
                    count,
                    elem_bytes,
                }
            }
        };
        Ok((tuple, pos))
    }

    /// Writes the descriptor plus any sub-header at `buf[offset..]`, returning
    /// the offset just past the header (where data bytes start).
    pub fn write(&self, buf: &mut [u8], offset: usize) -> Result<usize> {
        let desc = TupleDescriptor::new(self.descriptor_type(), self.id())?;
        if offset + TupleDescriptor::BYTES > buf.len() {
            return Err(TupError::BufferTooSmall {
                need: offset + TupleDescriptor::BYTES,
                have: buf.len(),
            });
        }
        desc.write(&mut buf[offset..offset + TupleDescriptor::BYTES])?;
        let mut pos = offset + TupleDescriptor::BYTES;
        match *self {
            Tuple::Std { size_words, .. } => {
                write_u16(buf, pos, size_words)?;
                pos += 2;
            }
            Tuple::Micro { .. } => {}
            Tuple::StdArray { count, .. } | Tuple::MicroArray { count, .. } => {
                write_u16(buf, pos, count)?;
                pos += 2;
            }
            Tuple::VarArray { count, elem_bytes, .. } | Tuple::TupleArray { count, elem_bytes, .. } => {
                write_count_elem(buf, pos, count, elem_bytes)?;
                pos += 6;
            }
        }
        Ok(pos)
    }
}

fn read_u16(buf: &[u8], pos: usize) -> Result<u16> {
    if pos + 2 > buf.len() {
        return Err(TupError::TruncatedTuple {
            offset: pos,
            size: 2,
            end: buf.len(),
        });
    }
    Ok(u16::from_le_bytes(buf[pos..pos + 2].try_into().unwrap()))
}

fn write_u16(buf: &mut [u8], pos: usize, v: u16) -> Result<()> {
    if pos + 2 > buf.len() {
        return Err(TupError::BufferTooSmall {
            need: pos + 2,
            have: buf.len(),
        });
    }
    buf[pos..pos + 2].copy_from_slice(&v.to_le_bytes());
    Ok(())
}

/// Reads `count:16, elem_bytes:16` plus 2 bytes of alignment padding (see
/// `sub_header_len`), 6 bytes total.
fn read_count_elem(buf: &[u8], pos: usize) -> Result<(u16, u16)> {
    let count = read_u16(buf, pos)?;
    let elem_bytes = read_u16(buf, pos + 2)?;
    let _pad = read_u16(buf, pos + 4)?;
    Ok((count, elem_bytes))
}

fn write_count_elem(buf: &mut [u8], pos: usize, count: u16, elem_bytes: u16) -> Result<()> {
    write_u16(buf, pos, count)?;
    write_u16(buf, pos + 2, elem_bytes)?;
    write_u16(buf, pos + 4, 0)?;
    Ok(())
}

/// Rounds a buffer offset up to the next tuple boundary: each tuple is
/// 4-byte aligned.
pub fn align_to_next_tuple(offset: usize) -> usize {
    align4(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_tuple_round_trips() {
        let t = Tuple::Std {
            id: 5,
            size_words: 1,
        };
        let mut buf = [0u8; 8];
        let after_write = t.write(&mut buf, 0).unwrap();
        assert_eq!(after_write, 4);
        let (parsed, after_read) = Tuple::parse(&buf, 0).unwrap();
        assert_eq!(parsed, t);
        assert_eq!(after_read, 4);
        assert_eq!(parsed.tuple_size(), 8);
    }

    #[test]
    fn micro_tuple_is_four_bytes_total() {
        let t = Tuple::Micro { id: 2 };
        let mut buf = [0u8; 4];
        let pos = t.write(&mut buf, 0).unwrap();
        assert_eq!(pos, 2);
        assert_eq!(t.tuple_size(), 4);
    }

    #[test]
    fn std_array_round_trips() {
        let t = Tuple::StdArray { id: 9, count: 3 };
        let mut buf = [0u8; 8];
        t.write(&mut buf, 0).unwrap();
        let (parsed, pos) = Tuple::parse(&buf, 0).unwrap();
        assert_eq!(parsed, t);
        assert_eq!(pos, 4);
        assert_eq!(parsed.tuple_size(), 4 + 12);
    }

    #[test]
    fn var_array_header_is_eight_bytes_and_word_aligned() {
        let t = Tuple::VarArray {
            id: 1,
            count: 2,
            elem_bytes: 16,
        };
        let mut buf = [0u8; 40];
        let pos = t.write(&mut buf, 0).unwrap();
        assert_eq!(pos, 2 + 6);
        let (parsed, _) = Tuple::parse(&buf, 0).unwrap();
        assert_eq!(parsed, t);
        assert_eq!(parsed.tuple_size(), 8 + 32);
        assert_eq!(parsed.tuple_size() % 4, 0);
    }

    #[test]
    fn truncated_descriptor_errors() {
        let buf = [0u8; 1];
        let err = Tuple::parse(&buf, 0).unwrap_err();
        assert!(matches!(err, TupError::TruncatedTuple { .. }));
    }
}
