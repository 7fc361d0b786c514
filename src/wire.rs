//! Wire primitives: header/tuple-descriptor bitfield layout and the byte
//! and alignment arithmetic the pack/unpack engines share.
//!
//! Multi-byte fields are native little-endian. Bitfields that don't span a
//! whole byte (the header's status/priority/... flags, the tuple
//! descriptor's type/id split) are modeled with `packed_struct`.

use packed_struct::prelude::*;

use crate::error::{Result, TupError};

/// Mandatory header, always the first 4 bytes of a message.
#[derive(PackedStruct, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[packed_struct(bit_numbering = "lsb0", size_bytes = "4", endian = "lsb")]
pub struct HeaderWord {
    #[packed_field(bits = "0:7")]
    pub class: u8,
    #[packed_field(bits = "8:15")]
    pub subclass: u8,
    #[packed_field(bits = "16:23")]
    pub action: u8,
    #[packed_field(bits = "24")]
    pub status: bool,
    #[packed_field(bits = "25")]
    pub priority: bool,
    #[packed_field(bits = "26")]
    pub datagram: bool,
    #[packed_field(bits = "27")]
    pub route_present: bool,
    #[packed_field(bits = "28")]
    pub elems_present: bool,
    #[packed_field(bits = "29:31")]
    pub vendor: u8,
}

/// Optional route sub-header (two full words), present when `route_present`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteWord {
    pub receiver: u32,
    pub sender: u32,
}

pub const ROUTE_BROADCAST: u32 = 0xFFFF_FFFF;

impl RouteWord {
    pub const BYTES: usize = 8;

    pub fn read(buf: &[u8]) -> RouteWord {
        RouteWord {
            receiver: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            sender: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
        }
    }

    pub fn write(&self, buf: &mut [u8]) {
        buf[0..4].copy_from_slice(&self.receiver.to_le_bytes());
        buf[4..8].copy_from_slice(&self.sender.to_le_bytes());
    }
}

/// Optional elems sub-header: two full words, `num_tuples` (u32) then
/// `remaining:8 | size:24`.
#[derive(PackedStruct, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[packed_struct(bit_numbering = "lsb0", size_bytes = "4", endian = "lsb")]
pub struct ElemsWord1 {
    #[packed_field(bits = "0:7")]
    pub remaining: u8,
    #[packed_field(bits = "8:31")]
    pub size: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElemsWord {
    pub num_tuples: u32,
    pub remaining: u8,
    /// Total tuple-body length, in 32-bit words.
    pub size: u32,
}

impl ElemsWord {
    pub const BYTES: usize = 8;
    pub const MAX_SIZE: u32 = 1 << 24;

    pub fn read(buf: &[u8]) -> Result<ElemsWord> {
        let num_tuples = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        let w1 = ElemsWord1::unpack(buf[4..8].try_into().unwrap())
            .map_err(|_| TupError::MalformedHeader("elems word"))?;
        Ok(ElemsWord {
            num_tuples,
            remaining: w1.remaining,
            size: w1.size,
        })
    }

    pub fn write(&self, buf: &mut [u8]) -> Result<()> {
        if self.size >= Self::MAX_SIZE {
            return Err(TupError::MessageTooLong(self.size));
        }
        buf[0..4].copy_from_slice(&self.num_tuples.to_le_bytes());
        let w1 = ElemsWord1 {
            remaining: self.remaining,
            size: self.size,
        };
        buf[4..8].copy_from_slice(&w1.pack().map_err(|_| TupError::InvalidArgument("elems"))?);
        Ok(())
    }
}

/// Tuple descriptor shapes, `type:3` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleType {
    Std = 0,
    Micro = 1,
    StdArray = 2,
    MicroArray = 3,
    VarArray = 4,
    TupleArray = 5,
}

impl TupleType {
    pub fn from_bits(bits: u8) -> Result<TupleType> {
        Ok(match bits {
            0 => TupleType::Std,
            1 => TupleType::Micro,
            2 => TupleType::StdArray,
            3 => TupleType::MicroArray,
            4 => TupleType::VarArray,
            5 => TupleType::TupleArray,
            _ => return Err(TupError::InvalidArgument("reserved tuple type")),
        })
    }
}

pub const MAX_TUPLE_ID: u16 = 0x1FFF;

/// The 2-byte `type:3 | id:13` tuple descriptor.
#[derive(PackedStruct, Debug, Clone, Copy, PartialEq, Eq)]
#[packed_struct(bit_numbering = "lsb0", size_bytes = "2", endian = "lsb")]
pub struct TupleDescriptor {
    #[packed_field(bits = "0:2")]
    pub type_bits: u8,
    #[packed_field(bits = "3:15")]
    pub id: u16,
}

impl TupleDescriptor {
    pub const BYTES: usize = 2;

    pub fn new(ty: TupleType, id: u16) -> Result<TupleDescriptor> {
        if id > MAX_TUPLE_ID {
            return Err(TupError::InvalidArgument("tuple id exceeds 0x1FFF"));
        }
        Ok(TupleDescriptor {
            type_bits: ty as u8,
            id,
        })
    }

    pub fn read(buf: &[u8]) -> Result<TupleDescriptor> {
        TupleDescriptor::unpack(buf.try_into().unwrap())
            .map_err(|_| TupError::InvalidArgument("tuple descriptor"))
    }

    pub fn write(&self, buf: &mut [u8]) -> Result<()> {
        buf.copy_from_slice(&self.pack().map_err(|_| TupError::InvalidArgument("tuple descriptor"))?);
        Ok(())
    }

    pub fn ty(&self) -> Result<TupleType> {
        TupleType::from_bits(self.type_bits)
    }
}

/// Rounds a byte offset up to the next 4-byte boundary.
pub fn align4(offset: usize) -> usize {
    (offset + 3) & !3
}

/// Action identifier helpers: `class:8 | subclass:8 | action:8`.
pub fn action_class(id: u32) -> u8 {
    (id & 0xFF) as u8
}
pub fn action_subclass(id: u32) -> u8 {
    ((id >> 8) & 0xFF) as u8
}
pub fn action_action(id: u32) -> u8 {
    ((id >> 16) & 0xFF) as u8
}
pub fn make_action_id(class: u8, subclass: u8, action: u8) -> u32 {
    (class as u32) | ((subclass as u32) << 8) | ((action as u32) << 16)
}

/// Flag bit positions within the 32-bit `flags` word passed to `pack`.
/// These are OR'd verbatim into the same bit positions of the header
/// word, aliasing onto `route_present`/`elems_present`/`vendor`.
pub const FLAG_PRIORITY: u32 = 1 << 25;
pub const FLAG_DATAGRAM: u32 = 1 << 26;
pub const FLAG_BROADCAST: u32 = 1 << 27;
pub const FLAG_REPLY_NACK: u32 = 1 << 28;
pub const FLAG_REPLY_ACK: u32 = 1 << 29;

/// Mask covering the header bits flags may touch (24..=31).
pub const FLAG_HEADER_MASK: u32 = 0xFF00_0000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_word_round_trips() {
        let h = HeaderWord {
            class: 1,
            subclass: 2,
            action: 3,
            status: false,
            priority: true,
            datagram: false,
            route_present: true,
            elems_present: true,
            vendor: 0,
        };
        let bytes = h.pack().unwrap();
        let back = HeaderWord::unpack(&bytes).unwrap();
        assert_eq!(h, back);
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[1], 2);
        assert_eq!(bytes[2], 3);
    }

    #[test]
    fn tuple_descriptor_round_trips() {
        let td = TupleDescriptor::new(TupleType::StdArray, 0x1ABC).unwrap();
        let mut buf = [0u8; 2];
        td.write(&mut buf).unwrap();
        let back = TupleDescriptor::read(&buf).unwrap();
        assert_eq!(back.id, 0x1ABC);
        assert_eq!(back.ty().unwrap(), TupleType::StdArray);
    }

    #[test]
    fn tuple_id_over_max_rejected() {
        assert!(TupleDescriptor::new(TupleType::Std, MAX_TUPLE_ID + 1).is_err());
    }

    #[test]
    fn elems_word_round_trips() {
        let e = ElemsWord {
            num_tuples: 7,
            remaining: 0,
            size: 3,
        };
        let mut buf = [0u8; 8];
        e.write(&mut buf).unwrap();
        let back = ElemsWord::read(&buf).unwrap();
        assert_eq!(e, back);
    }

    #[test]
    fn elems_word_rejects_oversize() {
        let e = ElemsWord {
            num_tuples: 1,
            remaining: 0,
            size: ElemsWord::MAX_SIZE,
        };
        let mut buf = [0u8; 8];
        assert_eq!(e.write(&mut buf), Err(TupError::MessageTooLong(ElemsWord::MAX_SIZE)));
    }
}
