//! Error kinds surfaced by the codec.
//!
//! Pack failures are programmer errors (schema/size mismatch); unpack
//! failures also cover fully adversarial input. Nothing is retried
//! internally and nothing here allocates.

use thiserror::Error;

/// Every failure mode the pack/unpack engines can return.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupError {
    #[error("action 0x{0:06x} not in registry")]
    UnknownAction(u32),
    #[error("class {0} not in registry")]
    UnknownClass(u8),
    #[error("subclass {0} not in registry")]
    UnknownSubclass(u8),
    #[error("buffer too small: need {need} have {have}")]
    BufferTooSmall { need: usize, have: usize },
    #[error("offset {offset} steps outside buffer of size {size}")]
    BufferOverflow { offset: usize, size: usize },
    #[error("packed size {0} words exceeds 24-bit size field")]
    MessageTooLong(u32),
    #[error("malformed header: {0}")]
    MalformedHeader(&'static str),
    #[error("tuple at offset {offset} (size {size}) truncated before end of message {end}")]
    TruncatedTuple {
        offset: usize,
        size: usize,
        end: usize,
    },
    #[error("tuple id {id} wire width {wire} does not match schema width {schema}")]
    TypeMismatch { id: u16, wire: u32, schema: u32 },
    #[error("elem offset {offset} width {width} exceeds destination record of size {cap}")]
    DestOverflow {
        offset: usize,
        width: usize,
        cap: usize,
    },
    #[error("value {value} outside range {min}..={max}")]
    RangeViolation { value: i64, min: i64, max: i64 },
    #[error("value 0x{value:x} has bits outside permitted mask 0x{mask:x}")]
    MaskViolation { value: u64, mask: u64 },
    #[error("tuple-array nesting exceeds depth cap {cap}")]
    TooDeep { cap: u32 },
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

impl TupError {
    /// Legacy negative-errno-style code, for callers bridging to the C ABI
    /// this format was distilled from (`ipct_pack`/`ipct_unpack` return
    /// negative `int`, not a typed error).
    pub fn code(&self) -> i32 {
        match self {
            TupError::UnknownAction(_) => -1,
            TupError::UnknownClass(_) => -2,
            TupError::UnknownSubclass(_) => -3,
            TupError::BufferTooSmall { .. } => -4,
            TupError::BufferOverflow { .. } => -5,
            TupError::MessageTooLong(_) => -6,
            TupError::MalformedHeader(_) => -7,
            TupError::TruncatedTuple { .. } => -8,
            TupError::TypeMismatch { .. } => -9,
            TupError::DestOverflow { .. } => -10,
            TupError::RangeViolation { .. } => -11,
            TupError::MaskViolation { .. } => -12,
            TupError::TooDeep { .. } => -13,
            TupError::InvalidArgument(_) => -14,
        }
    }
}

pub type Result<T> = std::result::Result<T, TupError>;
