//! A compact, typed, tuple-oriented codec for messages exchanged between a
//! host driver and an embedded DSP.
//!
//! The wire format is a 4-byte mandatory header, optional route and elems
//! sub-headers, then a stream of self-describing tuples (`tuple`). A
//! process-wide, `'static` schema tree (`schema`) maps each tuple id to an
//! in-memory field; `pack`/`unpack` walk that tree to serialize and
//! validate application records without ever touching the heap.

pub mod error;
pub mod pack;
pub mod schema;
pub mod tuple;
pub mod unpack;
pub mod validate;
pub mod wire;

pub use error::{Result, TupError};
pub use pack::{pack, pack_routed};
pub use schema::Registry;
pub use unpack::unpack;
pub use wire::{
    RouteWord, FLAG_BROADCAST, FLAG_DATAGRAM, FLAG_HEADER_MASK, FLAG_PRIORITY, FLAG_REPLY_ACK,
    FLAG_REPLY_NACK, ROUTE_BROADCAST,
};
