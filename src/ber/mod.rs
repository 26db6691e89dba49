//! BER (Basic Encoding Rules) codec for the SNMP subset this agent speaks.
//!
//! Encoding is length-after-content: inner values are serialized first and
//! each enclosing length is computed from the bytes already written. Decoding
//! is strict; any structural mismatch is an error and nothing is recovered.

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::*;
pub use encode::*;
pub use length::*;
pub use tag::*;
