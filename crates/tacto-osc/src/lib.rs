//! tacto OSC - Open Sound Control binary codec
//!
//! This crate implements the OSC wire format used by TUIO trackers:
//! - Atomic arguments: int32, int64, float32, float64, string
//! - Messages: address + type-tag string + packed arguments
//! - Bundles: `#bundle` marker, 8-byte time tag, length-prefixed elements
//!
//! Everything is big-endian and 4-byte aligned. One datagram is one
//! top-level packet; a leading `#` marks a bundle, anything else a single
//! message.

pub mod atom;
pub mod bundle;
pub mod message;

pub use atom::*;
pub use bundle::*;
pub use message::*;
