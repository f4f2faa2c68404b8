//! tacto TUIO - Protocol interpreter and session tracker
//!
//! This crate turns decoded OSC messages into a live picture of the
//! tracked surface:
//! - Per-channel state machines for the 2Dobj and 2Dcur profiles
//! - Staged set/alive mutations committed atomically on `fseq` boundaries
//! - Stale-frame detection and resync after large frame rollbacks
//! - Dense cursor handle pooling independent of session IDs
//! - Ordered listener fan-out (remove, add, update, then one refresh)

pub mod channel;
pub mod decoder;
pub mod listener;
pub mod pool;

pub use channel::*;
pub use decoder::*;
pub use listener::*;
pub use pool::*;
