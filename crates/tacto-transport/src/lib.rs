//! tacto Transport - UDP endpoint and client runtime
//!
//! Ties the stack together: a bound UDP socket, a receive task running the
//! decode/stage/commit pipeline synchronously per datagram, and the
//! [`TuioClient`] session lifecycle around them.

pub mod client;
pub mod udp;

pub use client::*;
pub use udp::*;
