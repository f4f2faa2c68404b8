//! Error types for the tacto stack

use thiserror::Error;

/// Errors raised while decoding datagrams or running a session
#[derive(Error, Debug)]
pub enum TactoError {
    // Wire errors
    #[error("buffer too short: expected {expected}, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("OSC string missing NUL terminator")]
    UnterminatedString,

    #[error("invalid UTF-8 in OSC string")]
    InvalidUtf8,

    #[error("invalid OSC bundle: {0}")]
    InvalidBundle(String),

    // Transport errors
    #[error("transport error: {0}")]
    Transport(String),

    #[error("session already connected")]
    AlreadyConnected,

    #[error("session not connected")]
    NotConnected,
}

/// Result type for tacto operations
pub type TactoResult<T> = Result<T, TactoError>;
