//! OSC atomic argument types and their wire encoding
//!
//! Fixed-width atoms are network byte order. Strings are UTF-8 followed by
//! one to four NUL bytes, padding the field to the next multiple of 4
//! (always at least one NUL, even when the text itself is aligned).

use bytes::{Buf, BufMut, BytesMut};
use tacto_core::{TactoError, TactoResult};

/// Type tag for int32
pub const TAG_INT: char = 'i';
/// Type tag for float32
pub const TAG_FLOAT: char = 'f';
/// Type tag for int64
pub const TAG_LONG: char = 'h';
/// Type tag for float64
pub const TAG_DOUBLE: char = 'd';
/// Type tag for string
pub const TAG_STRING: char = 's';
/// Alternate type tag for string (symbol)
pub const TAG_SYMBOL: char = 'S';

/// One OSC argument value
#[derive(Clone, Debug, PartialEq)]
pub enum OscAtom {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
}

impl OscAtom {
    /// The type-tag character this atom encodes under
    pub fn type_tag(&self) -> char {
        match self {
            OscAtom::Int(_) => TAG_INT,
            OscAtom::Long(_) => TAG_LONG,
            OscAtom::Float(_) => TAG_FLOAT,
            OscAtom::Double(_) => TAG_DOUBLE,
            OscAtom::Str(_) => TAG_STRING,
        }
    }

    /// Append this atom's payload bytes
    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            OscAtom::Int(v) => buf.put_i32(*v),
            OscAtom::Long(v) => buf.put_i64(*v),
            OscAtom::Float(v) => buf.put_f32(*v),
            OscAtom::Double(v) => buf.put_f64(*v),
            OscAtom::Str(v) => put_str(buf, v),
        }
    }

    #[inline]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            OscAtom::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            OscAtom::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OscAtom::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i32> for OscAtom {
    fn from(v: i32) -> Self {
        OscAtom::Int(v)
    }
}

impl From<i64> for OscAtom {
    fn from(v: i64) -> Self {
        OscAtom::Long(v)
    }
}

impl From<f32> for OscAtom {
    fn from(v: f32) -> Self {
        OscAtom::Float(v)
    }
}

impl From<f64> for OscAtom {
    fn from(v: f64) -> Self {
        OscAtom::Double(v)
    }
}

impl From<&str> for OscAtom {
    fn from(v: &str) -> Self {
        OscAtom::Str(v.to_owned())
    }
}

impl From<String> for OscAtom {
    fn from(v: String) -> Self {
        OscAtom::Str(v)
    }
}

/// Append a string plus its NUL padding
pub(crate) fn put_str(buf: &mut BytesMut, s: &str) {
    buf.put_slice(s.as_bytes());
    let pad = 4 - s.len() % 4;
    buf.put_bytes(0, pad);
}

pub(crate) fn read_i32(buf: &mut &[u8]) -> TactoResult<i32> {
    ensure(buf, 4)?;
    Ok(buf.get_i32())
}

pub(crate) fn read_i64(buf: &mut &[u8]) -> TactoResult<i64> {
    ensure(buf, 8)?;
    Ok(buf.get_i64())
}

pub(crate) fn read_u64(buf: &mut &[u8]) -> TactoResult<u64> {
    ensure(buf, 8)?;
    Ok(buf.get_u64())
}

pub(crate) fn read_f32(buf: &mut &[u8]) -> TactoResult<f32> {
    ensure(buf, 4)?;
    Ok(buf.get_f32())
}

pub(crate) fn read_f64(buf: &mut &[u8]) -> TactoResult<f64> {
    ensure(buf, 8)?;
    Ok(buf.get_f64())
}

/// Read a NUL-terminated string and skip its padding. The cursor advances
/// to the next 4-byte boundary past the terminator, clamped to the buffer
/// end when the final field omits trailing pad bytes.
pub(crate) fn read_str(buf: &mut &[u8]) -> TactoResult<String> {
    let nul = buf
        .iter()
        .position(|&b| b == 0)
        .ok_or(TactoError::UnterminatedString)?;
    let s = std::str::from_utf8(&buf[..nul])
        .map_err(|_| TactoError::InvalidUtf8)?
        .to_owned();
    let consumed = ((nul + 4) & !3).min(buf.len());
    buf.advance(consumed);
    Ok(s)
}

fn ensure(buf: &[u8], expected: usize) -> TactoResult<()> {
    if buf.remaining() < expected {
        return Err(TactoError::BufferTooShort {
            expected,
            actual: buf.remaining(),
        });
    }
    Ok(())
}
