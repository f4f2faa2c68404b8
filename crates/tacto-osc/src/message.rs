//! OSC message encoding and decoding
//!
//! Message = address string, type-tag string (leading `,`), then each
//! argument packed per its tag in order.

use bytes::BytesMut;
use tacto_core::TactoResult;

use crate::atom::{
    put_str, read_f32, read_f64, read_i32, read_i64, read_str, OscAtom, TAG_DOUBLE, TAG_FLOAT,
    TAG_INT, TAG_LONG, TAG_STRING, TAG_SYMBOL,
};

/// A single OSC message
#[derive(Clone, Debug, PartialEq)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscAtom>,
}

impl OscMessage {
    pub fn new(address: impl Into<String>) -> Self {
        OscMessage {
            address: address.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument
    pub fn push(&mut self, arg: impl Into<OscAtom>) {
        self.args.push(arg.into());
    }

    /// Builder-style argument append
    pub fn with(mut self, arg: impl Into<OscAtom>) -> Self {
        self.push(arg);
        self
    }

    /// Serialize to wire bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf);
        buf.to_vec()
    }

    pub(crate) fn encode_into(&self, buf: &mut BytesMut) {
        put_str(buf, &self.address);

        let mut tags = String::with_capacity(self.args.len() + 1);
        tags.push(',');
        for arg in &self.args {
            tags.push(arg.type_tag());
        }
        put_str(buf, &tags);

        for arg in &self.args {
            arg.encode(buf);
        }
    }

    /// Decode a message from the cursor.
    ///
    /// Compatibility note: unknown type-tag characters are skipped without
    /// consuming any payload bytes, mirroring deployed TUIO trackers. A
    /// message carrying an unsupported tag *before* supported ones will
    /// therefore desynchronize the remaining arguments rather than fail.
    pub fn decode(buf: &mut &[u8]) -> TactoResult<Self> {
        let address = read_str(buf)?;
        let tags = read_str(buf)?;

        let mut args = Vec::new();
        for tag in tags.chars() {
            match tag {
                ',' => continue,
                TAG_INT => args.push(OscAtom::Int(read_i32(buf)?)),
                TAG_LONG => args.push(OscAtom::Long(read_i64(buf)?)),
                TAG_FLOAT => args.push(OscAtom::Float(read_f32(buf)?)),
                TAG_DOUBLE => args.push(OscAtom::Double(read_f64(buf)?)),
                TAG_STRING | TAG_SYMBOL => args.push(OscAtom::Str(read_str(buf)?)),
                _ => {}
            }
        }

        Ok(OscMessage { address, args })
    }
}
