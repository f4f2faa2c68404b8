//! OSC bundle encoding and top-level packet dispatch
//!
//! Bundle = the literal address `#bundle`, an 8-byte time tag, then zero
//! or more elements, each a 4-byte length followed by that many bytes of a
//! nested message or bundle.

use bytes::{BufMut, BytesMut};
use tacto_core::{TactoError, TactoResult};

use crate::atom::{put_str, read_i32, read_u64, read_str};
use crate::message::OscMessage;

/// Bundle marker address
pub const BUNDLE_ADDRESS: &str = "#bundle";

/// An OSC bundle of nested packets
///
/// The time tag is carried but not interpreted; TUIO trackers timestamp
/// frames through `fseq`, not the bundle header, and the encoder writes a
/// zero tag like deployed implementations do.
#[derive(Clone, Debug, PartialEq)]
pub struct OscBundle {
    pub time_tag: u64,
    pub elements: Vec<OscPacket>,
}

impl OscBundle {
    pub fn new() -> Self {
        OscBundle {
            time_tag: 0,
            elements: Vec::new(),
        }
    }

    /// Append a nested packet
    pub fn push(&mut self, packet: impl Into<OscPacket>) {
        self.elements.push(packet.into());
    }

    /// Builder-style element append
    pub fn with(mut self, packet: impl Into<OscPacket>) -> Self {
        self.push(packet);
        self
    }

    /// Serialize to wire bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf);
        buf.to_vec()
    }

    fn encode_into(&self, buf: &mut BytesMut) {
        put_str(buf, BUNDLE_ADDRESS);
        buf.put_u64(0);
        for element in &self.elements {
            let bytes = element.encode();
            buf.put_i32(bytes.len() as i32);
            buf.put_slice(&bytes);
        }
    }

    /// Decode a bundle from the cursor, which must span exactly the
    /// bundle's extent
    pub fn decode(buf: &mut &[u8]) -> TactoResult<Self> {
        let address = read_str(buf)?;
        if address != BUNDLE_ADDRESS {
            return Err(TactoError::InvalidBundle(format!(
                "bad marker address: {address:?}"
            )));
        }
        let time_tag = read_u64(buf)?;

        let mut elements = Vec::new();
        while !buf.is_empty() {
            let len = read_i32(buf)? as usize;
            let chunk = *buf;
            if chunk.len() < len {
                return Err(TactoError::BufferTooShort {
                    expected: len,
                    actual: chunk.len(),
                });
            }
            let (element, rest) = chunk.split_at(len);
            elements.push(OscPacket::decode(element)?);
            *buf = rest;
        }

        Ok(OscBundle { time_tag, elements })
    }
}

impl Default for OscBundle {
    fn default() -> Self {
        Self::new()
    }
}

/// A top-level OSC unit: one datagram carries exactly one packet
#[derive(Clone, Debug, PartialEq)]
pub enum OscPacket {
    Message(OscMessage),
    Bundle(OscBundle),
}

impl OscPacket {
    /// Decode one datagram. A leading `#` dispatches to the bundle
    /// decoder, anything else to the message decoder.
    pub fn decode(bytes: &[u8]) -> TactoResult<Self> {
        let mut cur = bytes;
        if bytes.first() == Some(&b'#') {
            Ok(OscPacket::Bundle(OscBundle::decode(&mut cur)?))
        } else {
            Ok(OscPacket::Message(OscMessage::decode(&mut cur)?))
        }
    }

    /// Serialize to wire bytes
    pub fn encode(&self) -> Vec<u8> {
        match self {
            OscPacket::Message(m) => m.encode(),
            OscPacket::Bundle(b) => b.encode(),
        }
    }

    /// Flatten into the contained messages, in wire order
    pub fn messages(self) -> Vec<OscMessage> {
        match self {
            OscPacket::Message(m) => vec![m],
            OscPacket::Bundle(b) => b
                .elements
                .into_iter()
                .flat_map(OscPacket::messages)
                .collect(),
        }
    }
}

impl From<OscMessage> for OscPacket {
    fn from(m: OscMessage) -> Self {
        OscPacket::Message(m)
    }
}

impl From<OscBundle> for OscPacket {
    fn from(b: OscBundle) -> Self {
        OscPacket::Bundle(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_roundtrip() {
        let bundle = OscBundle::new()
            .with(OscMessage::new("/tuio/2Dcur").with("alive").with(1i32))
            .with(OscMessage::new("/tuio/2Dcur").with("fseq").with(7i32));

        let bytes = bundle.encode();
        let packet = OscPacket::decode(&bytes).unwrap();

        let messages = packet.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].address, "/tuio/2Dcur");
        assert_eq!(messages[0].args[0].as_str(), Some("alive"));
        assert_eq!(messages[1].args[1].as_i32(), Some(7));
    }

    #[test]
    fn test_nested_bundle_flattens_in_order() {
        let inner = OscBundle::new()
            .with(OscMessage::new("/b").with(2i32))
            .with(OscMessage::new("/c").with(3i32));
        let outer = OscBundle::new()
            .with(OscMessage::new("/a").with(1i32))
            .with(inner);

        let packet = OscPacket::decode(&outer.encode()).unwrap();
        let addresses: Vec<String> = packet
            .messages()
            .into_iter()
            .map(|m| m.address)
            .collect();
        assert_eq!(addresses, ["/a", "/b", "/c"]);
    }

    #[test]
    fn test_top_level_dispatch() {
        let msg = OscMessage::new("/solo").with(5i32);
        match OscPacket::decode(&msg.encode()).unwrap() {
            OscPacket::Message(m) => assert_eq!(m.address, "/solo"),
            OscPacket::Bundle(_) => panic!("dispatched as bundle"),
        }
    }

    #[test]
    fn test_bad_bundle_marker() {
        // starts with '#' but is not "#bundle"
        let mut bytes = b"#nope\0\0\0".to_vec();
        bytes.extend_from_slice(&[0u8; 8]);
        assert!(matches!(
            OscPacket::decode(&bytes),
            Err(TactoError::InvalidBundle(_))
        ));
    }

    #[test]
    fn test_truncated_element_fails() {
        let bundle = OscBundle::new().with(OscMessage::new("/a").with(1i32));
        let bytes = bundle.encode();
        let truncated = &bytes[..bytes.len() - 4];
        assert!(OscPacket::decode(truncated).is_err());
    }

    #[test]
    fn test_empty_datagram_fails() {
        assert!(OscPacket::decode(&[]).is_err());
    }
}
