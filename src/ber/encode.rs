//! BER encoding.
//!
//! Uses a reverse buffer approach: writes from end backwards so every length
//! is taken from content that has already been serialized.

use super::length::encode_length;
use super::tag;
use crate::error::{EncodeErrorKind, Error, Result};
use crate::oid::Oid;
use bytes::Bytes;
use smallvec::SmallVec;

/// Buffer for BER encoding that writes backwards.
///
/// Content is written first, then its length and tag are prepended.
/// Constructed values must therefore push their children last-to-first.
pub struct EncodeBuf {
    buf: Vec<u8>,
}

impl EncodeBuf {
    /// Create a new encode buffer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(512)
    }

    /// Create a new encode buffer with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Prepend bytes that are already in forward order.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().rev());
    }

    /// Prepend a complete, already-encoded TLV.
    pub fn push_encoded(&mut self, tlv: &[u8]) {
        self.push_bytes(tlv);
    }

    /// Push a BER length encoding.
    pub fn push_length(&mut self, len: usize) {
        self.push_bytes(&encode_length(len));
    }

    /// Push a BER tag.
    pub fn push_tag(&mut self, tag: u8) {
        self.buf.push(tag);
    }

    /// Get the current length of encoded data.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Encode a constructed type (SEQUENCE, PDU, etc).
    ///
    /// Calls the closure to encode contents, then wraps with length and tag.
    pub fn push_constructed<F>(&mut self, tag: u8, f: F)
    where
        F: FnOnce(&mut Self),
    {
        let start_len = self.len();
        f(self);
        let content_len = self.len() - start_len;
        self.push_length(content_len);
        self.push_tag(tag);
    }

    /// Encode a SEQUENCE.
    pub fn push_sequence<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.push_constructed(tag::universal::SEQUENCE, f);
    }

    /// Encode an INTEGER.
    pub fn push_integer(&mut self, value: i64) {
        let content = integer_content(value);
        self.push_bytes(&content);
        self.push_length(content.len());
        self.push_tag(tag::universal::INTEGER);
    }

    /// Encode an OCTET STRING from raw bytes.
    pub fn push_octet_string(&mut self, data: &[u8]) {
        self.push_bytes(data);
        self.push_length(data.len());
        self.push_tag(tag::universal::OCTET_STRING);
    }

    /// Encode a NULL.
    pub fn push_null(&mut self) {
        self.push_length(0);
        self.push_tag(tag::universal::NULL);
    }

    /// Encode an OBJECT IDENTIFIER.
    pub fn push_oid(&mut self, oid: &Oid) {
        let ber = oid.to_ber_smallvec();
        self.push_bytes(&ber);
        self.push_length(ber.len());
        self.push_tag(tag::universal::OBJECT_IDENTIFIER);
    }

    /// Finalize and return the encoded bytes.
    ///
    /// The buffer is reversed to produce the correct order.
    pub fn finish(mut self) -> Bytes {
        self.buf.reverse();
        Bytes::from(self.buf)
    }
}

impl Default for EncodeBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal big-endian two's-complement content octets for a signed integer.
///
/// Leading 0x00 (non-negative) or 0xFF (negative) octets are dropped as long
/// as the next octet still carries the correct sign bit. Zero is one 0x00.
pub fn integer_content(value: i64) -> SmallVec<[u8; 8]> {
    let bytes = value.to_be_bytes();

    let mut start = 0;
    if value >= 0 {
        while start < 7 && bytes[start] == 0 && bytes[start + 1] & 0x80 == 0 {
            start += 1;
        }
    } else {
        while start < 7 && bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0 {
            start += 1;
        }
    }

    SmallVec::from_slice(&bytes[start..])
}

/// Encode an INTEGER TLV.
pub fn encode_integer(value: i64) -> Bytes {
    let mut buf = EncodeBuf::with_capacity(10);
    buf.push_integer(value);
    buf.finish()
}

/// Encode text as an OCTET STRING TLV, one byte per character (Latin-1).
///
/// Fails if any character's code point is above 255.
pub fn encode_octet_string(value: &str) -> Result<Bytes> {
    let mut content = Vec::with_capacity(value.len());
    for (index, ch) in value.chars().enumerate() {
        let byte = u8::try_from(u32::from(ch))
            .map_err(|_| Error::encode(EncodeErrorKind::NonLatin1Char { ch, index }))?;
        content.push(byte);
    }

    let mut buf = EncodeBuf::with_capacity(content.len() + 6);
    buf.push_octet_string(&content);
    Ok(buf.finish())
}

/// Encode the NULL TLV `05 00`.
pub fn encode_null() -> Bytes {
    Bytes::from_static(&[tag::universal::NULL, 0x00])
}

/// Encode a dotted-decimal OID string as an OBJECT IDENTIFIER TLV.
///
/// OIDs with fewer than two arcs get `1.3` prepended.
pub fn encode_oid(oid: &str) -> Result<Bytes> {
    let oid = Oid::parse(oid)?.normalized();
    oid.validate()?;

    let mut buf = EncodeBuf::with_capacity(oid.len() * 2 + 6);
    buf.push_oid(&oid);
    Ok(buf.finish())
}
