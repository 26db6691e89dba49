//! BER decoding.
//!
//! Zero-copy decoding using `Bytes`. Constructed values hand out a child
//! decoder bounded by the declared length, so nothing can read past the end
//! of the value that contains it.

use super::length::decode_length;
use super::tag;
use crate::error::{DecodeError, DecodeErrorKind, DecodeResult};
use crate::oid::Oid;
use bytes::Bytes;

/// BER decoder that reads from a byte buffer.
#[derive(Debug)]
pub struct Decoder {
    data: Bytes,
    offset: usize,
    /// Offset of `data[0]` within the outermost buffer, for error reporting.
    base: usize,
}

impl Decoder {
    /// Create a new decoder from bytes.
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            offset: 0,
            base: 0,
        }
    }

    /// Create a decoder from a byte slice (copies the data).
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    fn error(&self, at: usize, kind: DecodeErrorKind) -> DecodeError {
        DecodeError::new(self.base + at, kind)
    }

    /// Get the current offset within the outermost buffer.
    pub fn offset(&self) -> usize {
        self.base + self.offset
    }

    /// Get remaining bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Check if we've reached the end.
    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Read a tag byte.
    pub fn read_tag(&mut self) -> DecodeResult<u8> {
        let Some(&byte) = self.data.get(self.offset) else {
            tracing::trace!(snmp.offset = self.offset(), "truncated data: unexpected end of input");
            return Err(self.error(self.offset, DecodeErrorKind::TruncatedData));
        };
        self.offset += 1;
        Ok(byte)
    }

    /// Read a length field.
    pub fn read_length(&mut self) -> DecodeResult<usize> {
        let (len, consumed) =
            decode_length(&self.data[self.offset..], self.base + self.offset)?;
        self.offset += consumed;
        Ok(len)
    }

    /// Read raw bytes without copying.
    pub fn read_bytes(&mut self, len: usize) -> DecodeResult<Bytes> {
        // saturating_add keeps a huge declared length from wrapping past the check
        if self.offset.saturating_add(len) > self.data.len() {
            return Err(self.error(
                self.offset,
                DecodeErrorKind::InsufficientData {
                    needed: len,
                    available: self.remaining(),
                },
            ));
        }
        let bytes = self.data.slice(self.offset..self.offset + len);
        self.offset += len;
        Ok(bytes)
    }

    /// Read and expect a specific tag, returning the content length.
    pub fn expect_tag(&mut self, expected: u8) -> DecodeResult<usize> {
        let at = self.offset;
        let actual = self.read_tag()?;
        if actual != expected {
            return Err(self.error(at, DecodeErrorKind::UnexpectedTag { expected, actual }));
        }
        self.read_length()
    }

    /// Read a BER INTEGER (signed, up to 64 bits).
    pub fn read_integer(&mut self) -> DecodeResult<i64> {
        let len = self.expect_tag(tag::universal::INTEGER)?;
        self.read_integer_value(len)
    }

    /// Read integer content given the length.
    pub fn read_integer_value(&mut self, len: usize) -> DecodeResult<i64> {
        if len == 0 {
            return Err(self.error(self.offset, DecodeErrorKind::ZeroLengthInteger));
        }
        if len > 8 {
            return Err(self.error(self.offset, DecodeErrorKind::IntegerOverflow));
        }

        let bytes = self.read_bytes(len)?;

        // Sign extend from the first content octet
        let seed: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
        Ok(bytes
            .iter()
            .fold(seed, |acc, &byte| (acc << 8) | i64::from(byte)))
    }

    /// Read an OCTET STRING.
    pub fn read_octet_string(&mut self) -> DecodeResult<Bytes> {
        let len = self.expect_tag(tag::universal::OCTET_STRING)?;
        self.read_bytes(len)
    }

    /// Read an OBJECT IDENTIFIER.
    pub fn read_oid(&mut self) -> DecodeResult<Oid> {
        let len = self.expect_tag(tag::universal::OBJECT_IDENTIFIER)?;
        let start = self.base + self.offset;
        let bytes = self.read_bytes(len)?;
        Oid::from_ber(&bytes).map_err(|e| DecodeError::new(start + e.offset, e.kind))
    }

    /// Read a SEQUENCE, returning a decoder for its contents.
    pub fn read_sequence(&mut self) -> DecodeResult<Decoder> {
        self.read_constructed(tag::universal::SEQUENCE)
    }

    /// Read a constructed type with a specific tag, returning a decoder for its contents.
    pub fn read_constructed(&mut self, expected_tag: u8) -> DecodeResult<Decoder> {
        let len = self.expect_tag(expected_tag)?;
        self.sub_decoder(len)
    }

    /// Read a tag that has already been validated by the caller, then its
    /// length, returning a decoder bounded by that length.
    pub fn read_any_constructed(&mut self) -> DecodeResult<(u8, Decoder)> {
        let tag = self.read_tag()?;
        let len = self.read_length()?;
        Ok((tag, self.sub_decoder(len)?))
    }

    /// Skip a TLV (tag-length-value) without parsing its content.
    pub fn skip_tlv(&mut self) -> DecodeResult<u8> {
        let tag = self.read_tag()?;
        let len = self.read_length()?;
        self.read_bytes(len)?;
        Ok(tag)
    }

    /// Create a sub-decoder for a portion of the remaining data.
    pub fn sub_decoder(&mut self, len: usize) -> DecodeResult<Decoder> {
        let base = self.base + self.offset;
        let content = self.read_bytes(len)?;
        Ok(Decoder {
            data: content,
            offset: 0,
            base,
        })
    }

    /// Fail if any bytes remain.
    pub fn expect_end(&self) -> DecodeResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.error(
                self.offset,
                DecodeErrorKind::TrailingData {
                    remaining: self.remaining(),
                },
            ))
        }
    }

    /// Get remaining data as a slice.
    pub fn remaining_slice(&self) -> &[u8] {
        &self.data[self.offset..]
    }
}

/// Decode a complete INTEGER TLV.
pub fn decode_integer(data: &[u8]) -> DecodeResult<i64> {
    let mut decoder = Decoder::from_slice(data);
    let value = decoder.read_integer()?;
    decoder.expect_end()?;
    Ok(value)
}
