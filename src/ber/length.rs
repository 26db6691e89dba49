//! BER length encoding and decoding.
//!
//! Length encoding follows X.690 Section 8.1.3:
//! - Short form: Single byte, bit 8=0, value 0-127
//! - Long form: Initial byte (bit 8=1, bits 7-1=count), followed by length bytes
//! - Indefinite form (0x80): Rejected

use crate::error::{DecodeError, DecodeErrorKind, DecodeResult};
use smallvec::SmallVec;

/// Most length octets accepted in long form.
pub const MAX_LENGTH_OCTETS: usize = std::mem::size_of::<usize>();

/// Encoded length, at most one prefix byte plus the octets of a `usize`.
pub type LengthBytes = SmallVec<[u8; 9]>;

/// Encode a length in minimal definite form.
///
/// Short form for lengths <= 127, otherwise `0x80 | k` followed by the `k`
/// big-endian octets of the length with no leading zero octet.
pub fn encode_length(len: usize) -> LengthBytes {
    let mut out = LengthBytes::new();

    if len <= 127 {
        out.push(len as u8);
        return out;
    }

    let be = len.to_be_bytes();
    let skip = be.iter().take_while(|&&b| b == 0).count();
    let octets = &be[skip..];

    out.push(0x80 | octets.len() as u8);
    out.extend_from_slice(octets);
    out
}

/// Decode a length from bytes, returning (length, bytes_consumed).
///
/// The `base_offset` parameter is used to report error offsets correctly
/// when this is called from within a decoder.
pub fn decode_length(data: &[u8], base_offset: usize) -> DecodeResult<(usize, usize)> {
    let Some(&first) = data.first() else {
        return Err(DecodeError::new(base_offset, DecodeErrorKind::TruncatedData));
    };

    if first & 0x80 == 0 {
        return Ok((first as usize, 1));
    }

    let num_octets = (first & 0x7F) as usize;

    if num_octets == 0 {
        return Err(DecodeError::new(
            base_offset,
            DecodeErrorKind::IndefiniteLength,
        ));
    }

    if num_octets > MAX_LENGTH_OCTETS {
        return Err(DecodeError::new(
            base_offset,
            DecodeErrorKind::LengthTooLong { octets: num_octets },
        ));
    }

    if data.len() < 1 + num_octets {
        return Err(DecodeError::new(
            base_offset + data.len(),
            DecodeErrorKind::TruncatedData,
        ));
    }

    let len = data[1..=num_octets]
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);

    Ok((len, 1 + num_octets))
}
