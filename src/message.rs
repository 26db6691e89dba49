//! Community-based SNMP message format (v2c).
//!
//! `SEQUENCE { version INTEGER, community OCTET STRING, pdu PDU }`

use crate::ber::{Decoder, EncodeBuf};
use crate::error::{DecodeContext, Field, Result};
use crate::oid::Oid;
use crate::pdu::{PduType, RequestPdu, encode_response_pdu};
use bytes::Bytes;

/// Decoded inbound request.
///
/// Decoding is all-or-nothing: a structural error anywhere fails the whole
/// message and no partial request is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Version number as sent; echoed back unchanged.
    pub version: i64,
    /// Community string, raw bytes.
    pub community: Bytes,
    pub pdu_type: PduType,
    pub request_id: i64,
    /// Requested OIDs, in request order.
    pub oids: Vec<Oid>,
}

impl Request {
    /// Decode a request from a datagram payload.
    pub fn decode(data: Bytes) -> Result<Self> {
        let mut decoder = Decoder::new(data);
        let mut seq = decoder.read_sequence().context(Field::Message)?;

        let version = seq.read_integer().context(Field::Version)?;
        let community = seq.read_octet_string().context(Field::Community)?;
        let pdu = RequestPdu::decode(&mut seq)?;
        seq.expect_end().context(Field::Message)?;
        decoder.expect_end().context(Field::Message)?;

        Ok(Request {
            version,
            community,
            pdu_type: pdu.pdu_type,
            request_id: pdu.request_id,
            oids: pdu.oids,
        })
    }

    /// Decode from a byte slice (copies the data).
    pub fn decode_slice(data: &[u8]) -> Result<Self> {
        Self::decode(Bytes::copy_from_slice(data))
    }

    /// Community as text, for logging.
    pub fn community_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.community)
    }
}

/// Encode a GetResponse message.
///
/// Error-status and error-index are always 0. Varbinds are written in the
/// given order; each value must already be a complete TLV.
pub fn encode_response(
    version: i64,
    community: &[u8],
    request_id: i64,
    varbinds: &[(Oid, Bytes)],
) -> Bytes {
    let estimate = 32
        + community.len()
        + varbinds
            .iter()
            .map(|(oid, value)| oid.len() * 2 + value.len() + 8)
            .sum::<usize>();
    let mut buf = EncodeBuf::with_capacity(estimate);

    buf.push_sequence(|buf| {
        encode_response_pdu(buf, request_id, varbinds);
        buf.push_octet_string(community);
        buf.push_integer(version);
    });

    buf.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::{encode_integer, encode_octet_string};
    use crate::error::{DecodeErrorKind, Error};
    use crate::oid;

    /// GetNextRequest, community "public", request-id 1, OID 1.3.6.1.2.1.1.2.0.0
    #[rustfmt::skip]
    const GET_NEXT_FAN: &[u8] = &[
        0x30, 0x27,
            0x02, 0x01, 0x01,
            0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c',
            0xA1, 0x1A,
                0x02, 0x01, 0x01,
                0x02, 0x01, 0x00,
                0x02, 0x01, 0x00,
                0x30, 0x0F,
                    0x30, 0x0D,
                        0x06, 0x09, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x02, 0x00, 0x00,
                        0x05, 0x00,
    ];

    #[test]
    fn test_decode_get_next() {
        let req = Request::decode_slice(GET_NEXT_FAN).unwrap();
        assert_eq!(req.version, 1);
        assert_eq!(&req.community[..], b"public");
        assert_eq!(req.pdu_type, PduType::GetNextRequest);
        assert_eq!(req.request_id, 1);
        assert_eq!(req.oids.len(), 1);
        assert_eq!(req.oids, vec![oid!(1, 3, 6, 1, 2, 1, 1, 2, 0, 0)]);
    }

    #[test]
    fn test_decode_truncated_outer_sequence() {
        let err = Request::decode_slice(&GET_NEXT_FAN[..20]).unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol {
                field: Field::Message,
                ..
            }
        ));
        assert!(err.decode_kind().is_some_and(|k| k.is_truncation()));
    }

    #[test]
    fn test_decode_wrong_outer_tag() {
        let mut bytes = GET_NEXT_FAN.to_vec();
        bytes[0] = 0x31;
        let err = Request::decode_slice(&bytes).unwrap_err();
        assert_eq!(
            err.decode_kind(),
            Some(DecodeErrorKind::UnexpectedTag {
                expected: 0x30,
                actual: 0x31
            })
        );
    }

    #[test]
    fn test_decode_community_not_octet_string() {
        let mut bytes = GET_NEXT_FAN.to_vec();
        bytes[5] = 0x02;
        let err = Request::decode_slice(&bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol {
                field: Field::Community,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_rejects_bytes_after_message() {
        let mut bytes = GET_NEXT_FAN.to_vec();
        bytes.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        let err = Request::decode_slice(&bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol {
                field: Field::Message,
                ..
            }
        ));
        assert_eq!(
            err.decode_kind(),
            Some(DecodeErrorKind::TrailingData { remaining: 4 })
        );
    }

    #[test]
    fn test_decode_rejects_extra_tlv_after_pdu() {
        let mut bytes = GET_NEXT_FAN.to_vec();
        bytes[1] += 2;
        bytes.extend_from_slice(&[0x05, 0x00]);
        let err = Request::decode_slice(&bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol {
                field: Field::Message,
                ..
            }
        ));
        assert_eq!(
            err.decode_kind(),
            Some(DecodeErrorKind::TrailingData { remaining: 2 })
        );
    }

    #[test]
    fn test_decode_rejects_extra_tlv_after_varbind_list() {
        let mut bytes = GET_NEXT_FAN.to_vec();
        bytes[1] += 2;
        // PDU length byte follows the community
        bytes[14] += 2;
        bytes.extend_from_slice(&[0x05, 0x00]);
        let err = Request::decode_slice(&bytes).unwrap_err();
        assert!(matches!(err, Error::Protocol { field: Field::Pdu, .. }));
        assert_eq!(
            err.decode_kind(),
            Some(DecodeErrorKind::TrailingData { remaining: 2 })
        );
    }

    #[test]
    fn test_decode_empty_input() {
        assert!(Request::decode_slice(&[]).is_err());
    }

    #[test]
    fn test_encode_response_layout() {
        let bytes = encode_response(
            1,
            b"public",
            1,
            &[(
                oid!(1, 3, 6, 1, 2, 1, 1, 2, 1, 0),
                encode_integer(42),
            )],
        );

        #[rustfmt::skip]
        let expected: &[u8] = &[
            0x30, 0x28,
                0x02, 0x01, 0x01,
                0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c',
                0xA2, 0x1B,
                    0x02, 0x01, 0x01,
                    0x02, 0x01, 0x00,
                    0x02, 0x01, 0x00,
                    0x30, 0x10,
                        0x30, 0x0E,
                            0x06, 0x09, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x02, 0x01, 0x00,
                            0x02, 0x01, 0x2A,
        ];
        assert_eq!(&bytes[..], expected);
    }

    #[test]
    fn test_encode_response_preserves_order() {
        let varbinds = vec![
            (oid!(1, 3, 6, 1, 2), encode_octet_string("b").unwrap()),
            (oid!(1, 3, 6, 1, 1), encode_octet_string("a").unwrap()),
        ];
        let bytes = encode_response(1, b"public", 9, &varbinds);

        // Decode the names back out in wire order
        let mut dec = Decoder::new(bytes);
        let mut msg = dec.read_sequence().unwrap();
        msg.read_integer().unwrap();
        msg.read_octet_string().unwrap();
        let mut pdu = msg.read_constructed(0xA2).unwrap();
        assert_eq!(pdu.read_integer().unwrap(), 9);
        assert_eq!(pdu.read_integer().unwrap(), 0);
        assert_eq!(pdu.read_integer().unwrap(), 0);
        let mut list = pdu.read_sequence().unwrap();
        let mut names = Vec::new();
        while !list.is_empty() {
            let mut vb = list.read_sequence().unwrap();
            names.push(vb.read_oid().unwrap());
            vb.read_octet_string().unwrap();
        }
        assert_eq!(names, vec![oid!(1, 3, 6, 1, 2), oid!(1, 3, 6, 1, 1)]);
    }

    #[test]
    fn test_encode_response_long_form_lengths() {
        let long = "x".repeat(300);
        let bytes = encode_response(
            1,
            b"public",
            1,
            &[(oid!(1, 3, 6, 1), encode_octet_string(&long).unwrap())],
        );
        // Outer sequence must use a two-octet long-form length
        assert_eq!(&bytes[..2], &[0x30, 0x82]);
        let declared = u16::from_be_bytes([bytes[2], bytes[3]]) as usize;
        assert_eq!(declared, bytes.len() - 4);
    }
}
