//! SNMP Protocol Data Units (PDUs).
//!
//! Only the request PDUs this agent answers and the response PDU it sends.

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeContext, DecodeError, DecodeErrorKind, Error, Field, Result};
use crate::oid::Oid;
use bytes::Bytes;

/// PDU type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PduType {
    GetRequest = tag::pdu::GET_REQUEST,
    GetNextRequest = tag::pdu::GET_NEXT_REQUEST,
    Response = tag::pdu::RESPONSE,
}

impl PduType {
    /// Create from tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            tag::pdu::GET_REQUEST => Some(Self::GetRequest),
            tag::pdu::GET_NEXT_REQUEST => Some(Self::GetNextRequest),
            tag::pdu::RESPONSE => Some(Self::Response),
            _ => None,
        }
    }

    /// Get the tag byte.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// True for the PDU types an agent accepts.
    pub fn is_request(self) -> bool {
        matches!(self, Self::GetRequest | Self::GetNextRequest)
    }
}

impl std::fmt::Display for PduType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GetRequest => write!(f, "GetRequest"),
            Self::GetNextRequest => write!(f, "GetNextRequest"),
            Self::Response => write!(f, "Response"),
        }
    }
}

/// Decoded GetRequest or GetNextRequest PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPdu {
    pub pdu_type: PduType,
    pub request_id: i64,
    /// Requested names, in request order.
    pub oids: Vec<Oid>,
}

impl RequestPdu {
    /// Decode a request PDU.
    ///
    /// Error status and error index must be INTEGERs and are discarded.
    /// Varbind values are skipped without being interpreted.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let at = decoder.offset();
        let tag = decoder.read_tag().context(Field::Pdu)?;
        let pdu_type = PduType::from_tag(tag)
            .filter(|t| t.is_request())
            .ok_or_else(|| {
                Error::protocol(
                    Field::Pdu,
                    DecodeError::new(at, DecodeErrorKind::UnknownPduType(tag)),
                )
            })?;

        let len = decoder.read_length().context(Field::Pdu)?;
        let mut pdu = decoder.sub_decoder(len).context(Field::Pdu)?;

        let request_id = pdu.read_integer().context(Field::RequestId)?;
        pdu.read_integer().context(Field::ErrorStatus)?;
        pdu.read_integer().context(Field::ErrorIndex)?;

        let mut list = pdu.read_sequence().context(Field::VarbindList)?;
        let mut oids = Vec::new();
        while !list.is_empty() {
            let mut varbind = list.read_sequence().context(Field::Varbind)?;
            oids.push(varbind.read_oid().context(Field::Name)?);
            varbind.skip_tlv().context(Field::Value)?;
            varbind.expect_end().context(Field::Varbind)?;
        }
        pdu.expect_end().context(Field::Pdu)?;

        Ok(Self {
            pdu_type,
            request_id,
            oids,
        })
    }
}

/// Encode a Response PDU with error-status 0 and error-index 0.
///
/// Each value must already be a complete TLV.
pub fn encode_response_pdu(buf: &mut EncodeBuf, request_id: i64, varbinds: &[(Oid, Bytes)]) {
    buf.push_constructed(PduType::Response.tag(), |buf| {
        buf.push_sequence(|buf| {
            for (oid, value) in varbinds.iter().rev() {
                buf.push_sequence(|buf| {
                    buf.push_encoded(value);
                    buf.push_oid(oid);
                });
            }
        });
        buf.push_integer(0);
        buf.push_integer(0);
        buf.push_integer(request_id);
    });
}
