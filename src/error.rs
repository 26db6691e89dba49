//! Error types for fan-snmp-agent.
//!
//! Decoding is split in two layers. The BER [`Decoder`](crate::ber::Decoder)
//! reports a [`DecodeError`] carrying the byte offset and a [`DecodeErrorKind`].
//! The message layer attaches the [`Field`] that was being read, producing
//! [`Error::Protocol`]. Any such error aborts the whole decode of one datagram.

use std::net::SocketAddr;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for the BER decoding layer.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// BER decode error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Expected different tag.
    UnexpectedTag { expected: u8, actual: u8 },
    /// Data truncated unexpectedly.
    TruncatedData,
    /// A declared length runs past the end of the enclosing value.
    InsufficientData { needed: usize, available: usize },
    /// Indefinite length not supported.
    IndefiniteLength,
    /// Length field too long.
    LengthTooLong { octets: usize },
    /// Zero-length integer.
    ZeroLengthInteger,
    /// Integer value overflow.
    IntegerOverflow,
    /// Invalid OID encoding.
    InvalidOidEncoding,
    /// Unknown or unsupported PDU type.
    UnknownPduType(u8),
    /// Bytes left over after a complete value.
    TrailingData { remaining: usize },
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{:02X}, got 0x{:02X}", expected, actual)
            }
            Self::TruncatedData => write!(f, "unexpected end of data"),
            Self::InsufficientData { needed, available } => {
                write!(f, "need {} bytes but only {} remaining", needed, available)
            }
            Self::IndefiniteLength => write!(f, "indefinite length encoding not supported"),
            Self::LengthTooLong { octets } => {
                write!(f, "length encoding too long ({} octets)", octets)
            }
            Self::ZeroLengthInteger => write!(f, "zero-length integer"),
            Self::IntegerOverflow => write!(f, "integer overflow"),
            Self::InvalidOidEncoding => write!(f, "invalid OID encoding"),
            Self::UnknownPduType(t) => write!(f, "unsupported PDU type: 0x{:02X}", t),
            Self::TrailingData { remaining } => {
                write!(f, "{} trailing bytes after value", remaining)
            }
        }
    }
}

impl DecodeErrorKind {
    /// True for the truncation family (not enough bytes for a declared length).
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::TruncatedData | Self::InsufficientData { .. })
    }
}

/// Low-level BER decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at offset {offset}")]
pub struct DecodeError {
    /// Offset within the buffer being decoded.
    pub offset: usize,
    /// What went wrong.
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    /// Create a decode error.
    pub fn new(offset: usize, kind: DecodeErrorKind) -> Self {
        Self { offset, kind }
    }
}

/// Message field being decoded when a [`DecodeError`] occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Message,
    Version,
    Community,
    Pdu,
    RequestId,
    ErrorStatus,
    ErrorIndex,
    VarbindList,
    Varbind,
    Name,
    Value,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Message => "message",
            Self::Version => "version",
            Self::Community => "community",
            Self::Pdu => "PDU",
            Self::RequestId => "request ID",
            Self::ErrorStatus => "error status",
            Self::ErrorIndex => "error index",
            Self::VarbindList => "varbind list",
            Self::Varbind => "varbind",
            Self::Name => "varbind name",
            Self::Value => "varbind value",
        };
        f.write_str(name)
    }
}

/// BER encode error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeErrorKind {
    /// Character outside the single-byte (Latin-1) range.
    NonLatin1Char { ch: char, index: usize },
}

impl std::fmt::Display for EncodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonLatin1Char { ch, index } => write!(
                f,
                "character {:?} (U+{:04X}) at index {} is outside Latin-1",
                ch, *ch as u32, index
            ),
        }
    }
}

/// OID validation error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidErrorKind {
    /// Invalid arc value.
    InvalidArc,
    /// First arc must be 0, 1, or 2.
    InvalidFirstArc(u32),
    /// Second arc too large for first arc value.
    InvalidSecondArc { first: u32, second: u32 },
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArc => write!(f, "invalid arc value"),
            Self::InvalidFirstArc(v) => write!(f, "first arc must be 0, 1, or 2, got {}", v),
            Self::InvalidSecondArc { first, second } => {
                write!(f, "second arc {} too large for first arc {}", second, first)
            }
        }
    }
}

/// Library error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error on the agent socket.
    #[error("I/O error{}: {source}", target.map(|t| format!(" communicating with {}", t)).unwrap_or_default())]
    Io {
        target: Option<SocketAddr>,
        #[source]
        source: std::io::Error,
    },

    /// Malformed inbound message.
    #[error("invalid {field}: {source}")]
    Protocol {
        field: Field,
        #[source]
        source: DecodeError,
    },

    /// Value cannot be BER-encoded.
    #[error("encode error: {kind}")]
    Encoding { kind: EncodeErrorKind },

    /// Invalid OID format.
    #[error("invalid OID{}: {kind}", input.as_ref().map(|i| format!(" '{}'", i)).unwrap_or_default())]
    InvalidOid {
        kind: OidErrorKind,
        input: Option<Box<str>>,
    },
}

impl Error {
    /// Create a protocol error for a field.
    pub fn protocol(field: Field, source: DecodeError) -> Self {
        Self::Protocol { field, source }
    }

    /// Create an encode error.
    pub fn encode(kind: EncodeErrorKind) -> Self {
        Self::Encoding { kind }
    }

    /// Create an I/O error, optionally naming the peer.
    pub fn io(target: Option<SocketAddr>, source: std::io::Error) -> Self {
        Self::Io { target, source }
    }

    /// Create an invalid OID error from a kind (no input string).
    pub fn invalid_oid(kind: OidErrorKind) -> Self {
        Self::InvalidOid { kind, input: None }
    }

    /// Create an invalid OID error with the input string that failed.
    pub fn invalid_oid_with_input(kind: OidErrorKind, input: impl Into<Box<str>>) -> Self {
        Self::InvalidOid {
            kind,
            input: Some(input.into()),
        }
    }

    /// The decode error kind, if this is a protocol error.
    pub fn decode_kind(&self) -> Option<DecodeErrorKind> {
        match self {
            Self::Protocol { source, .. } => Some(source.kind),
            _ => None,
        }
    }
}

/// Attach the field being decoded to a BER-level result.
pub trait DecodeContext<T> {
    /// Convert a [`DecodeError`] into [`Error::Protocol`] for `field`.
    fn context(self, field: Field) -> Result<T>;
}

impl<T> DecodeContext<T> for DecodeResult<T> {
    fn context(self, field: Field) -> Result<T> {
        self.map_err(|source| Error::protocol(field, source))
    }
}
