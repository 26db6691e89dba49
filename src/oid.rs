//! Object Identifier (OID) type.
//!
//! OIDs are stored as `SmallVec<[u32; 16]>` to avoid heap allocation for common OIDs.
//! Ordering is numeric arc by arc, so `1.3.6.1.9` sorts before `1.3.6.1.10`.

use crate::error::{DecodeError, DecodeErrorKind, DecodeResult, Error, OidErrorKind, Result};
use smallvec::SmallVec;
use std::fmt;

/// Arcs prepended to OIDs that have fewer than two components.
pub const SHORT_OID_PREFIX: [u32; 2] = [1, 3];

/// Object Identifier.
///
/// Stored as a sequence of arc values (u32). Uses SmallVec to avoid
/// heap allocation for OIDs with 16 or fewer arcs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self {
            arcs: SmallVec::new(),
        }
    }

    /// Create an OID from arc values.
    ///
    /// ```
    /// use fan_snmp_agent::oid::Oid;
    ///
    /// let oid = Oid::new([1, 3, 6, 1]);
    /// assert_eq!(oid.len(), 4);
    /// ```
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    /// Create an OID from a slice of arcs.
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse an OID from dotted string notation (e.g., "1.3.6.1.2.1.1.1.0").
    ///
    /// Empty components are ignored. Arc constraints are not checked here;
    /// call [`validate()`](Self::validate) for that.
    ///
    /// ```
    /// use fan_snmp_agent::oid::Oid;
    ///
    /// let oid = Oid::parse("1.3.6.1.2.1.1.1.0").unwrap();
    /// assert!(oid.validate().is_ok());
    ///
    /// let invalid = Oid::parse("3.0").unwrap();
    /// assert!(invalid.validate().is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let mut arcs = SmallVec::new();

        for part in s.split('.').filter(|p| !p.is_empty()) {
            let arc: u32 = part
                .parse()
                .map_err(|_| Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s))?;
            arcs.push(arc);
        }

        Ok(Self { arcs })
    }

    /// Get the arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Get the number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Check if the OID is empty.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Check if this OID starts with another OID.
    pub fn starts_with(&self, other: &Oid) -> bool {
        self.arcs.len() >= other.arcs.len() && self.arcs[..other.arcs.len()] == other.arcs[..]
    }

    /// Create a child OID by appending an arc.
    ///
    /// ```
    /// use fan_snmp_agent::oid;
    ///
    /// let fans = oid!(1, 3, 6, 1, 2, 1, 1, 2);
    /// assert_eq!(fans.child(1).child(0).to_string(), "1.3.6.1.2.1.1.2.1.0");
    /// ```
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Oid { arcs }
    }

    /// Return this OID with `1.3` prepended if it has fewer than two arcs.
    ///
    /// ```
    /// use fan_snmp_agent::oid;
    ///
    /// assert_eq!(oid!(6).normalized(), oid!(1, 3, 6));
    /// assert_eq!(oid!(1, 3, 6).normalized(), oid!(1, 3, 6));
    /// ```
    pub fn normalized(self) -> Oid {
        if self.arcs.len() >= 2 {
            return self;
        }
        let mut arcs: SmallVec<[u32; 16]> = SmallVec::from_slice(&SHORT_OID_PREFIX);
        arcs.extend_from_slice(&self.arcs);
        Oid { arcs }
    }

    /// Validate OID arcs per X.690 Section 8.19.4.
    ///
    /// - arc1 must be 0, 1, or 2
    /// - arc2 must be <= 39 when arc1 is 0 or 1
    pub fn validate(&self) -> Result<()> {
        let Some(&arc1) = self.arcs.first() else {
            return Ok(());
        };

        if arc1 > 2 {
            return Err(Error::invalid_oid_with_input(
                OidErrorKind::InvalidFirstArc(arc1),
                self.to_string(),
            ));
        }

        if let Some(&arc2) = self.arcs.get(1)
            && arc1 < 2
            && arc2 >= 40
        {
            return Err(Error::invalid_oid_with_input(
                OidErrorKind::InvalidSecondArc {
                    first: arc1,
                    second: arc2,
                },
                self.to_string(),
            ));
        }

        Ok(())
    }

    /// Encode to BER content octets, returning bytes in a stack-allocated buffer.
    ///
    /// OIDs shorter than two arcs are normalized first. The first two arcs
    /// are combined as `arc1 * 40 + arc2`; every subidentifier is base-128
    /// with the continuation bit on all but its last byte.
    pub fn to_ber_smallvec(&self) -> SmallVec<[u8; 64]> {
        let mut bytes = SmallVec::new();

        let (arc1, arc2, rest) = match self.arcs.as_slice() {
            [a, b, rest @ ..] => (*a, *b, rest),
            [a] => (SHORT_OID_PREFIX[0], SHORT_OID_PREFIX[1], std::slice::from_ref(a)),
            [] => (SHORT_OID_PREFIX[0], SHORT_OID_PREFIX[1], &[][..]),
        };

        // Widened so arc2 > 127 under arc1 = 2 cannot overflow
        let first_subid = u64::from(arc1) * 40 + u64::from(arc2);
        encode_subidentifier(&mut bytes, first_subid);

        for &arc in rest {
            encode_subidentifier(&mut bytes, u64::from(arc));
        }

        bytes
    }

    /// Encode to BER content octets.
    pub fn to_ber(&self) -> Vec<u8> {
        self.to_ber_smallvec().to_vec()
    }

    /// Decode from BER content octets.
    ///
    /// Error offsets are relative to the start of `data`.
    pub fn from_ber(data: &[u8]) -> DecodeResult<Self> {
        if data.is_empty() {
            return Err(DecodeError::new(0, DecodeErrorKind::InvalidOidEncoding));
        }

        let mut arcs = SmallVec::new();

        let (first_subid, consumed) = decode_subidentifier(data, 0)?;
        let (arc1, arc2) = match first_subid {
            0..40 => (0, first_subid),
            40..80 => (1, first_subid - 40),
            _ => (2, first_subid - 80),
        };
        arcs.push(arc1);
        arcs.push(narrow(arc2, 0)?);

        let mut i = consumed;
        while i < data.len() {
            let (arc, bytes_consumed) = decode_subidentifier(&data[i..], i)?;
            arcs.push(narrow(arc, i)?);
            i += bytes_consumed;
        }

        Ok(Self { arcs })
    }
}

/// Encode a subidentifier in base-128 variable length.
#[inline]
fn encode_subidentifier(bytes: &mut SmallVec<[u8; 64]>, value: u64) {
    if value == 0 {
        bytes.push(0);
        return;
    }

    let groups = (u64::BITS - value.leading_zeros()).div_ceil(7);

    for i in (0..groups).rev() {
        let mut byte = ((value >> (i * 7)) & 0x7F) as u8;
        if i > 0 {
            byte |= 0x80;
        }
        bytes.push(byte);
    }
}

/// Decode a subidentifier, returning (value, bytes_consumed).
fn decode_subidentifier(data: &[u8], base: usize) -> DecodeResult<(u64, usize)> {
    let mut value: u64 = 0;

    for (i, &byte) in data.iter().enumerate() {
        if value > (u64::MAX >> 7) {
            return Err(DecodeError::new(base + i, DecodeErrorKind::IntegerOverflow));
        }

        value = (value << 7) | u64::from(byte & 0x7F);

        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }

    // Continuation bit set on the final byte
    Err(DecodeError::new(
        base + data.len(),
        DecodeErrorKind::InvalidOidEncoding,
    ))
}

fn narrow(value: u64, offset: usize) -> DecodeResult<u32> {
    u32::try_from(value).map_err(|_| DecodeError::new(offset, DecodeErrorKind::IntegerOverflow))
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut arcs = self.arcs.iter();
        if let Some(first) = arcs.next() {
            write!(f, "{}", first)?;
            for arc in arcs {
                write!(f, ".{}", arc)?;
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::new(arcs)
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.arcs.cmp(&other.arcs)
    }
}

/// Macro to create an OID from literal arcs.
///
/// ```
/// use fan_snmp_agent::oid;
///
/// let sys_descr = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
/// assert_eq!(sys_descr.to_string(), "1.3.6.1.2.1.1.1.0");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}
