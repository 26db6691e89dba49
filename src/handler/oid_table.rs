//! Sorted OID storage for exact and GETNEXT lookups.

use crate::oid::Oid;

/// OID-keyed values kept in numeric OID order.
///
/// Lookups are binary searches over a sorted `Vec`. The table is built once
/// and then only read, so insertion cost does not matter.
///
/// ```rust
/// use fan_snmp_agent::handler::OidTable;
/// use fan_snmp_agent::oid;
///
/// let mut table = OidTable::new();
/// table.insert(oid!(1, 3, 6, 1, 10), "ten");
/// table.insert(oid!(1, 3, 6, 1, 9), "nine");
///
/// // Numeric, not textual, order
/// let (next, value) = table.get_next(&oid!(1, 3, 6, 1, 8)).unwrap();
/// assert_eq!(next, &oid!(1, 3, 6, 1, 9));
/// assert_eq!(*value, "nine");
/// ```
#[derive(Debug, Clone)]
pub struct OidTable<V> {
    entries: Vec<(Oid, V)>,
}

impl<V> OidTable<V> {
    /// Create a new empty OID table.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create an OID table with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    fn search(&self, oid: &Oid) -> std::result::Result<usize, usize> {
        self.entries.binary_search_by(|(o, _)| o.cmp(oid))
    }

    /// Insert an OID-value pair, maintaining sorted order.
    ///
    /// If the OID already exists, its value is replaced.
    pub fn insert(&mut self, oid: Oid, value: V) {
        match self.search(&oid) {
            Ok(idx) => self.entries[idx].1 = value,
            Err(idx) => self.entries.insert(idx, (oid, value)),
        }
    }

    /// Get the value for an exact OID match.
    pub fn get(&self, oid: &Oid) -> Option<&V> {
        self.search(oid).ok().map(|idx| &self.entries[idx].1)
    }

    /// Get the smallest entry strictly greater than `oid`.
    ///
    /// Returns `None` past the last entry.
    pub fn get_next(&self, oid: &Oid) -> Option<(&Oid, &V)> {
        let idx = match self.search(oid) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        };
        self.entries.get(idx).map(|(o, v)| (o, v))
    }

    /// Get the number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all OID-value pairs in OID order.
    pub fn iter(&self) -> impl Iterator<Item = (&Oid, &V)> {
        self.entries.iter().map(|(o, v)| (o, v))
    }
}

impl<V> Default for OidTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<(Oid, V)> for OidTable<V> {
    fn from_iter<I: IntoIterator<Item = (Oid, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (oid, value) in iter {
            table.insert(oid, value);
        }
        table
    }
}
