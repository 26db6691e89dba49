//! Managed object registration.
//!
//! - [`ValueProvider`] - produces the already-encoded value for one OID
//! - [`OidTable`] - sorted OID storage with exact and successor lookup
//! - [`ManagedObjectTree`] - the table of providers an [`Agent`](crate::agent::Agent) serves
//!
//! Providers run synchronously on the request path, so they must be cheap
//! and must not block. A provider returns a complete INTEGER or OCTET STRING
//! TLV; returning an error makes the agent skip that OID in the response.
//!
//! ```rust
//! use fan_snmp_agent::ber::{encode_integer, encode_octet_string};
//! use fan_snmp_agent::handler::ManagedObjectTree;
//! use fan_snmp_agent::oid;
//!
//! let mut tree = ManagedObjectTree::new();
//! tree.register_fn(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), || {
//!     encode_octet_string("SNMP Fan Proxy Server")
//! });
//! tree.register_fn(oid!(1, 3, 6, 1, 2, 1, 1, 2, 1, 0), || Ok(encode_integer(42)));
//!
//! assert_eq!(tree.len(), 2);
//! ```

mod oid_table;

pub use oid_table::OidTable;

use crate::error::Result;
use crate::oid::Oid;
use bytes::Bytes;

/// Source of the current value for one managed object.
pub trait ValueProvider: Send + Sync + 'static {
    /// Produce the BER-encoded value (tag, length, and content).
    fn provide(&self) -> Result<Bytes>;
}

impl<F> ValueProvider for F
where
    F: Fn() -> Result<Bytes> + Send + Sync + 'static,
{
    fn provide(&self) -> Result<Bytes> {
        self()
    }
}

/// Providers keyed by OID, ordered numerically for GETNEXT.
pub type ManagedObjectTree = OidTable<Box<dyn ValueProvider>>;

impl ManagedObjectTree {
    /// Register a provider, replacing any existing one for the same OID.
    pub fn register(&mut self, oid: Oid, provider: impl ValueProvider) {
        self.insert(oid, Box::new(provider));
    }

    /// Register a closure provider.
    pub fn register_fn<F>(&mut self, oid: Oid, f: F)
    where
        F: Fn() -> Result<Bytes> + Send + Sync + 'static,
    {
        self.register(oid, f);
    }
}
