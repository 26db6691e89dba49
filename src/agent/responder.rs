//! Request resolution and response assembly, independent of the socket.

use bytes::Bytes;

use crate::ber::encode_null;
use crate::error::Result;
use crate::handler::ManagedObjectTree;
use crate::message::{Request, encode_response};
use crate::oid::Oid;
use crate::pdu::PduType;

/// The only community string answered.
pub const COMMUNITY: &[u8] = b"public";

/// Value for an exact GET.
///
/// Unknown OIDs resolve to NULL. The only error is a failing provider.
pub fn resolve_get(tree: &ManagedObjectTree, oid: &Oid) -> Result<Bytes> {
    match tree.get(oid) {
        Some(provider) => provider.provide(),
        None => Ok(encode_null()),
    }
}

/// Successor of `oid` in numeric order, with its value.
///
/// `None` when `oid` is at or past the last registered object.
pub fn resolve_get_next<'a>(
    tree: &'a ManagedObjectTree,
    oid: &Oid,
) -> Option<(&'a Oid, Result<Bytes>)> {
    tree.get_next(oid)
        .map(|(next, provider)| (next, provider.provide()))
}

/// Response varbinds keyed by OID, in first-insertion order.
#[derive(Debug, Default)]
struct VarbindList {
    entries: Vec<(Oid, Bytes)>,
}

impl VarbindList {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// A repeated key keeps its first position and takes the new value.
    fn insert(&mut self, oid: Oid, value: Bytes) {
        match self.entries.iter_mut().find(|(o, _)| *o == oid) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((oid, value)),
        }
    }
}

/// Answers decoded requests from a [`ManagedObjectTree`].
pub struct Responder {
    tree: ManagedObjectTree,
}

impl Responder {
    pub fn new(tree: ManagedObjectTree) -> Self {
        Self { tree }
    }

    /// The registered objects.
    pub fn tree(&self) -> &ManagedObjectTree {
        &self.tree
    }

    /// Process one datagram payload.
    ///
    /// Returns the encoded response, or `None` when nothing should be sent:
    /// the payload did not decode, or the community was not `public`.
    pub fn handle_datagram(&self, payload: &[u8]) -> Option<Bytes> {
        let request = match Request::decode(Bytes::copy_from_slice(payload)) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    snmp.bytes = payload.len(),
                    snmp.dump = %hex_dump(payload),
                    "dropping malformed request"
                );
                return None;
            }
        };

        if request.community != COMMUNITY {
            tracing::debug!(
                snmp.request_id = request.request_id,
                snmp.community = %request.community_lossy(),
                "dropping request with unknown community"
            );
            return None;
        }

        tracing::debug!(
            snmp.request_id = request.request_id,
            snmp.pdu_type = %request.pdu_type,
            snmp.varbind_count = request.oids.len(),
            "handling request"
        );

        let varbinds = self.resolve(&request);
        Some(encode_response(
            request.version,
            &request.community,
            request.request_id,
            &varbinds.entries,
        ))
    }

    fn resolve(&self, request: &Request) -> VarbindList {
        let mut varbinds = VarbindList::with_capacity(request.oids.len());

        for oid in &request.oids {
            match request.pdu_type {
                PduType::GetNextRequest => match resolve_get_next(&self.tree, oid) {
                    Some((next, Ok(value))) => varbinds.insert(next.clone(), value),
                    Some((next, Err(e))) => skip_failed(next, &e),
                    // End of tree: NULL under the requested name
                    None => varbinds.insert(oid.clone(), encode_null()),
                },
                PduType::GetRequest => match resolve_get(&self.tree, oid) {
                    Ok(value) => varbinds.insert(oid.clone(), value),
                    Err(e) => skip_failed(oid, &e),
                },
                // Not a request; decoding never yields it
                PduType::Response => {}
            }
        }

        varbinds
    }
}

fn skip_failed(oid: &Oid, error: &crate::error::Error) {
    tracing::warn!(
        snmp.oid = %oid,
        error = %error,
        "value provider failed, omitting varbind"
    );
}

/// Space-separated hex of at most the first 512 bytes.
pub(crate) fn hex_dump(data: &[u8]) -> String {
    const LIMIT: usize = 512;

    let mut out = String::with_capacity(data.len().min(LIMIT) * 3 + 4);
    for (i, byte) in data.iter().take(LIMIT).enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{:02x}", byte));
    }
    if data.len() > LIMIT {
        out.push_str(" ...");
    }
    out
}
