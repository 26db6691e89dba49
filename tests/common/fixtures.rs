//! Common test fixtures: request builders, a response parser, and sample trees.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use fan_snmp_agent::ber::{Decoder, EncodeBuf, tag};
use fan_snmp_agent::mib::{self, MibConfig};
use fan_snmp_agent::status::{self, SensorReading, StatusPublisher, StatusReader, Threshold};
use fan_snmp_agent::{Agent, ManagedObjectTree, Oid, StatusSnapshot, oid};
use tokio::net::UdpSocket;
use tracing_subscriber::EnvFilter;

/// V2c community the agent answers.
pub const COMMUNITY: &[u8] = b"public";

/// How long to wait for a reply before deciding none is coming.
pub const REPLY_TIMEOUT: Duration = Duration::from_millis(500);

/// sysObjectID.0, which has no registered object of its own.
pub fn sys_object_id() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 2, 0)
}

/// First fan speed object.
pub fn fan1_speed() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 2, 1, 0)
}

pub fn sys_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
}

pub fn sys_name() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)
}

/// Last registered object (last update time).
pub fn last_update() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 10, 0)
}

// =============================================================================
// Request encoding
// =============================================================================

/// Encode a v2c request with NULL values.
pub fn encode_request(pdu_tag: u8, community: &[u8], request_id: i64, oids: &[Oid]) -> Bytes {
    let mut buf = EncodeBuf::new();
    buf.push_sequence(|buf| {
        buf.push_constructed(pdu_tag, |buf| {
            buf.push_sequence(|buf| {
                for oid in oids.iter().rev() {
                    buf.push_sequence(|buf| {
                        buf.push_null();
                        buf.push_oid(oid);
                    });
                }
            });
            buf.push_integer(0);
            buf.push_integer(0);
            buf.push_integer(request_id);
        });
        buf.push_octet_string(community);
        buf.push_integer(1);
    });
    buf.finish()
}

pub fn get_request(request_id: i64, oids: &[Oid]) -> Bytes {
    encode_request(tag::pdu::GET_REQUEST, COMMUNITY, request_id, oids)
}

pub fn get_next_request(request_id: i64, oids: &[Oid]) -> Bytes {
    encode_request(tag::pdu::GET_NEXT_REQUEST, COMMUNITY, request_id, oids)
}

// =============================================================================
// Response decoding
// =============================================================================

/// A decoded response message. Values are kept as complete TLVs.
#[derive(Debug)]
pub struct Response {
    pub version: i64,
    pub community: Bytes,
    pub pdu_tag: u8,
    pub request_id: i64,
    pub error_status: i64,
    pub error_index: i64,
    pub varbinds: Vec<(Oid, Bytes)>,
}

impl Response {
    pub fn oids(&self) -> Vec<Oid> {
        self.varbinds.iter().map(|(oid, _)| oid.clone()).collect()
    }
}

/// Decode a response, panicking on malformed input.
pub fn decode_response(data: &[u8]) -> Response {
    let mut outer = Decoder::from_slice(data);
    let mut msg = outer.read_sequence().expect("message sequence");
    outer.expect_end().expect("no trailing bytes");

    let version = msg.read_integer().expect("version");
    let community = msg.read_octet_string().expect("community");
    let (pdu_tag, mut pdu) = msg.read_any_constructed().expect("pdu");
    let request_id = pdu.read_integer().expect("request-id");
    let error_status = pdu.read_integer().expect("error-status");
    let error_index = pdu.read_integer().expect("error-index");

    let mut list = pdu.read_sequence().expect("varbind list");
    let mut varbinds = Vec::new();
    while !list.is_empty() {
        let mut vb = list.read_sequence().expect("varbind");
        let oid = vb.read_oid().expect("name");
        let value = Bytes::copy_from_slice(vb.remaining_slice());
        varbinds.push((oid, value));
    }

    Response {
        version,
        community,
        pdu_tag,
        request_id,
        error_status,
        error_index,
        varbinds,
    }
}

/// Decode an INTEGER TLV.
pub fn integer_value(tlv: &[u8]) -> i64 {
    Decoder::from_slice(tlv).read_integer().expect("integer value")
}

/// Decode an OCTET STRING TLV.
pub fn string_value(tlv: &[u8]) -> String {
    let bytes = Decoder::from_slice(tlv)
        .read_octet_string()
        .expect("octet string value");
    String::from_utf8(bytes.to_vec()).expect("utf-8 value")
}

// =============================================================================
// Agents
// =============================================================================

pub fn sample_snapshot() -> StatusSnapshot {
    StatusSnapshot {
        fan_speeds: BTreeMap::from([(0, 42), (1, 55), (5, 100)]),
        temps: BTreeMap::from([
            (
                1,
                SensorReading {
                    current: 45.9,
                    warning: 80.0,
                    critical: 90.0,
                },
            ),
            (
                29,
                SensorReading {
                    current: 70.4,
                    warning: 120.0,
                    critical: 125.0,
                },
            ),
        ]),
        outdoor_temp: -3.7,
        usetemp: Threshold::Critical,
        ..Default::default()
    }
    .with_last_update_unix_secs(1_700_000_000)
}

/// The fan controller tree over a live status channel.
pub fn fan_tree(city: &str) -> (ManagedObjectTree, StatusPublisher, StatusReader) {
    let (publisher, reader) = status::channel(sample_snapshot());
    let mut tree = ManagedObjectTree::new();
    let config = MibConfig {
        city: city.to_string(),
        ..MibConfig::default()
    };
    mib::register_fan_objects(&mut tree, &reader, &config);
    (tree, publisher, reader)
}

/// Route agent logs through the test harness. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Bind an agent on an ephemeral loopback port and run it in the background.
pub async fn spawn_agent(tree: ManagedObjectTree) -> SocketAddr {
    init_tracing();
    let agent = Agent::builder()
        .bind("127.0.0.1:0")
        .tree(tree)
        .build()
        .await
        .expect("agent binds");
    let addr = agent.local_addr();
    tokio::spawn(async move {
        let _ = agent.run().await;
    });
    addr
}

/// Loopback client socket connected to `agent`.
pub async fn client(agent: SocketAddr) -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").await.expect("client binds");
    socket.connect(agent).await.expect("client connects");
    socket
}

/// Send one datagram and wait briefly for the reply.
pub async fn exchange(socket: &UdpSocket, request: &[u8]) -> Option<Vec<u8>> {
    socket.send(request).await.expect("send");
    let mut buf = vec![0u8; 65535];
    match tokio::time::timeout(REPLY_TIMEOUT, socket.recv(&mut buf)).await {
        Ok(Ok(len)) => {
            buf.truncate(len);
            Some(buf)
        }
        Ok(Err(e)) => panic!("recv failed: {}", e),
        Err(_) => None,
    }
}
