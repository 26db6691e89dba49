#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use fan_snmp_agent::ber::Decoder;
use fan_snmp_agent::message::Request;
use fan_snmp_agent::pdu::RequestPdu;
use fan_snmp_agent::{ManagedObjectTree, Responder, oid};

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);

    let _ = Request::decode(bytes.clone());

    let mut decoder = Decoder::new(bytes);
    let _ = RequestPdu::decode(&mut decoder);

    // Anything that decodes must also produce a well-formed response
    let mut tree = ManagedObjectTree::new();
    tree.register_fn(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), || {
        Ok(fan_snmp_agent::ber::encode_integer(1))
    });
    let responder = Responder::new(tree);
    if let Some(response) = responder.handle_datagram(data) {
        assert!(Decoder::new(response).read_sequence().is_ok());
    }
});
