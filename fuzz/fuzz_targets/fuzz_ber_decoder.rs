#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use fan_snmp_agent::ber::{Decoder, decode_length};

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);

    let _ = decode_length(data, 0);

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_integer();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_octet_string();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_oid();

    // Walk nested TLVs until something fails
    let mut decoder = Decoder::new(bytes);
    while let Ok((_, mut inner)) = decoder.read_any_constructed() {
        while inner.skip_tlv().is_ok() {}
    }
});
