#![no_main]

use libfuzzer_sys::fuzz_target;

use fan_snmp_agent::oid::Oid;

fuzz_target!(|data: &[u8]| {
    if let Ok(oid) = Oid::from_ber(data) {
        let _ = oid.to_ber();
    }

    if let Ok(s) = std::str::from_utf8(data)
        && let Ok(oid) = Oid::parse(s)
    {
        let _ = oid.validate();
        let _ = oid.to_string();
    }
});
