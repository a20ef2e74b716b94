#![no_main]

use gavel_proto::{Inbound, decode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    // Decoding arbitrary text must never panic
    if let Ok(Inbound::Snapshot(update)) = decode(raw) {
        // A decoded snapshot re-encodes and decodes to itself
        let encoded = serde_json::to_string(&update).unwrap();
        assert_eq!(decode(&encoded).unwrap(), Inbound::Snapshot(update));
    }
});
