#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(items) = tessera_cbor::decode::decode_sequence(data) {
        for item in items {
            _ = format!("{item}");
        }
    }
});
