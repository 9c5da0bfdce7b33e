#![no_main]

use libfuzzer_sys::fuzz_target;
use tessera_cbor::{decode, encode};

fuzz_target!(|data: &[u8]| {
    if let Ok((value, _)) = decode::decode_prefix(data) {
        let encoded = encode::encode(&value);
        let decoded = decode::decode(&encoded).expect("Re-encoded value failed to decode");
        assert_eq!(value, decoded);
    }
});
