#![no_main]

use libfuzzer_sys::fuzz_target;
use roster_core::codec;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let query = codec::decode(raw);
    assert!(query.page() >= 1);
    // Whatever decodes must re-encode to a fixed point.
    let encoded = codec::encode(&query);
    assert_eq!(codec::decode(&encoded), query);
    assert_eq!(codec::encode(&codec::decode(&encoded)), encoded);
});
