#![no_main]

use libfuzzer_sys::fuzz_target;
use roster_core::model::{RawSubscription, RawUser};
use roster_core::{QueryState, join, pipeline};

fuzz_target!(|data: (&[u8], &[u8])| {
    let (subs, users) = data;
    let Ok(subs) = serde_json::from_slice::<Vec<RawSubscription>>(subs) else {
        return;
    };
    let Ok(users) = serde_json::from_slice::<Vec<RawUser>>(users) else {
        return;
    };
    let records = join(&subs, &users);
    assert_eq!(records.len(), subs.len());
    let out = pipeline::apply(&records, &QueryState::default());
    assert_eq!(out.len(), records.len());
});
