#![no_main]

//! Fuzz target for call record payload handling.
//!
//! Feeds arbitrary bytes through JSON parsing and the validator. Neither may
//! panic, and every rejection must carry at least one field error.

use libfuzzer_sys::fuzz_target;
use paylog_core::validate;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(payload) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    match validate(&payload) {
        Ok(record) => {
            assert!(payload.is_object());
            assert_eq!(payload["tx_hash"].as_str(), Some(record.tx_hash.as_str()));
        },
        Err(errors) => {
            assert!(!errors.is_empty());
            for error in &errors {
                assert!(!error.to_string().is_empty());
            }
        },
    }
});
