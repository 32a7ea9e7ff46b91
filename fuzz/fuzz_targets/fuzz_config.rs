//! Fuzz target for masking configuration parsing.
//!
//! Tests that JSON rule configuration parsing handles arbitrary input
//! without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use logmask::MaskingConfig;

fuzz_target!(|data: &[u8]| {
    // Parsing may fail but must never panic; a parsed config must build
    // or report a duplicate field, nothing else
    if let Ok(config) = serde_json::from_slice::<MaskingConfig>(data) {
        let _ = config.build();
    }
});
