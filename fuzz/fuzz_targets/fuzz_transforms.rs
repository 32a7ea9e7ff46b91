//! Fuzz target for the value transforms.
//!
//! Tests that every transform handles arbitrary strings without
//! panicking and that star masking preserves visible length.

#![no_main]

use libfuzzer_sys::fuzz_target;
use logmask::{full_exclusion, mask_card_and_phone, mask_email, mask_name, mask_url, Converter};

fuzz_target!(|value: &str| {
    assert_eq!(full_exclusion(value).chars().count(), value.chars().count());
    assert_eq!(mask_name(value).chars().count(), value.chars().count());

    let _ = mask_email(value);
    let _ = mask_card_and_phone(value);
    let _ = mask_url(value, &Converter::default());
});
