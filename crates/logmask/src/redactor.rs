//! Process-wide converter handle and the masking entry points.
//!
//! The swappable converter is the only shared mutable state in this
//! crate. Readers take a lock-free snapshot per call, writers replace
//! the whole converter atomically; an in-flight call keeps the snapshot
//! it started with.

use std::borrow::Cow;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde_json::{Map, Value};

use crate::rule::Converter;

static ACTIVE: ArcSwapOption<Converter> = ArcSwapOption::const_empty();

/// Install `converter` as the process-wide converter.
pub fn set_active_converter(converter: Converter) {
    tracing::debug!(fields = converter.len(), "masking converter installed");
    ACTIVE.store(Some(Arc::new(converter)));
}

/// Remove the process-wide converter; masking becomes a pass-through.
pub fn clear_active_converter() {
    tracing::debug!("masking converter cleared");
    ACTIVE.store(None);
}

/// Snapshot of the currently active converter, if one is installed.
pub fn active_converter() -> Option<Arc<Converter>> {
    ACTIVE.load_full()
}

/// Mask `value` under the rule the active converter has for `key`.
///
/// Total by design: with no converter installed, no matching rule, or
/// an empty value, the input comes back unchanged.
pub fn hide<'v>(key: &str, value: &'v str) -> Cow<'v, str> {
    let active = ACTIVE.load();
    match active.as_ref() {
        Some(converter) => converter.hide(key, value),
        None => Cow::Borrowed(value),
    }
}

/// Masks every string value of a flat attribute map in place, keyed by
/// its entry name. Non-string values pass through untouched.
pub fn hide_fields(fields: &mut Map<String, Value>) {
    let Some(converter) = active_converter() else {
        return;
    };
    for (key, value) in fields.iter_mut() {
        let Value::String(s) = value else { continue };
        let masked = converter.hide(key, s.as_str());
        if let Cow::Owned(m) = masked {
            *s = m;
        }
    }
}

/// Serializes access to the process-wide converter across tests.
#[cfg(test)]
pub(crate) fn test_guard() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
