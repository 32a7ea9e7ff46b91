//! Field-aware masking of sensitive values in structured logs and JSON
//! payloads.
//!
//! This crate provides a single, reusable masking converter that
//! enforces a field-based masking policy across output surfaces: log
//! attributes, captured request and response bodies, and ad-hoc
//! key/value pairs.
//!
//! # Key Features
//!
//! - **Rule-based conversion**: Each sensitive field is bound to one of
//!   five built-in transforms (full exclusion, names, emails, phone and
//!   card numbers, URLs) that keep output recognizable without leaking
//!   the value.
//! - **Streaming JSON masking**: Payloads are re-encoded token by token
//!   with no intermediate tree, and truncated or malformed documents
//!   still yield the masked prefix together with the decode error.
//! - **Process-wide converter**: A lock-free global converter lets
//!   logging call sites mask without threading configuration through
//!   every layer.
//! - **Declarative configuration**: Rules load from JSON files, so
//!   deployments choose what to hide without a rebuild.
//!
//! # Example
//!
//! ```
//! use logmask::{mask_json_with, Converter, Rule};
//!
//! let converter = Converter::new(vec![
//!     Rule::full_exclusion(["password"]),
//!     Rule::mask_email(["email"]),
//! ])?;
//!
//! let masked = mask_json_with(
//!     br#"{"email":"employer@now.com","password":"awesome"}"#,
//!     Some(&converter),
//! );
//! assert!(masked.is_complete());
//! assert_eq!(
//!     masked.text,
//!     r#"{"email":"emp*****@now.com","password":"*******"}"#
//! );
//! # Ok::<(), logmask::MaskError>(())
//! ```

pub mod config;
pub mod error;
pub mod json;
pub mod payload;
pub mod redactor;
pub mod rule;
pub mod transform;

pub use config::{MaskingConfig, RuleConfig};
pub use error::{MaskError, Result};
pub use json::{mask_json, mask_json_with, MaskedJson};
pub use payload::{build_attr, BodyAttr};
pub use redactor::{
    active_converter, clear_active_converter, hide, hide_fields, set_active_converter,
};
pub use rule::{Converter, Rule};
pub use transform::{
    full_exclusion, mask_card_and_phone, mask_email, mask_name, mask_url, Transform,
};
