//! Error types for the masking engine.

use thiserror::Error;

/// Result type for masking operations.
pub type Result<T> = std::result::Result<T, MaskError>;

/// Errors that can occur while building rules or masking payloads.
#[derive(Error, Debug)]
pub enum MaskError {
    /// Two rules claim the same field name. Raised while building a
    /// [`Converter`](crate::Converter), never while masking.
    #[error("duplicate rule for field `{field}`")]
    DuplicateField { field: String },

    /// Malformed or truncated JSON. The encoder still returns everything
    /// it emitted before the offending byte.
    #[error("invalid json at byte {offset}: {message}")]
    Decode { message: String, offset: usize },

    /// I/O error while reading or writing a rules file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Rules file did not parse.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl MaskError {
    /// Create a decode error at the given byte offset.
    pub(crate) fn decode(message: impl Into<String>, offset: usize) -> Self {
        MaskError::Decode {
            message: message.into(),
            offset,
        }
    }

    /// Returns whether this error is recoverable by the caller (decode
    /// errors carry usable partial output; configuration errors do not).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MaskError::Decode { .. })
    }
}
