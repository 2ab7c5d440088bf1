//! Error types for the protocol layer.
//!
//! Each Kelas crate defines its own error enum. A `ProtocolError` always
//! means a persisted value couldn't be turned into (or out of) its text
//! form; it never means the storage backend itself failed.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into text).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, wrong types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The value parsed but is not meaningful, e.g. an expiry timestamp
    /// that isn't a number of milliseconds.
    #[error("invalid value: {0}")]
    Invalid(String),
}
