//! Codec trait and implementations for persisting records as text.
//!
//! Everything the portal stores goes through a [`Codec`]: the user record,
//! the per-user stats map, anything a widget wants to remember. The store
//! itself only deals in strings, so the codec is where typed records meet
//! raw storage.
//!
//! Currently we provide [`JsonCodec`], which produces the same JSON the
//! browser version of the portal kept in local storage.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` so a codec can live inside the session guard,
/// which itself lives inside a long-running Tokio task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Like [`encode`](Self::encode), but produces a `String` suitable for a
    /// key-value store.
    ///
    /// # Errors
    /// Fails if encoding fails or the codec emits non-UTF-8 bytes.
    fn encode_str<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        let bytes = self.encode(value)?;
        String::from_utf8(bytes).map_err(|e| {
            ProtocolError::Invalid(format!("codec produced non-UTF-8 output: {e}"))
        })
    }

    /// Like [`decode`](Self::decode), but reads from a stored string.
    ///
    /// # Errors
    /// Same as [`decode`](Self::decode).
    fn decode_str<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError> {
        self.decode(text.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use kelas_protocol::{Codec, JsonCodec, Theme};
///
/// let codec = JsonCodec;
/// let text = codec.encode_str(&Theme::Dark).unwrap();
/// assert_eq!(text, "\"dark\"");
///
/// let back: Theme = codec.decode_str(&text).unwrap();
/// assert_eq!(back, Theme::Dark);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
