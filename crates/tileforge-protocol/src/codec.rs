//! Codec trait and implementations for request and response bodies.
//!
//! The server never calls serde directly; it goes through a [`Codec`] so
//! the body format can be swapped without touching the handlers.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust types to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// request handler for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// The `Content-Type` this codec produces.
    const CONTENT_TYPE: &'static str;

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

    /// Like [`decode`](Self::decode), but an empty (or all-whitespace)
    /// body yields `T::default()`.
    fn decode_or_default<T: DeserializeOwned + Default>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }
        self.decode(data)
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`. This is what the browser client
/// speaks.
///
/// ```rust
/// use tileforge_protocol::{Codec, JsonCodec, NewGameRequest};
///
/// let codec = JsonCodec;
/// let req: NewGameRequest = codec.decode(br#"{"size":5}"#).unwrap();
/// assert_eq!(req.size, Some(5));
///
/// let empty: NewGameRequest = codec.decode_or_default(b"").unwrap();
/// assert_eq!(empty.size, None);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    const CONTENT_TYPE: &'static str = "application/json";

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
