//! Error types for the protocol layer.
//!
//! Each crate in Tileforge defines its own error enum. A `ProtocolError`
//! always means the client sent something we could not understand; the
//! game state was never touched.

/// Errors that can occur while decoding or validating client input.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing required field,
    /// or a field of the wrong type.
    #[cfg(feature = "json")]
    #[error("invalid request body: {0}")]
    Decode(serde_json::Error),

    /// The direction token is not one of `UP`, `DOWN`, `LEFT`, `RIGHT`.
    #[error("invalid direction {0:?}: expected one of UP, DOWN, LEFT, RIGHT")]
    InvalidDirection(String),

    /// A client-supplied game id is empty, too long, or contains
    /// characters outside `[A-Za-z0-9_-]`.
    #[error("invalid game id {0:?}")]
    InvalidId(String),
}
