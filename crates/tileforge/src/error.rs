//! Unified error type for the Tileforge server.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tileforge_protocol::ProtocolError;
use tileforge_session::SessionError;

/// Top-level error that wraps all crate-specific errors.
///
/// Handlers return this single type; the `#[from]` conversions let `?`
/// lift protocol and session errors straight into it. Turning it into a
/// response picks the status code and sends the `Display` text as a
/// plain-text body.
#[derive(Debug, thiserror::Error)]
pub enum TileforgeError {
    /// The client sent something unreadable (body, direction, or id).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session operation failed (bad size, unknown game, game ended).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Binding or serving the socket, or reading a config file, failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for [`ServerConfig`](crate::ServerConfig).
    #[error("invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The config parsed but its values do not fit together.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl TileforgeError {
    /// The HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Protocol(ProtocolError::Encode(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Protocol(_) => StatusCode::BAD_REQUEST,
            Self::Session(err) => match err {
                SessionError::InvalidSize { .. } => StatusCode::BAD_REQUEST,
                SessionError::NotFound(_) => StatusCode::NOT_FOUND,
                SessionError::MoveRejected { .. } => StatusCode::CONFLICT,
                SessionError::CapacityExceeded(_) => StatusCode::SERVICE_UNAVAILABLE,
                SessionError::Board(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Io(_) | Self::ConfigParse(_) | Self::InvalidConfig(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for TileforgeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(error = %self, %status, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}
