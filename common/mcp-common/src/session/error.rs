//! Errors at the inbound HTTP boundary
//!
//! Every variant is terminal for the single request that produced it and is
//! reported as a status code plus a short text body. None of them affect the
//! session itself.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Session ID required")]
    MissingSessionId,

    #[error("Session not found: {0}")]
    UnknownSession(String),

    #[error("Unsupported Media Type: application/json required")]
    UnsupportedMediaType,

    #[error("Invalid JSON: {0}")]
    MalformedMessage(#[source] serde_json::Error),

    #[error("Request Entity Too Large (limit {limit} bytes)")]
    PayloadTooLarge { limit: usize },

    #[error("Failed to read request body: {0}")]
    BodyRead(String),
}

impl TransportError {
    /// HTTP status reported for this error
    pub fn status(&self) -> StatusCode {
        match self {
            TransportError::MissingSessionId => StatusCode::BAD_REQUEST,
            TransportError::UnknownSession(_) => StatusCode::NOT_FOUND,
            TransportError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            TransportError::MalformedMessage(_) => StatusCode::BAD_REQUEST,
            TransportError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            TransportError::BodyRead(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for TransportError {
    fn into_response(self) -> Response {
        tracing::warn!("Rejected posted message: {}", self);
        (self.status(), self.to_string()).into_response()
    }
}
