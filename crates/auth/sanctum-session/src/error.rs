use reqwest::StatusCode;
use sanctum_auth::AuthError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the session manager
#[derive(Debug, Error)]
pub enum SessionError {
    /// Network-level failure (connect, TLS, body read)
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// Non-success HTTP status returned by the backend
    #[error("API error ({}): {}", .0.status_code, .0.message)]
    Api(ApiErrorObject),

    /// Configuration error (missing route, unusable storage)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Response body could not be interpreted
    #[error("Serialization error: {0}")]
    Serde(String),

    /// Credential storage failed after startup
    #[error("Credential storage error: {0}")]
    Storage(#[from] AuthError),

    /// A requested status/user pair breaks the session invariant
    #[error("Invalid session: {0}")]
    InvalidSession(String),
}

/// Error body returned by the backend.
///
/// Laravel answers with `{"message": "...", "errors": {...}}`; other backends
/// may send plain text, which lands in `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorObject {
    /// HTTP status code
    #[serde(default)]
    pub status_code: u16,
    /// Human-readable error message
    #[serde(default)]
    pub message: String,
    /// Field-level validation errors, when the backend sends them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
}

impl SessionError {
    /// HTTP status carried by this error, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(obj) => Some(obj.status_code),
            Self::Reqwest(e) => e.status().map(|s| s.as_u16()),
            Self::Config(_) | Self::Serde(_) | Self::Storage(_) | Self::InvalidSession(_) => None,
        }
    }

    /// Whether the backend answered 401 Unauthorized
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }
}

/// Maps a serde deserialization error to a `SessionError` with context
#[must_use]
pub fn map_deser(e: &serde_json::Error, body: &[u8]) -> SessionError {
    let snippet = String::from_utf8_lossy(&body[..body.len().min(400)]).to_string();
    SessionError::Serde(format!("{e}: {snippet}"))
}

/// Deserializes an API error from the response body
///
/// Attempts to parse the error as JSON, falling back to plain text on failure.
#[must_use]
pub fn deserialize_api_error(status: StatusCode, body: &[u8]) -> SessionError {
    let status_code = status.as_u16();

    if let Ok(mut obj) = serde_json::from_slice::<ApiErrorObject>(body) {
        obj.status_code = status_code;
        if obj.message.is_empty() {
            obj.message = status.canonical_reason().unwrap_or_default().to_string();
        }
        return SessionError::Api(obj);
    }

    // Plain-text or HTML error pages; cap body to avoid log/memory bloat
    let text = String::from_utf8_lossy(&body[..body.len().min(400)]).trim().to_string();
    SessionError::Api(ApiErrorObject {
        status_code,
        message: if text.is_empty() {
            status.canonical_reason().unwrap_or_default().to_string()
        } else {
            text
        },
        errors: None,
    })
}
