//! Uniform error envelope and the normalization of failures into it.

use serde::{Deserialize, Serialize};

use crate::NexrayError;

pub const INTERNAL_SERVER_ERROR_MESSAGE: &str =
    "500 Internal Server Error - Server encountered an error";
pub const BAD_REQUEST_MESSAGE: &str =
    "400 Bad Request - Invalid parameters or missing required fields";
pub const TIMEOUT_MESSAGE: &str = "Request timeout";
pub const CONNECT_MESSAGE: &str = "Network error - Cannot connect to server";
pub const NETWORK_MESSAGE: &str = "Network Error";

/// Result of every verb method: the payload, or the error envelope.
pub type ApiResult<T> = std::result::Result<T, ErrorEnvelope>;

/// Error shape returned to callers: `{"status": false, "author": ..., "error": ...}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{error}")]
pub struct ErrorEnvelope {
    /// Always `false`.
    pub status: bool,
    pub author: String,
    pub error: String,
}

impl ErrorEnvelope {
    pub fn new(author: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: false,
            author: author.into(),
            error: error.into(),
        }
    }
}

/// Converts any failure into an [`ErrorEnvelope`]. Never fails.
pub fn normalize_error(err: &NexrayError, author: &str) -> ErrorEnvelope {
    let message = match err {
        NexrayError::Http { status: 500, .. } => INTERNAL_SERVER_ERROR_MESSAGE.to_owned(),
        NexrayError::Http { status: 400, .. } => BAD_REQUEST_MESSAGE.to_owned(),
        NexrayError::Http { body, .. } => body_message(body).unwrap_or_else(|| err.to_string()),
        NexrayError::Transport(inner) => transport_message(inner).to_owned(),
        NexrayError::Encode(_)
        | NexrayError::Decode(_)
        | NexrayError::Config(_)
        | NexrayError::Io { .. } => err.to_string(),
    };
    ErrorEnvelope::new(author, message)
}

/// `message` field of a JSON error body, if the body is UTF-8 JSON carrying one.
fn body_message(body: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(body).ok()?;
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    value.get("message")?.as_str().map(str::to_owned)
}

fn transport_message(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        TIMEOUT_MESSAGE
    } else if err.is_connect() {
        CONNECT_MESSAGE
    } else {
        NETWORK_MESSAGE
    }
}
