use std::path::PathBuf;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum NexrayError {
    /// Network or request execution error from `reqwest`; no response was received.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Response received with a non-success status code.
    #[error("Request failed with status code {status}")]
    Http {
        status: u16,
        /// Raw response body, possibly JSON.
        body: Vec<u8>,
    },
    /// Request body could not be serialized to JSON.
    #[error("failed to encode request body: {0}")]
    Encode(serde_json::Error),
    /// Response body could not be decoded as expected.
    #[error("decode error: {0}")]
    Decode(String),
    /// Invalid client configuration (base URL, header names or values).
    #[error("configuration error: {0}")]
    Config(String),
    /// A local file referenced by a form field could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl NexrayError {
    /// HTTP status of the failure, `None` when no response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
