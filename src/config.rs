use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::{NexrayError, Result};

/// Client configuration: base URL, timeout, retry behavior and default headers.
///
/// Field names follow the JSON configuration file (`baseURL`, `maxRetries`,
/// `retryDelay`, ...). Keys missing from the file take their default values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Base URL every endpoint is resolved against.
    #[serde(rename = "baseURL", alias = "baseUrl")]
    pub base_url: String,
    /// Per-attempt timeout in milliseconds. `0` means no timeout.
    #[serde(rename = "timeout")]
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Base retry backoff in milliseconds, doubled on every retry.
    #[serde(rename = "retryDelay")]
    pub retry_delay_ms: u64,
    /// Optional ceiling for a single backoff delay, in milliseconds.
    ///
    /// `None` leaves the exponential backoff uncapped.
    #[serde(rename = "maxRetryDelay", skip_serializing_if = "Option::is_none")]
    pub max_retry_delay_ms: Option<u64>,
    /// Status codes that trigger a retry.
    pub retry_status_codes: Vec<u16>,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Author tag carried by every error envelope.
    pub author: String,
    /// Human readable messages per status code.
    pub error_messages: BTreeMap<u16, String>,
    /// Headers sent with every request.
    pub default_headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_ms: 30_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
            max_retry_delay_ms: None,
            retry_status_codes: vec![408, 429, 500, 502, 503, 504],
            user_agent: concat!("nexray-http/", env!("CARGO_PKG_VERSION")).to_owned(),
            author: "nexray".to_owned(),
            error_messages: [
                (400, "Bad Request"),
                (401, "Unauthorized"),
                (403, "Forbidden"),
                (404, "Not Found"),
                (408, "Request Timeout"),
                (429, "Too Many Requests"),
                (500, "Internal Server Error"),
                (502, "Bad Gateway"),
                (503, "Service Unavailable"),
                (504, "Gateway Timeout"),
            ]
            .into_iter()
            .map(|(status, message)| (status, message.to_owned()))
            .collect(),
            default_headers: [
                ("Content-Type", "application/json"),
                ("Accept", "application/json"),
            ]
            .into_iter()
            .map(|(name, value)| (name.to_owned(), value.to_owned()))
            .collect(),
        }
    }
}

impl ClientConfig {
    /// Default configuration pointed at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Parses a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|err| NexrayError::Config(format!("invalid configuration JSON: {err}")))
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| NexrayError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Returns the configured message for `status`, falling back to `"Error <status>"`.
    pub fn error_message(&self, status: u16) -> String {
        self.error_messages
            .get(&status)
            .cloned()
            .unwrap_or_else(|| format!("Error {status}"))
    }
}

/// Point-in-time view of a client's configuration and active headers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    #[serde(flatten)]
    pub config: ClientConfig,
    /// Headers currently applied to every request.
    pub current_headers: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::ClientConfig;

    #[test]
    fn parses_original_key_names() {
        let config = ClientConfig::from_json_str(
            r#"{
                "baseURL": "https://api.example.test/v1",
                "timeout": 5000,
                "maxRetries": 2,
                "retryDelay": 100,
                "retryStatusCodes": [502, 503],
                "userAgent": "demo/1.0",
                "author": "demo",
                "errorMessages": { "404": "Nothing here" },
                "defaultHeaders": { "X-Client": "demo" }
            }"#,
        )
        .expect("config must parse");

        assert_eq!(config.base_url, "https://api.example.test/v1");
        assert_eq!(config.timeout_ms, 5_000);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_delay_ms, 100);
        assert_eq!(config.retry_status_codes, vec![502, 503]);
        assert_eq!(config.error_message(404), "Nothing here");
        assert_eq!(config.default_headers["X-Client"], "demo");
        assert_eq!(config.max_retry_delay_ms, None);
    }

    #[test]
    fn missing_keys_take_defaults() {
        let config = ClientConfig::from_json_str(r#"{ "baseUrl": "http://localhost" }"#).unwrap();
        let defaults = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost");
        assert_eq!(config.max_retries, defaults.max_retries);
        assert_eq!(config.default_headers, defaults.default_headers);
    }

    #[test]
    fn error_message_falls_back_to_status() {
        let config = ClientConfig::default();
        assert_eq!(config.error_message(404), "Not Found");
        assert_eq!(config.error_message(418), "Error 418");
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(ClientConfig::from_json_str("{ not json").is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ClientConfig::from_path("/nonexistent/nexray-config.json").unwrap_err();
        assert!(matches!(err, crate::NexrayError::Io { .. }));
    }
}
