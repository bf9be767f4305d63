use std::{collections::BTreeMap, fmt, path::Path, time::Duration};

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use tokio::time::sleep;

use crate::{
    envelope::{normalize_error, ApiResult, ErrorEnvelope},
    request::{join_url, Body, Request, ResponseKind},
    retry::{RetryPolicy, RetryState},
    ClientConfig, ConfigSnapshot, Form, Method, NexrayError, Payload, Query, Result,
};

#[derive(Clone)]
/// HTTP API client with default headers, base URL, timeout and retry behavior.
///
/// Every clone owns its own configuration; setters on one clone never affect another.
pub struct NexrayClient {
    http: reqwest::Client,
    config: ClientConfig,
    headers: HeaderMap,
}

impl fmt::Debug for NexrayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: BTreeMap<&str, &str> = self
            .headers
            .iter()
            .map(|(name, value)| {
                let shown = if *name == header::AUTHORIZATION {
                    "<redacted>"
                } else {
                    value.to_str().unwrap_or("<binary>")
                };
                (name.as_str(), shown)
            })
            .collect();
        f.debug_struct("NexrayClient")
            .field("config", &self.config)
            .field("headers", &headers)
            .finish()
    }
}

impl NexrayClient {
    /// Creates a client from a configuration value.
    ///
    /// Fails when a default header name or value is not valid HTTP header text.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let headers = build_headers(&config)?;
        Ok(Self {
            http: reqwest::Client::new(),
            config,
            headers,
        })
    }

    /// Creates a client from a JSON configuration file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nexray_http::NexrayClient;
    ///
    /// let client = NexrayClient::from_config_file("config.json").expect("valid config");
    /// ```
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(ClientConfig::from_path(path)?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends a GET request with query parameters.
    pub async fn get(&self, endpoint: &str, query: impl Into<Query>) -> ApiResult<Payload> {
        self.send(Request::get(endpoint).query(query)).await
    }

    /// Downloads a binary body.
    ///
    /// Failures come back as an [`ErrorEnvelope`], like every other verb.
    pub async fn get_buffer(&self, endpoint: &str, query: impl Into<Query>) -> ApiResult<Vec<u8>> {
        let request = Request::get(endpoint)
            .query(query)
            .response_kind(ResponseKind::Binary);
        self.send(request).await.map(Payload::into_bytes)
    }

    /// Sends a POST request with a JSON body.
    pub async fn post<B>(&self, endpoint: &str, body: &B) -> ApiResult<Payload>
    where
        B: Serialize + ?Sized,
    {
        self.send_json(Method::Post, endpoint, body).await
    }

    /// Sends a POST request with a multipart form body.
    ///
    /// Fields added without a value are not submitted.
    pub async fn post_form(&self, endpoint: &str, form: Form) -> ApiResult<Payload> {
        self.send(Request::post(endpoint).form(form)).await
    }

    /// Sends a PUT request with a JSON body.
    pub async fn put<B>(&self, endpoint: &str, body: &B) -> ApiResult<Payload>
    where
        B: Serialize + ?Sized,
    {
        self.send_json(Method::Put, endpoint, body).await
    }

    /// Sends a PATCH request with a JSON body.
    pub async fn patch<B>(&self, endpoint: &str, body: &B) -> ApiResult<Payload>
    where
        B: Serialize + ?Sized,
    {
        self.send_json(Method::Patch, endpoint, body).await
    }

    /// Sends a DELETE request with query parameters.
    pub async fn delete(&self, endpoint: &str, query: impl Into<Query>) -> ApiResult<Payload> {
        self.send(Request::delete(endpoint).query(query)).await
    }

    /// Sends a fully built request, converting any failure into an [`ErrorEnvelope`].
    pub async fn send(&self, request: Request) -> ApiResult<Payload> {
        self.execute(request)
            .await
            .map_err(|err| self.error_envelope(&err))
    }

    /// Sends a fully built request, retrying transient failures.
    ///
    /// Unlike [`NexrayClient::send`], the terminal failure is returned as is.
    pub async fn execute(&self, request: Request) -> Result<Payload> {
        let policy = RetryPolicy::from_config(&self.config);
        let mut state = policy.begin();
        loop {
            let err = match self.dispatch(&request).await {
                Ok(payload) => return Ok(payload),
                Err(err) => err,
            };

            if is_retryable_failure(&err) && policy.should_retry(&state, err.status()) {
                let delay = policy.backoff(state.retry_count);

                #[cfg(feature = "tracing")]
                tracing::debug!(
                    endpoint = %request.endpoint,
                    status = ?err.status(),
                    retry = state.retry_count + 1,
                    max_retries = state.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "retrying request"
                );

                sleep(delay).await;
                state.retry_count += 1;
                continue;
            }

            log_terminal_failure(&request, &state, &err);
            return Err(err);
        }
    }

    /// Converts a failure into the envelope carrying this client's author tag.
    pub fn error_envelope(&self, err: &NexrayError) -> ErrorEnvelope {
        normalize_error(err, &self.config.author)
    }

    /// Returns the configured message for `status`, falling back to `"Error <status>"`.
    pub fn error_message(&self, status: u16) -> String {
        self.config.error_message(status)
    }

    /// Sends `Authorization: Bearer <token>` with every subsequent request.
    pub fn set_auth_token(&mut self, token: &str) -> Result<&mut Self> {
        let authorization = normalize_bearer_authorization(token);
        let mut value = HeaderValue::from_str(&authorization).map_err(|_| {
            NexrayError::Config("auth token is not a valid header value".to_owned())
        })?;
        value.set_sensitive(true);
        self.headers.insert(header::AUTHORIZATION, value);
        Ok(self)
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        let (name, value) = parse_header(name, value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn remove_header(&mut self, name: &str) -> &mut Self {
        if let Ok(name) = HeaderName::from_bytes(name.as_bytes()) {
            self.headers.remove(name);
        }
        self
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) -> &mut Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Sets the per-attempt timeout in milliseconds; `0` disables it.
    pub fn set_timeout(&mut self, timeout_ms: u64) -> &mut Self {
        self.config.timeout_ms = timeout_ms;
        self
    }

    pub fn set_max_retries(&mut self, max_retries: u32) -> &mut Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Returns the current configuration together with the active headers.
    pub fn get_config(&self) -> ConfigSnapshot {
        let current_headers = self
            .headers
            .iter()
            .map(|(name, value)| {
                let value = match value.to_str() {
                    Ok(text) => text.to_owned(),
                    Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
                };
                (name.as_str().to_owned(), value)
            })
            .collect();
        ConfigSnapshot {
            config: self.config.clone(),
            current_headers,
        }
    }

    async fn send_json<B>(&self, method: Method, endpoint: &str, body: &B) -> ApiResult<Payload>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)
            .map_err(|err| self.error_envelope(&NexrayError::Encode(err)))?;
        self.send(Request::new(method, endpoint).json(body)).await
    }

    /// Performs one attempt.
    async fn dispatch(&self, request: &Request) -> Result<Payload> {
        if self.config.base_url.trim().is_empty() {
            return Err(NexrayError::Config("base URL is not configured".to_owned()));
        }
        let url = join_url(&self.config.base_url, &request.endpoint);
        let url = reqwest::Url::parse(&url)
            .map_err(|err| NexrayError::Config(format!("invalid URL '{url}': {err}")))?;

        let mut headers = self.headers.clone();
        for (name, value) in &request.headers {
            let (name, value) = parse_header(name, value)?;
            headers.insert(name, value);
        }

        let mut builder = self.http.request(request.method.as_reqwest(), url);
        let timeout_ms = request.timeout_ms.unwrap_or(self.config.timeout_ms);
        if timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query.0);
        }
        builder = match &request.body {
            Body::Empty => builder.headers(headers),
            Body::Json(value) => builder.headers(headers).json(value),
            Body::Multipart(form) => {
                // reqwest appends its own boundary content type.
                headers.remove(header::CONTENT_TYPE);
                builder.headers(headers).multipart(form.to_multipart().await?)
            }
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(method = ?request.method, endpoint = %request.endpoint, "sending request");

        let response = builder.send().await.map_err(NexrayError::Transport)?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        let body = response.bytes().await.map_err(NexrayError::Transport)?;

        if status.as_u16() >= 400 {
            return Err(NexrayError::Http {
                status: status.as_u16(),
                body: body.to_vec(),
            });
        }

        decode_payload(request.response_kind, &content_type, &body)
    }
}

/// Only failures that reached or tried to reach the server are worth repeating.
fn is_retryable_failure(err: &NexrayError) -> bool {
    matches!(err, NexrayError::Transport(_) | NexrayError::Http { .. })
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn log_terminal_failure(request: &Request, state: &RetryState, err: &NexrayError) {
    #[cfg(feature = "tracing")]
    tracing::warn!(
        endpoint = %request.endpoint,
        retries = state.retry_count,
        elapsed_ms = u64::try_from(state.elapsed().as_millis()).unwrap_or(u64::MAX),
        error = %err,
        "request failed"
    );
}

fn decode_payload(kind: ResponseKind, content_type: &str, body: &[u8]) -> Result<Payload> {
    match kind {
        ResponseKind::Binary => Ok(Payload::Bytes(body.to_vec())),
        ResponseKind::Json => parse_json(body),
        ResponseKind::Auto if content_type.contains("application/json") => parse_json(body),
        ResponseKind::Auto => Ok(Payload::Bytes(body.to_vec())),
    }
}

fn parse_json(body: &[u8]) -> Result<Payload> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Payload::Json(serde_json::Value::Null));
    }
    serde_json::from_slice(body)
        .map(Payload::Json)
        .map_err(|err| NexrayError::Decode(format!("invalid JSON response: {err}")))
}

fn build_headers(config: &ClientConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.default_headers {
        let (name, value) = parse_header(name, value)?;
        headers.insert(name, value);
    }
    if !config.user_agent.is_empty() {
        let (name, value) = parse_header(header::USER_AGENT.as_str(), &config.user_agent)?;
        headers.insert(name, value);
    }
    Ok(headers)
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| NexrayError::Config(format!("invalid header name '{name}'")))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|_| NexrayError::Config(format!("invalid value for header '{name}'")))?;
    Ok((header_name, header_value))
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{decode_payload, normalize_bearer_authorization, NexrayClient};
    use crate::{ClientConfig, Payload, ResponseKind};

    fn client() -> NexrayClient {
        NexrayClient::new(ClientConfig::new("https://api.example.test")).expect("valid config")
    }

    #[test]
    fn normalize_bearer_adds_prefix_when_missing() {
        assert_eq!(normalize_bearer_authorization("abc123"), "Bearer abc123");
    }

    #[test]
    fn normalize_bearer_keeps_existing_prefix() {
        assert_eq!(
            normalize_bearer_authorization("bEaReR abc123"),
            "bEaReR abc123"
        );
    }

    #[test]
    fn debug_redacts_authorization_value() {
        let mut client = client();
        client.set_auth_token("secret-token").unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn default_headers_and_user_agent_are_active() {
        let snapshot = client().get_config();
        assert_eq!(snapshot.current_headers["content-type"], "application/json");
        assert_eq!(snapshot.current_headers["accept"], "application/json");
        assert!(snapshot.current_headers["user-agent"].starts_with("nexray-http/"));
    }

    #[test]
    fn set_base_url_is_reflected_and_idempotent() {
        let mut client = client();
        client.set_base_url("https://other.example.test/v2");
        let first = client.get_config();
        client.set_base_url("https://other.example.test/v2");
        let second = client.get_config();
        assert_eq!(first.config.base_url, "https://other.example.test/v2");
        assert_eq!(first, second);
    }

    #[test]
    fn setters_chain_and_mutate_headers() {
        let mut client = client();
        client
            .set_header("X-Api-Key", "k1")
            .unwrap()
            .set_timeout(1_500)
            .set_max_retries(0)
            .remove_header("accept");
        let snapshot = client.get_config();
        assert_eq!(snapshot.current_headers["x-api-key"], "k1");
        assert!(!snapshot.current_headers.contains_key("accept"));
        assert_eq!(snapshot.config.timeout_ms, 1_500);
        assert_eq!(snapshot.config.max_retries, 0);
    }

    #[test]
    fn invalid_header_is_rejected() {
        let mut client = client();
        assert!(client.set_header("bad header", "v").is_err());
        assert!(client.set_header("X-Ok", "line\nbreak").is_err());
        assert!(client.set_auth_token("tok\nen").is_err());
    }

    #[test]
    fn clones_do_not_share_configuration() {
        let original = client();
        let mut copy = original.clone();
        copy.set_base_url("https://copy.example.test");
        assert_eq!(original.config().base_url, "https://api.example.test");
    }

    #[test]
    fn error_message_lookup() {
        let client = client();
        assert_eq!(client.error_message(404), "Not Found");
        assert_eq!(client.error_message(599), "Error 599");
    }

    #[test]
    fn payload_branches_on_content_type() {
        let json_type = "application/json; charset=utf-8";
        let json = decode_payload(ResponseKind::Auto, json_type, br#"{"a":1}"#).unwrap();
        let bytes = decode_payload(ResponseKind::Auto, "image/png", &[0x89, 0x50]).unwrap();
        let forced = decode_payload(ResponseKind::Binary, "application/json", b"{}").unwrap();
        assert_eq!(json, Payload::Json(json!({"a": 1})));
        assert_eq!(bytes, Payload::Bytes(vec![0x89, 0x50]));
        assert_eq!(forced, Payload::Bytes(b"{}".to_vec()));
    }

    #[test]
    fn malformed_json_is_decode_error_and_empty_is_null() {
        let err = decode_payload(ResponseKind::Json, "", b"{oops").unwrap_err();
        assert!(matches!(err, crate::NexrayError::Decode(_)));
        let empty = decode_payload(ResponseKind::Auto, "application/json", b"").unwrap();
        assert_eq!(empty, Payload::Json(serde_json::Value::Null));
    }
}
