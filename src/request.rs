use std::collections::BTreeMap;

use crate::{Form, Method, Query};

/// Body of a request.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    /// Structured body sent as `application/json`.
    Json(serde_json::Value),
    /// Multipart form; its boundary content type replaces the default one.
    Multipart(Form),
}

/// How a success response body is decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponseKind {
    /// JSON when the response says `application/json`, raw bytes otherwise.
    #[default]
    Auto,
    /// Always parse as JSON.
    Json,
    /// Always return raw bytes.
    Binary,
}

/// A single logical call, reissued unchanged on every retry.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub method: Method,
    /// Path relative to the base URL, without a leading `/`.
    pub endpoint: String,
    pub query: Query,
    pub body: Body,
    /// Headers added on top of the client's headers for this call only.
    pub headers: BTreeMap<String, String>,
    /// Per-attempt timeout override in milliseconds.
    pub timeout_ms: Option<u64>,
    pub response_kind: ResponseKind,
}

impl Request {
    pub fn new(method: Method, endpoint: &str) -> Self {
        Self {
            method,
            endpoint: format_endpoint(endpoint).to_owned(),
            query: Query::default(),
            body: Body::Empty,
            headers: BTreeMap::new(),
            timeout_ms: None,
            response_kind: ResponseKind::Auto,
        }
    }

    pub fn get(endpoint: &str) -> Self {
        Self::new(Method::Get, endpoint)
    }

    pub fn post(endpoint: &str) -> Self {
        Self::new(Method::Post, endpoint)
    }

    pub fn put(endpoint: &str) -> Self {
        Self::new(Method::Put, endpoint)
    }

    pub fn patch(endpoint: &str) -> Self {
        Self::new(Method::Patch, endpoint)
    }

    pub fn delete(endpoint: &str) -> Self {
        Self::new(Method::Delete, endpoint)
    }

    pub fn query(mut self, query: impl Into<Query>) -> Self {
        self.query = query.into();
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    pub fn form(mut self, form: Form) -> Self {
        self.body = Body::Multipart(form);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn response_kind(mut self, kind: ResponseKind) -> Self {
        self.response_kind = kind;
        self
    }
}

/// Strips one leading `/` from an endpoint.
pub fn format_endpoint(endpoint: &str) -> &str {
    endpoint.strip_prefix('/').unwrap_or(endpoint)
}

/// Joins a base URL and a normalized endpoint with exactly one `/`.
pub(crate) fn join_url(base_url: &str, endpoint: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if endpoint.is_empty() {
        base.to_owned()
    } else {
        format!("{base}/{endpoint}")
    }
}
