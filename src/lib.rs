//! `nexray-http` is an async HTTP API client wrapper.
//!
//! A [`NexrayClient`] holds a base URL, default headers, a timeout and a retry
//! policy, and exposes verb methods returning either the decoded
//! [`Payload`] or a uniform [`ErrorEnvelope`]:
//! - [`NexrayClient::get`] / [`NexrayClient::delete`]
//! - [`NexrayClient::post`] / [`NexrayClient::put`] / [`NexrayClient::patch`]
//! - [`NexrayClient::post_form`] for multipart uploads
//! - [`NexrayClient::get_buffer`] for binary downloads

mod client;
mod config;
pub mod envelope;
mod error;
mod form;
mod params;
mod request;
pub mod retry;
mod types;

pub use client::NexrayClient;
pub use config::{ClientConfig, ConfigSnapshot};
pub use envelope::{normalize_error, ApiResult, ErrorEnvelope};
pub use error::NexrayError;
pub use form::{Form, FormValue};
pub use params::Query;
pub use request::{format_endpoint, Body, Request, ResponseKind};
pub use types::{Method, Payload};

pub type Result<T> = std::result::Result<T, NexrayError>;
