use serde::de::DeserializeOwned;

use crate::{NexrayError, Result};

/// HTTP verb of a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub(crate) fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Decoded success payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Body of a response whose content type is JSON.
    Json(serde_json::Value),
    /// Raw body of any other response.
    Bytes(Vec<u8>),
}

impl Payload {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::Json(_) => None,
        }
    }

    /// Returns the payload as bytes, serializing JSON payloads.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Bytes(bytes) => bytes,
            Self::Json(value) => value.to_string().into_bytes(),
        }
    }

    /// Deserializes the payload into `T`.
    ///
    /// Byte payloads are parsed as JSON text.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            Self::Json(value) => serde_json::from_value(value)
                .map_err(|err| NexrayError::Decode(format!("unexpected JSON shape: {err}"))),
            Self::Bytes(bytes) => serde_json::from_slice(&bytes)
                .map_err(|err| NexrayError::Decode(format!("invalid JSON body: {err}"))),
        }
    }
}
