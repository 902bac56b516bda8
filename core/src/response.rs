//! Response decoding.
//!
//! `resolve` picks a decoder from the declared [`DataType`]. A failure here
//! happens after a status was observed, which is what lets the pipeline
//! report it as a parse failure rather than a connection failure.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BoxError;
use crate::http::HttpResponse;

/// How a response body is decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    Json,
    Text,
    Blob,
    /// Hand back the raw response without decoding.
    Origin,
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    Json(Value),
    Text(String),
    Blob(Bytes),
    Origin(HttpResponse),
}

impl ResponseData {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseData::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ResponseData::Blob(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn into_origin(self) -> Option<HttpResponse> {
        match self {
            ResponseData::Origin(response) => Some(response),
            _ => None,
        }
    }

    /// Deserialize a JSON payload into `T`.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        match self {
            ResponseData::Json(value) => serde_json::from_value(value),
            ResponseData::Text(text) => serde_json::from_str(&text),
            ResponseData::Blob(bytes) => serde_json::from_slice(&bytes),
            ResponseData::Origin(response) => serde_json::from_slice(&response.body),
        }
    }
}

/// Decode `response` according to `data_type`.
pub fn resolve(response: HttpResponse, data_type: DataType) -> Result<ResponseData, BoxError> {
    Ok(match data_type {
        DataType::Json => ResponseData::Json(response.json()?),
        DataType::Text => ResponseData::Text(response.text()?),
        DataType::Blob => ResponseData::Blob(response.bytes()),
        DataType::Origin => ResponseData::Origin(response),
    })
}
