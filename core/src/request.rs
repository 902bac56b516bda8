//! Per-call request options and assembly of the effective request.
//!
//! # Design
//! `RequestOptions` is what a caller builds for one call; any field left
//! unset falls back to the client's `ClientConfig`. `assemble` resolves every
//! optional into an `EffectiveRequest` without touching the caller's value.
//! The transport container is built as `{headers, method, body}` and then
//! deep-merged on top of the base body, so per-call values win.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::error::FetchError;
use crate::http::{HttpMethod, RequestInit};
use crate::log::{DebugEvent, RequestLogger};
use crate::merge::merge;
use crate::response::DataType;
use crate::url::{build_url, PathId};

/// Options for a single request. All fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    pub path: Option<String>,
    pub path_id: Option<PathId>,
    pub query: Map<String, Value>,
    pub headers: Map<String, Value>,
    /// Structured body, sent as JSON text.
    pub body: Option<Value>,
    /// Pre-encoded body. Replaces `body` after merging, skipping JSON
    /// encoding.
    pub raw_body: Option<String>,
    pub method: Option<HttpMethod>,
    pub timeout_millis: Option<u64>,
    pub data_type: Option<DataType>,
    pub debug: Option<bool>,
    /// Overrides `ClientConfig::base_url` for this call.
    pub base_url: Option<String>,
    /// Overrides `ClientConfig::base_body` for this call.
    pub base_body: Option<Map<String, Value>>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn path_id(mut self, id: impl Into<PathId>) -> Self {
        self.path_id = Some(id.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach any serializable value as the JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, FetchError> {
        self.body = Some(serde_json::to_value(body).map_err(FetchError::serialization)?);
        Ok(self)
    }

    pub fn raw_body(mut self, body: impl Into<String>) -> Self {
        self.raw_body = Some(body.into());
        self
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn timeout_millis(mut self, millis: u64) -> Self {
        self.timeout_millis = Some(millis);
        self
    }

    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = Some(enabled);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn base_body(mut self, base_body: Map<String, Value>) -> Self {
        self.base_body = Some(base_body);
        self
    }
}

impl From<&str> for RequestOptions {
    fn from(path: &str) -> Self {
        RequestOptions::new().path(path)
    }
}

impl From<String> for RequestOptions {
    fn from(path: String) -> Self {
        RequestOptions::new().path(path)
    }
}

/// A path plus options; the path replaces `options.path`.
impl From<(&str, RequestOptions)> for RequestOptions {
    fn from((path, options): (&str, RequestOptions)) -> Self {
        options.path(path)
    }
}

impl From<(String, RequestOptions)> for RequestOptions {
    fn from((path, options): (String, RequestOptions)) -> Self {
        options.path(path)
    }
}

/// Fully resolved request, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveRequest {
    pub method: HttpMethod,
    pub url: String,
    pub init: RequestInit,
    pub timeout: Duration,
    pub data_type: DataType,
    pub debug: bool,
}

/// Resolve `options` against `config`.
pub fn assemble(config: &ClientConfig, options: &RequestOptions) -> Result<EffectiveRequest, FetchError> {
    assemble_logged(config, options, None)
}

pub(crate) fn assemble_logged(
    config: &ClientConfig,
    options: &RequestOptions,
    logger: Option<&dyn RequestLogger>,
) -> Result<EffectiveRequest, FetchError> {
    let method = options.method.unwrap_or(HttpMethod::Get);

    let body = match &options.body {
        Some(body) if method.allows_body() => {
            Some(serde_json::to_string(body).map_err(FetchError::serialization)?)
        }
        _ => None,
    };

    let mut container = Map::new();
    container.insert("headers".to_string(), Value::Object(options.headers.clone()));
    container.insert("method".to_string(), Value::String(method.as_str().to_string()));
    container.insert("body".to_string(), body.map_or(Value::Null, Value::String));
    if let Some(logger) = logger {
        logger.log(DebugEvent::OriginBody(&container));
    }

    let base_body = options.base_body.as_ref().unwrap_or(&config.base_body);
    let merged = merge(Map::new(), [base_body, &container]);
    if let Some(logger) = logger {
        logger.log(DebugEvent::MergedBody(&merged));
    }

    let mut init = RequestInit::from_map(merged);
    if !method.allows_body() {
        init.set_body(None);
    } else if let Some(raw) = &options.raw_body {
        init.set_body(Some(raw.clone()));
    }

    let base_url = options.base_url.as_deref().unwrap_or(&config.base_url);
    let url = build_url(
        base_url,
        options.path.as_deref().unwrap_or_default(),
        options.path_id.as_ref(),
        Some(&options.query),
    );

    Ok(EffectiveRequest {
        method,
        url,
        init,
        timeout: Duration::from_millis(options.timeout_millis.unwrap_or(config.timeout_millis)),
        data_type: options.data_type.unwrap_or(config.data_type),
        debug: options.debug.unwrap_or(config.debug),
    })
}
