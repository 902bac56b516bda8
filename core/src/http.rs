//! HTTP data types shared by the pipeline and transports.
//!
//! # Design
//! Requests and responses are plain data. `RequestInit` is the
//! `{headers, method, body}` container handed to a transport; it stays a
//! JSON object rather than a struct because client-level base-body defaults
//! are deep-merged into it and may contribute keys the pipeline does not
//! know about. Transports read the well-known keys through accessors.

use std::fmt;
use std::str::FromStr;
use std::string::FromUtf8Error;

use bytes::Bytes;
use futures::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::error::BoxError;
use serde_json::{Map, Value};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// GET and HEAD never carry a request body.
    pub fn allows_body(&self) -> bool {
        !matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a method name is not one of the supported verbs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "TRACE" => Ok(HttpMethod::Trace),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

/// The `{headers, method, body}` container passed to a transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestInit(Map<String, Value>);

impl RequestInit {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// The method named in the container. Falls back to GET when the key is
    /// missing or not a recognised verb.
    pub fn method(&self) -> HttpMethod {
        self.0
            .get("method")
            .and_then(Value::as_str)
            .and_then(|m| m.parse().ok())
            .unwrap_or(HttpMethod::Get)
    }

    /// Headers rendered as name/value pairs, in insertion order.
    pub fn headers(&self) -> Vec<(String, String)> {
        match self.0.get("headers") {
            Some(Value::Object(headers)) => headers
                .iter()
                .map(|(name, value)| (name.clone(), render_value(value)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The encoded body. Non-string values set by base-body defaults are
    /// rendered as JSON text.
    pub fn body(&self) -> Option<String> {
        match self.0.get("body") {
            None | Some(Value::Null) => None,
            Some(Value::String(body)) => Some(body.clone()),
            Some(other) => Some(other.to_string()),
        }
    }

    pub fn set_body(&mut self, body: Option<String>) {
        match body {
            Some(body) => {
                self.0.insert("body".to_string(), Value::String(body));
            }
            None => {
                self.0.remove("body");
            }
        }
    }
}

/// An HTTP response with a fully buffered body.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn text(&self) -> Result<String, FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }

    pub fn bytes(&self) -> Bytes {
        self.body.clone()
    }
}

/// A response whose head has arrived but whose body may still be in flight.
///
/// Transports return this as soon as the status line and headers are read,
/// so the status is known even if reading the body later stalls or fails.
pub struct StreamedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    body: BoxFuture<'static, Result<Bytes, BoxError>>,
}

impl StreamedResponse {
    pub fn new<B>(status: u16, headers: Vec<(String, String)>, body: B) -> Self
    where
        B: Future<Output = Result<Bytes, BoxError>> + Send + 'static,
    {
        Self {
            status,
            headers,
            body: body.boxed(),
        }
    }

    /// Wait for the rest of the body.
    pub async fn buffer(self) -> Result<HttpResponse, BoxError> {
        let body = self.body.await?;
        Ok(HttpResponse {
            status: self.status,
            headers: self.headers,
            body,
        })
    }
}

impl From<HttpResponse> for StreamedResponse {
    fn from(response: HttpResponse) -> Self {
        StreamedResponse::new(response.status, response.headers, future::ready(Ok(response.body)))
    }
}

impl fmt::Debug for StreamedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamedResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Render a dynamic value the way string interpolation would: strings
/// verbatim, arrays as comma-joined elements, everything else as JSON text.
pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render_value).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}
