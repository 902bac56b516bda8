//! Debug output for the request pipeline.
//!
//! The client owns a `RequestLogger` and only calls it when the effective
//! debug flag of a call is set. `TracingLogger` forwards to `tracing` under
//! the `fetcher` target; tests and embedders can inject their own.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::FetchError;
use crate::request::RequestOptions;
use crate::response::ResponseData;

/// One step of a request worth logging.
#[derive(Debug, Clone, Copy)]
pub enum DebugEvent<'a> {
    /// Caller options, before anything is merged.
    Request(&'a RequestOptions),
    /// The `{headers, method, body}` container before the base body is merged in.
    OriginBody(&'a Map<String, Value>),
    /// The container after merging.
    MergedBody(&'a Map<String, Value>),
    Url(&'a str),
    Status(u16),
    Result(&'a ResponseData),
    Error(&'a FetchError),
}

pub trait RequestLogger: Send + Sync {
    fn log(&self, event: DebugEvent<'_>);
}

/// Default logger backed by `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl RequestLogger for TracingLogger {
    fn log(&self, event: DebugEvent<'_>) {
        match event {
            DebugEvent::Request(options) => {
                tracing::debug!(target: "fetcher", request = %Json(options), "fetcher request")
            }
            DebugEvent::OriginBody(body) => {
                tracing::debug!(target: "fetcher", body = %Json(body), "fetcher origin body")
            }
            DebugEvent::MergedBody(body) => {
                tracing::debug!(target: "fetcher", body = %Json(body), "fetcher merged body")
            }
            DebugEvent::Url(url) => tracing::debug!(target: "fetcher", url, "fetcher url"),
            DebugEvent::Status(status) => tracing::debug!(target: "fetcher", status, "fetcher status"),
            DebugEvent::Result(result) => tracing::debug!(target: "fetcher", ?result, "fetcher result"),
            DebugEvent::Error(error) => {
                tracing::warn!(
                    target: "fetcher",
                    status = error.status_code(),
                    error = %error,
                    "fetcher error"
                )
            }
        }
    }
}

/// Displays a serializable value as compact JSON.
struct Json<'a, T: ?Sized>(&'a T);

impl<T: serde::Serialize + ?Sized> fmt::Display for Json<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self.0) {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str("<unserializable>"),
        }
    }
}
