//! Error type surfaced by every `Fetcher` call.
//!
//! # Design
//! Timeouts, connection failures and decode failures all share one shape:
//! a human-readable message paired with the last HTTP status observed, or
//! [`NO_STATUS`] when the transport never produced a response. `ErrorKind`
//! lets callers branch without string matching. HTTP-level statuses (4xx,
//! 5xx) are never turned into errors here; they arrive as decoded data.

use thiserror::Error;

/// Status code reported when no response was observed.
pub const NO_STATUS: i32 = -1;

/// Boxed error used at the transport and decoder boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classification of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Nothing settled the request within its timeout window.
    Timeout,
    /// The transport failed before any response was received.
    Connection,
    /// A response arrived but its body could not be decoded.
    Parse,
    /// The request body could not be encoded as JSON.
    Serialization,
    /// Raised by caller code, typically an intercept hook.
    Custom,
}

/// The single error type returned by the pipeline.
#[derive(Debug, Error)]
#[error("{message} (status {status_code})")]
pub struct FetchError {
    kind: ErrorKind,
    message: String,
    status_code: i32,
    #[source]
    source: Option<BoxError>,
}

impl FetchError {
    /// Build a caller-defined error, e.g. from inside an intercept hook.
    pub fn new(message: impl Into<String>, status_code: i32) -> Self {
        Self {
            kind: ErrorKind::Custom,
            message: message.into(),
            status_code,
            source: None,
        }
    }

    pub fn timeout(status_code: i32) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            message: "request timed out".to_string(),
            status_code,
            source: None,
        }
    }

    pub fn connection(source: Option<BoxError>) -> Self {
        Self {
            kind: ErrorKind::Connection,
            message: "connection failed".to_string(),
            status_code: NO_STATUS,
            source,
        }
    }

    pub fn parse(status_code: i32, source: BoxError) -> Self {
        Self {
            kind: ErrorKind::Parse,
            message: "failed to parse response".to_string(),
            status_code,
            source: Some(source),
        }
    }

    pub fn serialization(source: serde_json::Error) -> Self {
        Self {
            kind: ErrorKind::Serialization,
            message: "failed to serialize request body".to_string(),
            status_code: NO_STATUS,
            source: Some(Box::new(source)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Last observed HTTP status, or [`NO_STATUS`].
    pub fn status_code(&self) -> i32 {
        self.status_code
    }

    /// Replace the message while keeping kind, status and source.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}
