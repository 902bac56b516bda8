//! Configurable async HTTP client core.
//!
//! # Overview
//! `Fetcher` turns per-call `RequestOptions` plus long-lived `ClientConfig`
//! defaults into a request, sends it through a pluggable `Transport`, races
//! it against a timeout and decodes the response according to a `DataType`.
//! Every failure comes back as one `FetchError` carrying a message and the
//! last observed status code.
//!
//! # Design
//! - Configuration layers are JSON mappings combined by `merge::merge`.
//! - URL composition and request assembly are pure functions
//!   (`url::build_url`, `request::assemble`) and are tested without I/O.
//! - The transport is a trait; `UreqTransport` is the default and tests
//!   swap in closures via `transport_fn`.
//! - Optional intercept hooks can rewrite the request, the result or the
//!   error. Missing hooks pass values through.
//! - HTTP error statuses are not errors here. Use `DataType::Origin` or a
//!   resolve hook to act on them.

pub mod client;
pub mod config;
pub mod error;
pub mod hooks;
pub mod http;
pub mod log;
pub mod merge;
pub mod request;
pub mod response;
mod settle;
pub mod transport;
pub mod url;

pub use client::{Fetcher, FetcherBuilder};
pub use config::ClientConfig;
pub use error::{ErrorKind, FetchError, NO_STATUS};
pub use hooks::PreparedRequest;
pub use http::{HttpMethod, HttpResponse, RequestInit, StreamedResponse};
pub use log::{DebugEvent, RequestLogger, TracingLogger};
pub use request::{EffectiveRequest, RequestOptions};
pub use response::{DataType, ResponseData};
pub use transport::{transport_fn, Transport, UreqTransport};
pub use url::PathId;
