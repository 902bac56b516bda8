//! The network boundary.
//!
//! # Design
//! A `Transport` takes a URL and a `RequestInit` and returns a
//! `StreamedResponse` as soon as the status line and headers arrive; the
//! body is read later by the pipeline. Non-2xx statuses are responses, not
//! errors; only failures to obtain a response head should return `Err`.
//! Failures while reading the body belong to the body future. The pipeline
//! runs each call on its own task and never cancels it, so implementations
//! must not rely on being dropped when a request times out.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::http::{RequestInit, StreamedResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: String, init: RequestInit) -> Result<StreamedResponse, BoxError>;
}

/// Adapts an async closure into a [`Transport`]. The closure may answer with
/// a buffered `HttpResponse` or a `StreamedResponse`.
pub fn transport_fn<F, Fut, R>(f: F) -> FnTransport<F>
where
    F: Fn(String, RequestInit) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, BoxError>> + Send + 'static,
    R: Into<StreamedResponse> + Send + 'static,
{
    FnTransport(f)
}

/// Returned by [`transport_fn`].
#[derive(Clone)]
pub struct FnTransport<F>(F);

impl<F> fmt::Debug for FnTransport<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnTransport")
    }
}

#[async_trait]
impl<F, Fut, R> Transport for FnTransport<F>
where
    F: Fn(String, RequestInit) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, BoxError>> + Send + 'static,
    R: Into<StreamedResponse> + Send + 'static,
{
    async fn fetch(&self, url: String, init: RequestInit) -> Result<StreamedResponse, BoxError> {
        (self.0)(url, init).await.map(Into::into)
    }
}

pub use self::blocking::UreqTransport;

mod blocking {
    use bytes::Bytes;
    use tokio::sync::oneshot;
    use ureq::http::Response;
    use ureq::{Agent, Body, RequestBuilder};

    use super::*;
    use crate::http::HttpMethod;

    /// Transport backed by ureq's blocking agent, run on tokio's blocking
    /// pool.
    #[derive(Debug, Clone)]
    pub struct UreqTransport {
        agent: Agent,
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            // Statuses are reported as data; the pipeline never inspects them.
            let agent = Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl UreqTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_agent(agent: Agent) -> Self {
            Self { agent }
        }
    }

    #[async_trait]
    impl Transport for UreqTransport {
        async fn fetch(&self, url: String, init: RequestInit) -> Result<StreamedResponse, BoxError> {
            let agent = self.agent.clone();
            let (head_tx, head_rx) = oneshot::channel();
            let (body_tx, body_rx) = oneshot::channel();
            tokio::task::spawn_blocking(move || exchange(&agent, &url, &init, head_tx, body_tx));

            let (status, headers) = head_rx
                .await
                .map_err(|_| BoxError::from("transport stopped before a response arrived"))??;
            let body = async move {
                match body_rx.await {
                    Ok(body) => body,
                    Err(_) => Err(BoxError::from("transport stopped while reading the body")),
                }
            };
            Ok(StreamedResponse::new(status, headers, body))
        }
    }

    type Head = (u16, Vec<(String, String)>);

    fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    /// Send the request, hand the head back, then read the body. Stops early
    /// if nobody is waiting for the head any more.
    fn exchange(
        agent: &Agent,
        url: &str,
        init: &RequestInit,
        head_tx: oneshot::Sender<Result<Head, BoxError>>,
        body_tx: oneshot::Sender<Result<Bytes, BoxError>>,
    ) {
        let mut response = match send(agent, url, init) {
            Ok(response) => response,
            Err(e) => {
                let _ = head_tx.send(Err(e));
                return;
            }
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
            .collect();
        if head_tx.send(Ok((status, headers))).is_err() {
            return;
        }

        let body = response
            .body_mut()
            .read_to_vec()
            .map(Bytes::from)
            .map_err(BoxError::from);
        let _ = body_tx.send(body);
    }

    fn send(agent: &Agent, url: &str, init: &RequestInit) -> Result<Response<Body>, BoxError> {
        let headers = init.headers();
        let body = init.body();

        let without_body = match init.method() {
            HttpMethod::Get => Some(agent.get(url)),
            HttpMethod::Head => Some(agent.head(url)),
            HttpMethod::Delete => Some(agent.delete(url)),
            HttpMethod::Options => Some(agent.options(url)),
            HttpMethod::Trace => Some(agent.trace(url)),
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch => None,
        };

        let response = match without_body {
            Some(builder) => {
                let builder = with_headers(builder, &headers);
                match body {
                    Some(body) => builder.force_send_body().send(body.as_bytes())?,
                    None => builder.call()?,
                }
            }
            None => {
                let builder = match init.method() {
                    HttpMethod::Put => agent.put(url),
                    HttpMethod::Patch => agent.patch(url),
                    _ => agent.post(url),
                };
                let builder = with_headers(builder, &headers);
                match body {
                    Some(body) => builder.send(body.as_bytes())?,
                    None => builder.send_empty()?,
                }
            }
        };
        Ok(response)
    }
}
