//! Request execution pipeline and the per-verb facade.
//!
//! # Design
//! `Fetcher` holds a `ClientConfig`, a transport, optional intercept hooks
//! and a debug logger. `execute` resolves the call's options, then races the
//! transport against a timer. Both racers run as tokio tasks sharing a
//! `Settlement`; whichever claims it first produces the outcome. The status
//! is recorded as soon as the response head arrives, so a timeout that fires
//! while the body is still being read reports it. The losing transport call
//! is not aborted, its result is simply dropped. The timer is aborted once
//! the call settles or the caller drops the future.
//!
//! Hooks are set through `&mut self` and only read during execution.

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::error::FetchError;
use crate::hooks::{Hooks, PreparedRequest};
use crate::http::{HttpMethod, RequestInit, StreamedResponse};
use crate::log::{DebugEvent, RequestLogger, TracingLogger};
use crate::request::{assemble_logged, RequestOptions};
use crate::response::{resolve, DataType, ResponseData};
use crate::settle::Settlement;
use crate::transport::{Transport, UreqTransport};

type Outcome = Result<ResponseData, FetchError>;

/// Configurable HTTP client.
#[derive(Clone)]
pub struct Fetcher {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    logger: Arc<dyn RequestLogger>,
    hooks: Hooks,
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("config", &self.config)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Client over the default ureq transport.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::default())
    }

    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
            logger: Arc::new(TracingLogger),
            hooks: Hooks::default(),
        }
    }

    pub fn builder() -> FetcherBuilder {
        FetcherBuilder::default()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn set_before_request<F>(&mut self, hook: F)
    where
        F: Fn(PreparedRequest) -> PreparedRequest + Send + Sync + 'static,
    {
        self.hooks.before_request = Some(Arc::new(hook));
    }

    pub fn set_on_resolve<F>(&mut self, hook: F)
    where
        F: Fn(ResponseData) -> Result<ResponseData, FetchError> + Send + Sync + 'static,
    {
        self.hooks.on_resolve = Some(Arc::new(hook));
    }

    pub fn set_on_reject<F>(&mut self, hook: F)
    where
        F: Fn(FetchError) -> FetchError + Send + Sync + 'static,
    {
        self.hooks.on_reject = Some(Arc::new(hook));
    }

    pub fn clear_hooks(&mut self) {
        self.hooks = Hooks::default();
    }

    pub async fn get(&self, request: impl Into<RequestOptions>) -> Outcome {
        self.execute(without_body(request.into()).method(HttpMethod::Get)).await
    }

    pub async fn head(&self, request: impl Into<RequestOptions>) -> Outcome {
        self.execute(without_body(request.into()).method(HttpMethod::Head)).await
    }

    pub async fn post(&self, request: impl Into<RequestOptions>) -> Outcome {
        self.execute(request.into().method(HttpMethod::Post)).await
    }

    pub async fn put(&self, request: impl Into<RequestOptions>) -> Outcome {
        self.execute(request.into().method(HttpMethod::Put)).await
    }

    pub async fn patch(&self, request: impl Into<RequestOptions>) -> Outcome {
        self.execute(request.into().method(HttpMethod::Patch)).await
    }

    pub async fn delete(&self, request: impl Into<RequestOptions>) -> Outcome {
        self.execute(request.into().method(HttpMethod::Delete)).await
    }

    pub async fn options(&self, request: impl Into<RequestOptions>) -> Outcome {
        self.execute(request.into().method(HttpMethod::Options)).await
    }

    pub async fn trace(&self, request: impl Into<RequestOptions>) -> Outcome {
        self.execute(request.into().method(HttpMethod::Trace)).await
    }

    /// Run one request to completion. Settles exactly once: with the decoded
    /// (and resolve-hooked) data, or with a single `FetchError` that has been
    /// through the reject hook.
    pub async fn execute(&self, options: RequestOptions) -> Outcome {
        let debug = options.debug.unwrap_or(self.config.debug);
        let logger = debug.then_some(&*self.logger);
        if let Some(logger) = logger {
            logger.log(DebugEvent::Request(&options));
        }

        let request = match assemble_logged(&self.config, &options, logger) {
            Ok(request) => request,
            Err(e) => return Err(self.hooks.reject(e)),
        };

        let (settlement, outcome) = Settlement::<Outcome>::new();

        let _timer = AbortOnDrop(tokio::spawn({
            let settlement = Arc::clone(&settlement);
            let hooks = self.hooks.clone();
            let timeout = request.timeout;
            async move {
                tokio::time::sleep(timeout).await;
                if let Some(tx) = settlement.claim() {
                    let error = FetchError::timeout(settlement.status());
                    let _ = tx.send(Err(hooks.reject(error)));
                }
            }
        }));

        let prepared = self.hooks.before_request(PreparedRequest {
            url: request.url,
            init: request.init,
        });
        if let Some(logger) = logger {
            logger.log(DebugEvent::Url(&prepared.url));
        }

        tokio::spawn(Exchange {
            transport: Arc::clone(&self.transport),
            logger: debug.then(|| Arc::clone(&self.logger)),
            hooks: self.hooks.clone(),
            settlement,
            data_type: request.data_type,
        }
        .run(prepared.url, prepared.init));

        match outcome.await {
            Ok(result) => result,
            // Both racers dropped their sender, which only happens if a task panicked.
            Err(_) => Err(self.hooks.reject(FetchError::connection(None))),
        }
    }
}

/// The transport side of the race.
struct Exchange {
    transport: Arc<dyn Transport>,
    logger: Option<Arc<dyn RequestLogger>>,
    hooks: Hooks,
    settlement: Arc<Settlement<Outcome>>,
    data_type: DataType,
}

impl Exchange {
    async fn run(self, url: String, init: RequestInit) {
        let decoded = match self.transport.fetch(url, init).await {
            // Lost the race; nothing will read the body.
            Ok(_) if self.settlement.is_settled() => return,
            Ok(response) => {
                self.settlement.observe_status(response.status);
                if let Some(logger) = &self.logger {
                    logger.log(DebugEvent::Status(response.status));
                }
                self.decode(response).await
            }
            Err(e) => Err(FetchError::connection(Some(e))),
        };

        match decoded {
            Ok(data) => {
                let Some(tx) = self.settlement.claim() else {
                    return;
                };
                if let Some(logger) = &self.logger {
                    logger.log(DebugEvent::Result(&data));
                }
                let _ = tx.send(self.hooks.resolve(data));
            }
            Err(error) => {
                if let Some(logger) = &self.logger {
                    logger.log(DebugEvent::Error(&error));
                }
                if let Some(tx) = self.settlement.claim() {
                    let _ = tx.send(Err(self.hooks.reject(error)));
                }
            }
        }
    }

    /// Read the rest of the body and decode it. The head has already been
    /// seen, so every failure here carries its status.
    async fn decode(&self, response: StreamedResponse) -> Result<ResponseData, FetchError> {
        let status = i32::from(response.status);
        let response = response.buffer().await.map_err(|e| FetchError::parse(status, e))?;
        resolve(response, self.data_type).map_err(|e| FetchError::parse(status, e))
    }
}

/// Aborts the timer when `execute` finishes or its future is dropped.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn without_body(mut options: RequestOptions) -> RequestOptions {
    options.body = None;
    options.raw_body = None;
    options
}

/// Builder for [`Fetcher`].
#[derive(Default)]
pub struct FetcherBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    logger: Option<Arc<dyn RequestLogger>>,
}

impl fmt::Debug for FetcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetcherBuilder")
            .field("config", &self.config)
            .field("transport", &self.transport.is_some())
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl FetcherBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn base_body(mut self, base_body: serde_json::Map<String, serde_json::Value>) -> Self {
        self.config.base_body = base_body;
        self
    }

    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.config.data_type = data_type;
        self
    }

    pub fn timeout_millis(mut self, millis: u64) -> Self {
        self.config.timeout_millis = millis;
        self
    }

    pub fn debug(mut self, enabled: bool) -> Self {
        self.config.debug = enabled;
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn logger(mut self, logger: impl RequestLogger + 'static) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Build the client. Without an explicit transport this uses
    /// `UreqTransport`.
    pub fn build(self) -> Fetcher {
        Fetcher {
            config: self.config,
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(UreqTransport::default())),
            logger: self.logger.unwrap_or_else(|| Arc::new(TracingLogger)),
            hooks: Hooks::default(),
        }
    }
}
