//! Optional intercept hooks.
//!
//! Each hook is independently optional. An absent hook passes its input
//! through unchanged.

use std::fmt;
use std::sync::Arc;

use crate::error::FetchError;
use crate::http::RequestInit;
use crate::response::ResponseData;

/// The URL and transport container about to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub url: String,
    pub init: RequestInit,
}

/// Rewrites the request before it reaches the transport. Its output fully
/// replaces the computed URL and container.
pub type BeforeRequestHook = Arc<dyn Fn(PreparedRequest) -> PreparedRequest + Send + Sync>;

/// Transforms a decoded result. Returning `Err` rejects the call.
pub type ResolveHook = Arc<dyn Fn(ResponseData) -> Result<ResponseData, FetchError> + Send + Sync>;

/// Transforms every error before it reaches the caller.
pub type RejectHook = Arc<dyn Fn(FetchError) -> FetchError + Send + Sync>;

#[derive(Clone, Default)]
pub(crate) struct Hooks {
    pub(crate) before_request: Option<BeforeRequestHook>,
    pub(crate) on_resolve: Option<ResolveHook>,
    pub(crate) on_reject: Option<RejectHook>,
}

impl Hooks {
    pub(crate) fn before_request(&self, request: PreparedRequest) -> PreparedRequest {
        match &self.before_request {
            Some(hook) => hook(request),
            None => request,
        }
    }

    pub(crate) fn reject(&self, error: FetchError) -> FetchError {
        match &self.on_reject {
            Some(hook) => hook(error),
            None => error,
        }
    }

    /// Run the resolve hook; an error it raises goes through `reject`.
    pub(crate) fn resolve(&self, data: ResponseData) -> Result<ResponseData, FetchError> {
        match &self.on_resolve {
            Some(hook) => hook(data).map_err(|e| self.reject(e)),
            None => Ok(data),
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before_request", &self.before_request.is_some())
            .field("on_resolve", &self.on_resolve.is_some())
            .field("on_reject", &self.on_reject.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn absent_hooks_pass_through() {
        let hooks = Hooks::default();
        let request = PreparedRequest {
            url: "http://x".to_string(),
            init: RequestInit::default(),
        };
        assert_eq!(hooks.before_request(request.clone()), request);
        assert_eq!(hooks.resolve(ResponseData::Text("ok".into())).unwrap(), ResponseData::Text("ok".into()));
        assert_eq!(hooks.reject(FetchError::timeout(-1)).kind(), ErrorKind::Timeout);
    }

    #[test]
    fn resolve_error_is_routed_through_reject() {
        let hooks = Hooks {
            on_resolve: Some(Arc::new(|_: ResponseData| Err::<ResponseData, _>(FetchError::new("bad payload", 200)))),
            on_reject: Some(Arc::new(|e: FetchError| e.with_message("rejected"))),
            ..Hooks::default()
        };
        let err = hooks.resolve(ResponseData::Json(json!({}))).unwrap_err();
        assert_eq!(err.message(), "rejected");
        assert_eq!(err.status_code(), 200);
    }
}
