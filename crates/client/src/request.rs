//! Request wrapper with observable `{data, loading, error}` state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{ClientError, TransportError};
use crate::transport::{ApiRequest, Method, Transport};

/// Message used when neither the server nor the transport said anything useful.
pub const FALLBACK_ERROR: &str = "An error occurred";

/// User-visible outcome of the last call, recorded when `notify` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success,
    Failure(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestState {
    pub data: Option<Value>,
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestPolicy {
    /// Suppress the automatic fetch of `GET` requests.
    pub manual: bool,
    /// Emit a success/failure notice for every call.
    pub notify: bool,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            manual: false,
            notify: true,
        }
    }
}

/// Turns a transport failure into the message shown to the operator.
///
/// Priority: server-supplied message, transport error text, fixed fallback.
pub fn error_message(err: &TransportError) -> String {
    if let Some(m) = err.server_message().filter(|m| !m.trim().is_empty()) {
        return m.to_string();
    }
    match err {
        TransportError::Request(text) | TransportError::Decode(text) if text.trim().is_empty() => {
            FALLBACK_ERROR.to_string()
        }
        _ => err.to_string(),
    }
}

/// A single configured backend call plus its shared state.
///
/// Clones share state. Triggers are not de-duplicated: two concurrent
/// triggers issue two calls, and whichever resolves last wins the state.
#[derive(Debug, Clone)]
pub struct RequestClient<T> {
    transport: T,
    request: ApiRequest,
    policy: RequestPolicy,
    state: Arc<watch::Sender<RequestState>>,
    auto_fired: Arc<AtomicBool>,
}

impl<T: Transport> RequestClient<T> {
    pub fn new(transport: T, request: ApiRequest) -> Self {
        let (state, _) = watch::channel(RequestState::default());
        Self {
            transport,
            request,
            policy: RequestPolicy::default(),
            state: Arc::new(state),
            auto_fired: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn get(transport: T, path: impl Into<String>) -> Self {
        Self::new(transport, ApiRequest::get(path))
    }

    pub fn post(transport: T, path: impl Into<String>, body: Value) -> Self {
        Self::new(transport, ApiRequest::post(path, body))
    }

    pub fn with_policy(mut self, policy: RequestPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Only fire on explicit [`trigger`](Self::trigger).
    pub fn manual(mut self) -> Self {
        self.policy.manual = true;
        self
    }

    /// Do not emit notices.
    pub fn quiet(mut self) -> Self {
        self.policy.notify = false;
        self
    }

    pub fn request(&self) -> &ApiRequest {
        &self.request
    }

    pub fn policy(&self) -> RequestPolicy {
        self.policy
    }

    pub fn state(&self) -> RequestState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.state.subscribe()
    }

    pub fn data(&self) -> Option<Value> {
        self.state.borrow().data.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Fires a non-manual `GET` the first time it is called; later calls are no-ops.
    pub async fn auto_fetch(&self) -> Option<Value> {
        if self.request.method != Method::Get || self.policy.manual {
            return None;
        }
        if self.auto_fired.swap(true, Ordering::SeqCst) {
            debug!(path = %self.request.path, "automatic fetch already issued");
            return None;
        }
        self.trigger().await
    }

    /// Issues the call. Returns the payload, or `None` on failure with the
    /// message available through [`error`](Self::error).
    pub async fn trigger(&self) -> Option<Value> {
        let data = self.call().await.ok()?;
        self.succeed(data.clone());
        Some(data)
    }

    /// Issues the call and decodes the payload into `R`.
    ///
    /// A payload that does not decode is recorded as the request error.
    pub async fn fetch<R: DeserializeOwned>(&self) -> Result<R, ClientError> {
        self.fetch_as(false).await
    }

    /// Like [`fetch`](Self::fetch), but only a JSON object is accepted.
    ///
    /// Derived struct decoders also accept arrays by field position; record
    /// shaped responses go through here so such a body is an error.
    pub async fn fetch_object<R: DeserializeOwned>(&self) -> Result<R, ClientError> {
        self.fetch_as(true).await
    }

    async fn fetch_as<R: DeserializeOwned>(&self, object_only: bool) -> Result<R, ClientError> {
        let data = self.call().await.map_err(ClientError::Request)?;
        let decoded = if object_only && !data.is_object() {
            Err(format!(
                "unexpected response from {}: expected an object",
                self.request.path
            ))
        } else {
            serde_json::from_value(data.clone())
                .map_err(|e| format!("unexpected response from {}: {e}", self.request.path))
        };
        match decoded {
            Ok(value) => {
                self.succeed(data);
                Ok(value)
            }
            Err(message) => {
                self.fail(&message);
                Err(ClientError::Decode(message))
            }
        }
    }

    async fn call(&self) -> Result<Value, String> {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        match self.transport.send(&self.request).await {
            Ok(data) => Ok(data),
            Err(err) => {
                let message = error_message(&err);
                self.fail(&message);
                Err(message)
            }
        }
    }

    fn succeed(&self, data: Value) {
        let notify = self.policy.notify;
        self.state.send_modify(|s| {
            s.data = Some(data);
            s.loading = false;
            if notify {
                s.notice = Some(Notice::Success);
            }
        });
        if notify {
            info!(target: "oxn::notify", path = %self.request.path, "Success!");
        }
    }

    fn fail(&self, message: &str) {
        let notify = self.policy.notify;
        self.state.send_modify(|s| {
            s.error = Some(message.to_string());
            s.loading = false;
            if notify {
                s.notice = Some(Notice::Failure(message.to_string()));
            }
        });
        if notify {
            warn!(target: "oxn::notify", path = %self.request.path, "{message}");
        } else {
            debug!(path = %self.request.path, error = %message, "request failed");
        }
    }
}
