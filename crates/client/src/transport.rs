use std::future::Future;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

/// One backend call: verb, path relative to the base URL, optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }
}

/// Carries requests to the backend.
pub trait Transport: Clone + Send + Sync + 'static {
    /// Issues `request` and decodes the JSON response. An empty body decodes to `null`.
    fn send(&self, request: &ApiRequest) -> impl Future<Output = Result<Value, TransportError>> + Send;

    /// Fetches `path` with `GET` and returns the raw body.
    fn download(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// [`Transport`] over HTTP using `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn execute(&self, request: &ApiRequest) -> Result<reqwest::Response, TransportError> {
        let url = self.url(&request.path);
        debug!(method = ?request.method, %url, "sending request");
        let builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => {
                let body = request.body.clone().unwrap_or_else(|| Value::Object(Default::default()));
                self.client.post(url).json(&body)
            }
        };
        let resp = builder
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.bytes().await.unwrap_or_default();
        Err(TransportError::Status {
            status: status.as_u16(),
            message: server_message(&body),
        })
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        let resp = self.execute(request).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        let resp = self.execute(&ApiRequest::get(path)).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Pulls a human readable message out of an error body.
///
/// Looks at `message` first, then FastAPI's `detail`.
pub fn server_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["message", "detail"].iter().find_map(|key| match value.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Null | Value::String(_) => None,
        other => Some(other.to_string()),
    })
}
