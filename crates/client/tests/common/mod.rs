#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use oxn_client::{ApiRequest, Method, Transport, TransportError};
use serde_json::Value;

type Key = (Method, String);

#[derive(Default)]
struct Script {
    calls: Vec<ApiRequest>,
    responses: HashMap<Key, Vec<Result<Value, TransportError>>>,
    delays: HashMap<Key, Duration>,
    downloads: HashMap<String, Vec<u8>>,
}

/// In-memory backend that records every request.
///
/// Responses are queued per `(method, path)`; the last queued response is
/// repeated once the queue is down to one. Unscripted calls fail with 404.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    script: Arc<Mutex<Script>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, path: &str, response: Result<Value, TransportError>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .responses
            .entry((method, path.to_string()))
            .or_default()
            .push(response);
        self
    }

    pub fn ok(&self, method: Method, path: &str, body: Value) -> &Self {
        self.respond(method, path, Ok(body))
    }

    pub fn fail(&self, method: Method, path: &str, status: u16, message: Option<&str>) -> &Self {
        self.respond(
            method,
            path,
            Err(TransportError::Status {
                status,
                message: message.map(str::to_string),
            }),
        )
    }

    pub fn delay(&self, method: Method, path: &str, delay: Duration) -> &Self {
        self.script
            .lock()
            .unwrap()
            .delays
            .insert((method, path.to_string()), delay);
        self
    }

    pub fn file(&self, path: &str, bytes: &[u8]) -> &Self {
        self.script
            .lock()
            .unwrap()
            .downloads
            .insert(path.to_string(), bytes.to_vec());
        self
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<ApiRequest> {
        self.calls().into_iter().filter(|c| c.path == path).collect()
    }

    fn next(&self, request: &ApiRequest) -> (Option<Duration>, Result<Value, TransportError>) {
        let mut script = self.script.lock().unwrap();
        script.calls.push(request.clone());
        let key = (request.method, request.path.clone());
        let delay = script.delays.get(&key).copied();
        let response = match script.responses.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.remove(0),
            Some(queue) if queue.len() == 1 => queue[0].clone(),
            _ => Err(TransportError::Status {
                status: 404,
                message: Some(format!("no route for {}", request.path)),
            }),
        };
        (delay, response)
    }
}

impl Transport for RecordingTransport {
    async fn send(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        let (delay, response) = self.next(request);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        response
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(ApiRequest::get(path));
        script
            .downloads
            .get(path)
            .cloned()
            .ok_or(TransportError::Status {
                status: 404,
                message: None,
            })
    }
}
