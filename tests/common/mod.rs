//! Shared fixtures: a scripted in-memory transport and log setup.

#![allow(dead_code)]

use async_trait::async_trait;
use kube_guard_client::transport::{
    FailedResponse, Transport, TransportError, TransportRequest, TransportResponse,
};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static TRACING: Once = Once::new();

/// Installs a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// One scripted answer, optionally delayed.
#[derive(Clone)]
pub struct Reply {
    delay: Option<Duration>,
    result: Result<Value, TransportError>,
}

impl Reply {
    pub fn json(body: Value) -> Self {
        Self {
            delay: None,
            result: Ok(body),
        }
    }

    pub fn status(status: u16, data: Value) -> Self {
        Self {
            delay: None,
            result: Err(TransportError::status(FailedResponse::new(status, data))),
        }
    }

    pub fn network(message: &str) -> Self {
        Self {
            delay: None,
            result: Err(TransportError::network(message)),
        }
    }

    pub fn after_ms(mut self, ms: u64) -> Self {
        self.delay = Some(Duration::from_millis(ms));
        self
    }
}

/// Answers by request path. Each path plays its replies in order and then keeps
/// repeating the last one. Unscripted paths answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, path: &str, replies: Vec<Reply>) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), replies.into());
        self
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    fn next_reply(&self, path: &str) -> Option<Reply> {
        let mut routes = self.routes.lock().unwrap();
        let queue = routes.get_mut(path)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .next_reply(&request.path)
            .unwrap_or_else(|| Reply::status(404, json!({"detail": "Not Found"})));
        if let Some(delay) = reply.delay {
            tokio::time::sleep(delay).await;
        }
        match reply.result {
            Ok(body) => Ok(TransportResponse::json(200, body)),
            Err(e) => Err(match &request.request_id {
                Some(id) => e.with_request_id(id.clone()),
                None => e,
            }),
        }
    }
}
