//! 传输层：后端请求的抽象接口（GET/POST/PUT/DELETE + 查询参数 + JSON 体 + Bearer 令牌）。
//!
//! Request transport.
//!
//! The orchestration core only needs a generic request/response collaborator. The
//! [`Transport`] trait is that seam; [`HttpTransport`] is the reqwest-backed default and
//! tests plug in scripted implementations.

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::collections::BTreeMap;

/// Header carrying the client-generated correlation id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Correlation id sent as [`REQUEST_ID_HEADER`].
    pub request_id: Option<String>,
}

impl TransportRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            request_id: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Looks up a query parameter by name.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Binary(Bytes),
    Empty,
}

impl ResponseBody {
    /// JSON view of the body; binary and empty bodies read as `null`.
    pub fn json(&self) -> &Value {
        match self {
            ResponseBody::Json(v) => v,
            _ => &Value::Null,
        }
    }

    pub fn into_json(self) -> Value {
        match self {
            ResponseBody::Json(v) => v,
            _ => Value::Null,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    /// Header names are lower-cased.
    pub headers: BTreeMap<String, String>,
    pub body: ResponseBody,
}

impl TransportResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: ResponseBody::Json(body),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }
}

/// The response part of a non-2xx failure.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedResponse {
    pub status: u16,
    pub data: Value,
    /// Header names are lower-cased.
    pub headers: BTreeMap<String, String>,
}

impl FailedResponse {
    pub fn new(status: u16, data: Value) -> Self {
        Self {
            status,
            data,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// No response was received (connect failure, timeout, undecodable body).
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Numeric status exposed by the HTTP library, when it has one.
        status: Option<u16>,
        request_id: Option<String>,
    },

    /// The backend answered with a non-2xx status.
    #[error("HTTP {}: {message}", .response.status)]
    Status {
        response: FailedResponse,
        message: String,
        request_id: Option<String>,
    },
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        TransportError::Network {
            message: message.into(),
            status: None,
            request_id: None,
        }
    }

    pub fn status(response: FailedResponse) -> Self {
        let message = format!("Request failed with status code {}", response.status);
        TransportError::Status {
            response,
            message,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        match &mut self {
            TransportError::Network { request_id, .. } | TransportError::Status { request_id, .. } => {
                *request_id = Some(id.into());
            }
        }
        self
    }

    pub fn response(&self) -> Option<&FailedResponse> {
        match self {
            TransportError::Status { response, .. } => Some(response),
            TransportError::Network { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            TransportError::Network { message, .. } | TransportError::Status { message, .. } => {
                message
            }
        }
    }

    /// Correlation id that was sent with the failed request.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            TransportError::Network { request_id, .. }
            | TransportError::Status { request_id, .. } => request_id.as_deref(),
        }
    }
}

/// A generic request/response collaborator.
///
/// Implementations own their retry policy (if any); the orchestration core calls
/// `send` once per logical step.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}
