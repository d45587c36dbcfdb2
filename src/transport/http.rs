use super::{
    FailedResponse, Method, ResponseBody, Transport, TransportError, TransportRequest,
    TransportResponse, REQUEST_ID_HEADER,
};
use crate::config::ClientConfig;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base = url::Url::parse(&config.base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base url: {}", e),
                ErrorContext::new()
                    .with_field_path("config.base_url")
                    .with_source("http_transport"),
            )
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs.max(1)))
            .build()
            .map_err(|e| {
                Error::configuration_with_context(
                    e.to_string(),
                    ErrorContext::new().with_source("http_transport"),
                )
            })?;

        Ok(Self {
            client,
            base_url: base.as_str().trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn network_error(e: reqwest::Error, request_id: Option<&str>) -> TransportError {
        let err = TransportError::Network {
            message: e.to_string(),
            status: e.status().map(|s| s.as_u16()),
            request_id: None,
        };
        match request_id {
            Some(id) => err.with_request_id(id),
            None => err,
        }
    }

    fn decode_body(content_type: Option<&str>, bytes: Bytes) -> ResponseBody {
        if bytes.is_empty() {
            return ResponseBody::Empty;
        }
        let is_json = content_type
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false);
        if is_json {
            if let Ok(v) = serde_json::from_slice(&bytes) {
                return ResponseBody::Json(v);
            }
        }
        ResponseBody::Binary(bytes)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> std::result::Result<TransportResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut req = match request.method {
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
            Method::Get => self.client.get(&url),
        };

        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        if let Some(id) = &request.request_id {
            req = req.header(REQUEST_ID_HEADER, id);
        }
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let start = std::time::Instant::now();
        let resp = req
            .send()
            .await
            .map_err(|e| Self::network_error(e, request.request_id.as_deref()))?;

        let status = resp.status().as_u16();
        let headers: BTreeMap<String, String> = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.as_str().to_string(), s.to_string())))
            .collect();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Self::network_error(e, request.request_id.as_deref()))?;
        let body = Self::decode_body(headers.get("content-type").map(|s| s.as_str()), bytes);

        debug!(
            method = request.method.as_str(),
            path = request.path.as_str(),
            http_status = status,
            duration_ms = start.elapsed().as_millis() as u64,
            "kube-guard transport call"
        );

        if !(200..300).contains(&status) {
            let data = match body {
                ResponseBody::Json(v) => v,
                ResponseBody::Binary(b) => {
                    serde_json::Value::String(String::from_utf8_lossy(&b).into_owned())
                }
                ResponseBody::Empty => serde_json::Value::Null,
            };
            let err = TransportError::status(FailedResponse {
                status,
                data,
                headers,
            });
            return Err(match &request.request_id {
                Some(id) => err.with_request_id(id.clone()),
                None => err,
            });
        }

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
