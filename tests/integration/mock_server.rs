//! Mock HTTP server setup for integration tests

use kube_guard_client::{OpsClient, OpsClientBuilder, PollOptions, ClientConfig};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const TOKEN: &str = "test-token";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        crate::common::init_tracing();
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    /// Client pointed at the mock server, polling at the minimum interval.
    pub fn client(&self) -> kube_guard_client::Result<OpsClient> {
        OpsClientBuilder::new()
            .config(ClientConfig::default())
            .base_url(&self.base_url)
            .token(TOKEN)
            .poll_options(PollOptions::new(200, 5_000))
            .build()
    }

    /// JSON answer for `method path`, requiring the bearer token.
    pub async fn mock_json(&self, method: &str, path: &str, status: usize, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock(method, path)
            .match_query(Matcher::Any)
            .match_header("authorization", format!("Bearer {}", TOKEN).as_str())
            .match_header("x-request-id", Matcher::Regex("^[0-9a-f-]{36}$".to_string()))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Plain-text error answer that echoes a server-side request id.
    pub async fn mock_text_error(&self, path: &str, status: usize, request_id: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("GET", path)
            .match_query(Matcher::Any)
            .with_status(status)
            .with_header("content-type", "text/plain")
            .with_header("x-request-id", request_id)
            .with_body("upstream exploded")
            .create_async()
            .await
    }
}
