//! 客户端配置：默认值、YAML 文件与环境变量覆盖。
//!
//! Client configuration.
//!
//! Values come from (lowest to highest precedence) built-in defaults, an optional YAML
//! file, and `KUBE_GUARD_*` environment variables.

use crate::tasks::PollOptions;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TASK_STATUS_PATH: &str = "/api/tasks/{id}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    pub http_timeout_secs: u64,
    pub poll: PollOptions,
    /// Job-status endpoint; `{id}` is replaced with the url-encoded task id.
    pub task_status_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            http_timeout_secs: 15,
            poll: PollOptions::default(),
            task_status_path: DEFAULT_TASK_STATUS_PATH.to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: ClientConfig = serde_yaml::from_str(raw)?;
        config.validated()
    }

    /// Loads a YAML file, then applies environment overrides.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&raw)?.with_env_overrides().validated()
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("KUBE_GUARD_BASE_URL") {
            if !v.trim().is_empty() {
                self.base_url = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("KUBE_GUARD_TOKEN") {
            if !v.is_empty() {
                self.token = Some(v);
            }
        }
        if let Some(v) = env_u64("KUBE_GUARD_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = v;
        }
        if let Some(v) = env_u64("KUBE_GUARD_POLL_INTERVAL_MS") {
            self.poll.interval_ms = v;
        }
        if let Some(v) = env_u64("KUBE_GUARD_POLL_TIMEOUT_MS") {
            self.poll.timeout_ms = v;
        }
        if let Ok(v) = std::env::var("KUBE_GUARD_TASK_STATUS_PATH") {
            if v.contains("{id}") {
                self.task_status_path = v;
            }
        }
        self
    }

    /// Checks the fields that would otherwise fail late, and applies the poll floors.
    pub fn validated(mut self) -> Result<Self> {
        url::Url::parse(&self.base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base url '{}': {}", self.base_url, e),
                ErrorContext::new()
                    .with_field_path("config.base_url")
                    .with_source("config_loader"),
            )
        })?;
        if !self.task_status_path.contains("{id}") {
            return Err(Error::configuration_with_context(
                "task_status_path must contain an {id} placeholder",
                ErrorContext::new()
                    .with_field_path("config.task_status_path")
                    .with_source("config_loader"),
            ));
        }
        self.poll = self.poll.clamped();
        Ok(self)
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<u64>().ok())
}
