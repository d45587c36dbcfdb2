use crate::client::core::OpsClient;
use crate::config::ClientConfig;
use crate::tasks::poller::TaskPoller;
use crate::tasks::PollOptions;
use crate::transport::{HttpTransport, Transport};
use crate::Result;
use std::sync::Arc;
use tracing::info;

/// Builder for [`OpsClient`].
///
/// Starts from [`ClientConfig::from_env`], so `KUBE_GUARD_*` variables apply unless
/// overridden here.
pub struct OpsClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl OpsClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::from_env(),
            transport: None,
        }
    }

    /// Replace the whole configuration (env overrides are not re-applied).
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(token.into());
        self
    }

    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http_timeout_secs = secs;
        self
    }

    /// Poll interval and timeout; floors are applied at build time.
    pub fn poll_options(mut self, options: PollOptions) -> Self {
        self.config.poll = options;
        self
    }

    pub fn task_status_path(mut self, path: impl Into<String>) -> Self {
        self.config.task_status_path = path.into();
        self
    }

    /// Use a custom transport instead of the reqwest-backed one (mainly for tests).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<OpsClient> {
        let config = self.config.validated()?;
        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(&config)?),
        };
        info!(
            base_url = config.base_url.as_str(),
            poll_interval_ms = config.poll.interval_ms,
            poll_timeout_ms = config.poll.timeout_ms,
            "kube-guard client ready"
        );
        let poller = TaskPoller::new(
            transport.clone(),
            config.task_status_path.clone(),
            config.poll,
        );
        Ok(OpsClient {
            transport,
            config,
            poller,
        })
    }
}

impl Default for OpsClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
