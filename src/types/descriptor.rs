//! Request descriptors.
//!
//! A [`RequestDescriptor`] is the immutable parameter set of one logical operation.
//! [`RequestDescriptor::to_query`] merges the backend defaults in, so the wire request
//! is fully explicit.

use super::target::{ScalePolicy, Target};
use crate::transport::Method;

pub const DEFAULT_HISTORY_MINUTES: u32 = 240;
pub const DEFAULT_HORIZON_MINUTES: u32 = 120;
pub const DEFAULT_STEP: u32 = 60;
pub const DEFAULT_THRESHOLD: f64 = 85.0;
pub const DEFAULT_SUSTAIN_MINUTES: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Forecast,
    Suggestions,
    Execute,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Forecast => "forecast",
            Operation::Suggestions => "suggestions",
            Operation::Execute => "execute",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Operation::Forecast => "/api/ai/forecast",
            Operation::Suggestions => "/api/ai/suggestions",
            Operation::Execute => "/api/ai/execute",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Operation::Execute => Method::Post,
            _ => Method::Get,
        }
    }

    /// Fields whose presence marks a body as the terminal result of this operation.
    ///
    /// `ok` is not one of them: task submissions carry it too.
    pub fn terminal_fields(&self) -> &'static [&'static str] {
        match self {
            Operation::Forecast => &["history", "forecast"],
            Operation::Suggestions => &["suggestions"],
            Operation::Execute => &["action", "detail"],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub node: Option<String>,
    pub namespace: Option<String>,
    pub pod: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub history_minutes: Option<u32>,
    pub horizon_minutes: Option<u32>,
    pub step: Option<u32>,
}

impl TimeWindow {
    pub fn horizon_or_default(&self) -> u32 {
        self.horizon_minutes.unwrap_or(DEFAULT_HORIZON_MINUTES)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyKnobs {
    pub threshold: Option<f64>,
    pub sustain_minutes: Option<u32>,
    pub use_llm: Option<bool>,
    pub scale_policy: Option<ScalePolicy>,
    pub safe_low: Option<f64>,
    pub safe_high: Option<f64>,
    pub cache_ttl: Option<u32>,
    pub promql: Option<String>,
    pub async_mode: Option<bool>,
}

/// Parameters that only apply to [`Operation::Execute`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionParams {
    pub suggestion_index: usize,
    pub dry_run: bool,
    pub suggestion_id: Option<String>,
    pub expected_kind: Option<String>,
    pub confirm_text: Option<String>,
    pub exec_namespace: Option<String>,
    pub exec_name: Option<String>,
    pub exec_pod: Option<String>,
    pub replicas: Option<u32>,
    pub replicas_delta: Option<i32>,
    pub cpu_request_m: Option<u32>,
    pub cpu_limit_m: Option<u32>,
    pub mem_request_mb: Option<u32>,
    pub mem_limit_mb: Option<u32>,
}

impl ExecutionParams {
    pub fn new(suggestion_index: usize, dry_run: bool) -> Self {
        Self {
            suggestion_index,
            dry_run,
            ..Self::default()
        }
    }

    pub fn with_suggestion_id(mut self, id: impl Into<String>) -> Self {
        self.suggestion_id = Some(id.into());
        self
    }

    pub fn with_confirm_text(mut self, text: impl Into<String>) -> Self {
        self.confirm_text = Some(text.into());
        self
    }

    pub fn with_workload(mut self, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        self.exec_namespace = Some(namespace.into());
        self.exec_name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub operation: Operation,
    pub target: Target,
    pub scope: Scope,
    pub window: TimeWindow,
    pub policy: PolicyKnobs,
    pub execution: Option<ExecutionParams>,
}

impl RequestDescriptor {
    pub fn new(operation: Operation, target: Target) -> Self {
        Self {
            operation,
            target,
            scope: Scope::default(),
            window: TimeWindow::default(),
            policy: PolicyKnobs::default(),
            execution: None,
        }
    }

    pub fn forecast(target: Target) -> Self {
        Self::new(Operation::Forecast, target)
    }

    pub fn suggestions(target: Target) -> Self {
        Self::new(Operation::Suggestions, target)
    }

    pub fn execute(target: Target, params: ExecutionParams) -> Self {
        let mut d = Self::new(Operation::Execute, target);
        d.execution = Some(params);
        d
    }

    pub fn node(mut self, node: impl Into<String>) -> Self {
        self.scope.node = Some(node.into());
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.scope.namespace = Some(namespace.into());
        self
    }

    pub fn pod(mut self, pod: impl Into<String>) -> Self {
        self.scope.pod = Some(pod.into());
        self
    }

    pub fn history_minutes(mut self, minutes: u32) -> Self {
        self.window.history_minutes = Some(minutes);
        self
    }

    pub fn horizon_minutes(mut self, minutes: u32) -> Self {
        self.window.horizon_minutes = Some(minutes);
        self
    }

    pub fn step(mut self, step: u32) -> Self {
        self.window.step = Some(step);
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.policy.threshold = Some(threshold);
        self
    }

    pub fn sustain_minutes(mut self, minutes: u32) -> Self {
        self.policy.sustain_minutes = Some(minutes);
        self
    }

    pub fn use_llm(mut self, enable: bool) -> Self {
        self.policy.use_llm = Some(enable);
        self
    }

    pub fn scale_policy(mut self, policy: ScalePolicy) -> Self {
        self.policy.scale_policy = Some(policy);
        self
    }

    pub fn safe_band(mut self, low: f64, high: f64) -> Self {
        self.policy.safe_low = Some(low);
        self.policy.safe_high = Some(high);
        self
    }

    pub fn cache_ttl(mut self, secs: u32) -> Self {
        self.policy.cache_ttl = Some(secs);
        self
    }

    pub fn promql(mut self, query: impl Into<String>) -> Self {
        self.policy.promql = Some(query.into());
        self
    }

    /// Ask the backend for an inline answer (`false`) or a task handle (`true`, default).
    pub fn async_mode(mut self, enable: bool) -> Self {
        self.policy.async_mode = Some(enable);
        self
    }

    /// Query parameters with backend defaults merged in.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut q = QueryBuilder::default();
        q.push("target", self.target.as_str());
        q.opt("node", self.scope.node.as_deref());
        q.opt("namespace", self.scope.namespace.as_deref());
        q.opt("pod", self.scope.pod.as_deref());
        q.push(
            "history_minutes",
            self.window.history_minutes.unwrap_or(DEFAULT_HISTORY_MINUTES),
        );
        q.push("horizon_minutes", self.window.horizon_or_default());
        q.push("step", self.window.step.unwrap_or(DEFAULT_STEP));

        let p = &self.policy;
        if self.operation != Operation::Forecast {
            q.push("threshold", p.threshold.unwrap_or(DEFAULT_THRESHOLD));
            q.push(
                "sustain_minutes",
                p.sustain_minutes.unwrap_or(DEFAULT_SUSTAIN_MINUTES),
            );
            q.opt("scale_policy", p.scale_policy.map(|s| s.as_str()));
            q.opt("safe_low", p.safe_low);
            q.opt("safe_high", p.safe_high);
        }
        match self.operation {
            Operation::Forecast => {
                q.opt("cache_ttl", p.cache_ttl);
                q.opt("promql", p.promql.as_deref());
                q.push("async_mode", p.async_mode.unwrap_or(true));
            }
            Operation::Suggestions => {
                q.push("use_llm", p.use_llm.unwrap_or(false));
                q.push("async_mode", p.async_mode.unwrap_or(true));
            }
            Operation::Execute => {}
        }

        if let Some(e) = &self.execution {
            q.push("suggestion_index", e.suggestion_index);
            q.push("dry_run", e.dry_run);
            q.opt("suggestion_id", e.suggestion_id.as_deref());
            q.opt("expected_kind", e.expected_kind.as_deref());
            q.opt("confirm_text", e.confirm_text.as_deref());
            q.opt("exec_namespace", e.exec_namespace.as_deref());
            q.opt("exec_name", e.exec_name.as_deref());
            q.opt("exec_pod", e.exec_pod.as_deref());
            q.opt("replicas", e.replicas);
            q.opt("replicas_delta", e.replicas_delta);
            q.opt("cpu_request_m", e.cpu_request_m);
            q.opt("cpu_limit_m", e.cpu_limit_m);
            q.opt("mem_request_mb", e.mem_request_mb);
            q.opt("mem_limit_mb", e.mem_limit_mb);
        }
        q.0
    }
}

#[derive(Default)]
struct QueryBuilder(Vec<(String, String)>);

impl QueryBuilder {
    fn push(&mut self, key: &str, value: impl ToString) {
        self.0.push((key.to_string(), value.to_string()));
    }

    fn opt<T: ToString>(&mut self, key: &str, value: Option<T>) {
        if let Some(v) = value {
            self.push(key, v);
        }
    }
}
