//! 异步任务：任务句柄、状态与轮询参数。
//!
//! Background task handles and polling.
//!
//! When the backend answers a request with a task id instead of a result, the
//! [`poller::TaskPoller`] takes over and polls the job-status endpoint until the task
//! reaches a terminal state, the time budget runs out, or a newer request supersedes it.

pub mod poller;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Minimum interval between two status fetches.
pub const MIN_INTERVAL_MS: u64 = 200;
/// Minimum total polling budget.
pub const MIN_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_INTERVAL_MS: u64 = 800;
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Backend-reported task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Failed,
    /// Refused by the backend's safety policy.
    Restricted,
    /// Absent or unrecognized status.
    Unknown,
}

impl JobStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("PENDING") => Self::Pending,
            Some("RUNNING") => Self::Running,
            Some("DONE") | Some("SUCCESS") => Self::Done,
            Some("FAILED") => Self::Failed,
            Some("RESTRICTED") => Self::Restricted,
            _ => Self::Unknown,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
            Self::Restricted => "RESTRICTED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// A snapshot of a backend task, read from a submission or a status response.
#[derive(Debug, Clone, PartialEq)]
pub struct JobHandle {
    pub id: String,
    pub status: JobStatus,
    pub result: Option<Value>,
    pub error: Option<Value>,
    pub detail: Option<String>,
    pub message: Option<String>,
}

impl JobHandle {
    /// Reads a handle from a status body. Accepts both `{ "task": {..} }` and the bare
    /// task object. Never fails; missing fields stay empty.
    pub fn from_value(body: &Value) -> Self {
        let task = match body.get("task") {
            Some(t) if t.is_object() => t,
            _ => body,
        };
        let id = job_id(task).unwrap_or_default().to_string();
        Self {
            id,
            status: JobStatus::parse(task.get("status").and_then(|v| v.as_str())),
            result: extract_result(task),
            error: task.get("error").filter(|v| !v.is_null()).cloned(),
            detail: non_empty_str(task.get("detail")),
            message: non_empty_str(task.get("message")),
        }
    }

    /// Failure text, taken from the first present field in order: `detail`,
    /// `message`, string `error`, `error.detail`, `error.message`.
    pub fn failure_message(&self, fallback: &str) -> String {
        if let Some(d) = &self.detail {
            return d.clone();
        }
        if let Some(m) = &self.message {
            return m.clone();
        }
        match &self.error {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(err @ Value::Object(_)) => non_empty_str(err.get("detail"))
                .or_else(|| non_empty_str(err.get("message")))
                .unwrap_or_else(|| fallback.to_string()),
            _ => fallback.to_string(),
        }
    }
}

/// Non-empty job id of a body, from `task_id` or `job_id`.
pub fn job_id(body: &Value) -> Option<&str> {
    ["task_id", "job_id"]
        .iter()
        .filter_map(|k| body.get(*k).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

fn non_empty_str(v: Option<&Value>) -> Option<String> {
    v.and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn extract_result(task: &Value) -> Option<Value> {
    match task.get("result").filter(|v| !v.is_null()) {
        Some(v) => Some(v.clone()),
        None => match task.get("result_json") {
            Some(Value::String(s)) if !s.is_empty() => {
                Some(serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.clone())))
            }
            Some(v) if !v.is_null() && !v.is_string() => Some(v.clone()),
            _ => None,
        },
    }
}

/// Poll loop timing. Values below the floors are raised to them by [`PollOptions::clamped`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollOptions {
    pub interval_ms: u64,
    pub timeout_ms: u64,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl PollOptions {
    pub fn new(interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            interval_ms,
            timeout_ms,
        }
    }

    pub fn clamped(self) -> Self {
        Self {
            interval_ms: self.interval_ms.max(MIN_INTERVAL_MS),
            timeout_ms: self.timeout_ms.max(MIN_TIMEOUT_MS),
        }
    }
}

/// Poll loop state as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollState {
    Idle,
    Submitted,
    Polling,
    Done,
    Failed,
    TimedOut,
    Cancelled,
}

impl PollState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Submitted | Self::Polling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_aliases_and_unknowns() {
        assert_eq!(JobStatus::parse(Some("SUCCESS")), JobStatus::Done);
        assert_eq!(JobStatus::parse(Some("done")), JobStatus::Unknown);
        assert_eq!(JobStatus::parse(None), JobStatus::Unknown);
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Restricted.is_terminal());
    }

    #[test]
    fn handle_reads_wrapped_task_and_result_json() {
        let handle = JobHandle::from_value(&json!({
            "task": {"task_id": "t-1", "status": "DONE", "result_json": "{\"ok\":true}"}
        }));
        assert_eq!(handle.id, "t-1");
        assert_eq!(handle.status, JobStatus::Done);
        assert_eq!(handle.result, Some(json!({"ok": true})));
    }

    #[test]
    fn unparseable_result_json_is_kept_as_string() {
        let handle = JobHandle::from_value(&json!({"status": "DONE", "result_json": "plain"}));
        assert_eq!(handle.result, Some(json!("plain")));
    }

    #[test]
    fn failure_message_priority() {
        let h = JobHandle::from_value(&json!({
            "status": "FAILED", "message": "m", "error": {"detail": "nested"}
        }));
        assert_eq!(h.failure_message("fallback"), "m");

        let h = JobHandle::from_value(&json!({"status": "FAILED", "error": "flat"}));
        assert_eq!(h.failure_message("fallback"), "flat");

        let h = JobHandle::from_value(&json!({
            "status": "FAILED", "error": {"message": "from message"}
        }));
        assert_eq!(h.failure_message("fallback"), "from message");

        let h = JobHandle::from_value(&json!({"status": "FAILED", "error": {}}));
        assert_eq!(h.failure_message("fallback"), "fallback");
    }

    #[test]
    fn job_id_ignores_blank_values() {
        assert_eq!(job_id(&json!({"task_id": "  "})), None);
        assert_eq!(job_id(&json!({"task_id": "", "job_id": "j-9"})), Some("j-9"));
        assert_eq!(job_id(&json!({"task_id": 12})), None);
    }

    #[test]
    fn poll_options_floors() {
        let opts = PollOptions::new(10, 10).clamped();
        assert_eq!(opts, PollOptions::new(MIN_INTERVAL_MS, MIN_TIMEOUT_MS));
        assert_eq!(PollOptions::default().clamped(), PollOptions::default());
    }
}
