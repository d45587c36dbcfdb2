//! 任务轮询器：固定间隔轮询任务状态，受超时预算约束，并以令牌丢弃被取代的旧轮询。
//!
//! Task poller.
//!
//! One poller instance is one logical slot. Every [`TaskPoller::begin`] (and therefore
//! every [`TaskPoller::start`]) mints a new token; a loop only applies an observation
//! while its captured token is still current, so a slow, superseded loop can never
//! overwrite the state of a newer one.
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use kube_guard_client::transport::Transport;
//! use kube_guard_client::{PollOptions, PollOutcome, TaskPoller};
//!
//! # async fn demo(transport: Arc<dyn Transport>) {
//! let poller = TaskPoller::new(transport, "/api/tasks/{id}", PollOptions::default());
//! match poller.start("task-42", None).await {
//!     PollOutcome::Done(result) => println!("{result}"),
//!     PollOutcome::Failed(err) | PollOutcome::TimedOut(err) => eprintln!("{err}"),
//!     PollOutcome::Cancelled => {} // superseded by a newer start()
//! }
//! # }
//! ```

use super::{JobHandle, JobStatus, PollOptions, PollState};
use crate::client::error_classification::{classify, classify_failure_text};
use crate::transport::{Transport, TransportRequest};
use crate::{ClassifiedError, Error};
use futures::future::{BoxFuture, FutureExt};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

const RESTRICTED_MESSAGE: &str = "operation forbidden";
const FAILED_MESSAGE: &str = "task execution failed";

/// Unreserved characters stay literal in the task id segment.
const TASK_ID_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// How a poll loop ended. `T` is the decoded result, the raw JSON by default.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T = Value> {
    Done(T),
    Failed(ClassifiedError),
    TimedOut(ClassifiedError),
    /// Superseded or stopped; carries no result and no failure.
    Cancelled,
}

impl<T> PollOutcome<T> {
    /// `None` for a cancelled loop, otherwise the terminal result.
    pub fn into_result(self) -> Option<Result<T, ClassifiedError>> {
        match self {
            PollOutcome::Done(v) => Some(Ok(v)),
            PollOutcome::Failed(e) | PollOutcome::TimedOut(e) => Some(Err(e)),
            PollOutcome::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PollOutcome::Cancelled)
    }
}

/// Observable state of the current loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PollSnapshot {
    pub token: u64,
    pub task_id: Option<String>,
    pub state: PollState,
    pub job_status: Option<JobStatus>,
    pub result: Option<Value>,
    pub error: Option<ClassifiedError>,
}

impl PollSnapshot {
    fn fresh(token: u64) -> Self {
        Self {
            token,
            task_id: None,
            state: PollState::Idle,
            job_status: None,
            result: None,
            error: None,
        }
    }

    pub fn loading(&self) -> bool {
        self.task_id.is_some() && self.state.is_active()
    }
}

/// Captured generation of a poller slot.
#[derive(Debug)]
pub struct PollTicket {
    token: u64,
    rx: watch::Receiver<u64>,
}

impl PollTicket {
    pub fn token(&self) -> u64 {
        self.token
    }
}

struct Inner {
    transport: Arc<dyn Transport>,
    status_path: String,
    base: PollOptions,
    token: watch::Sender<u64>,
    snapshot: Mutex<PollSnapshot>,
}

#[derive(Clone)]
pub struct TaskPoller {
    inner: Arc<Inner>,
}

impl TaskPoller {
    pub fn new(transport: Arc<dyn Transport>, status_path: impl Into<String>, base: PollOptions) -> Self {
        let (token, _) = watch::channel(0u64);
        Self {
            inner: Arc::new(Inner {
                transport,
                status_path: status_path.into(),
                base: base.clamped(),
                token,
                snapshot: Mutex::new(PollSnapshot::fresh(0)),
            }),
        }
    }

    /// Mints a new token, invalidating any loop still running on this slot.
    pub fn begin(&self) -> PollTicket {
        let mut snap = self.inner.lock();
        self.inner.token.send_modify(|t| *t += 1);
        let token = *self.inner.token.borrow();
        *snap = PollSnapshot::fresh(token);
        PollTicket {
            token,
            rx: self.inner.token.subscribe(),
        }
    }

    /// Starts polling `task_id` on a fresh token.
    ///
    /// The token is minted before this returns, so a previous loop is superseded even
    /// if the returned future is never awaited. An empty id is rejected without
    /// touching the current loop.
    pub fn start(&self, task_id: &str, options: Option<PollOptions>) -> BoxFuture<'static, PollOutcome> {
        if task_id.trim().is_empty() {
            return futures::future::ready(PollOutcome::Failed(ClassifiedError::param(
                "task_id required",
            )))
            .boxed();
        }
        let ticket = self.begin();
        self.poll(ticket, task_id, options)
    }

    /// Polls `task_id` under an already minted ticket.
    pub fn poll(
        &self,
        ticket: PollTicket,
        task_id: &str,
        options: Option<PollOptions>,
    ) -> BoxFuture<'static, PollOutcome> {
        self.poll_decoded(ticket, task_id, options, Ok)
    }

    /// Like [`poll`](Self::poll), but a finished task's payload goes through `decode`
    /// before anything is recorded. A payload that fails to decode is recorded as a
    /// failure, so the snapshot always agrees with the returned outcome.
    pub fn poll_decoded<T, F>(
        &self,
        ticket: PollTicket,
        task_id: &str,
        options: Option<PollOptions>,
        decode: F,
    ) -> BoxFuture<'static, PollOutcome<T>>
    where
        T: Send + 'static,
        F: FnOnce(Value) -> Result<T, ClassifiedError> + Send + 'static,
    {
        let inner = self.inner.clone();
        let options = options.unwrap_or(inner.base).clamped();
        let task_id = task_id.to_string();
        async move { inner.run(ticket, task_id, options, decode).await }.boxed()
    }

    /// Halts the current loop without producing a terminal outcome.
    pub fn stop(&self) {
        let mut snap = self.inner.lock();
        self.inner.token.send_modify(|t| *t += 1);
        snap.token = *self.inner.token.borrow();
        if snap.state.is_active() {
            snap.state = PollState::Cancelled;
        }
    }

    pub fn is_current(&self, ticket: &PollTicket) -> bool {
        *self.inner.token.borrow() == ticket.token
    }

    pub fn snapshot(&self) -> PollSnapshot {
        self.inner.lock().clone()
    }

    /// Records a result obtained without polling. Returns `false` if the ticket was
    /// superseded, in which case nothing is written.
    pub fn complete(&self, ticket: &PollTicket, result: &Result<Value, ClassifiedError>) -> bool {
        self.inner.observe(ticket, |s| match result {
            Ok(v) => {
                s.state = PollState::Done;
                s.result = Some(v.clone());
            }
            Err(e) => {
                s.state = PollState::Failed;
                s.error = Some(e.clone());
            }
        })
    }

    pub fn options(&self) -> PollOptions {
        self.inner.base
    }
}

impl Inner {
    fn lock(&self) -> std::sync::MutexGuard<'_, PollSnapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current(&self, ticket: &PollTicket) -> bool {
        *self.token.borrow() == ticket.token
    }

    /// Applies `f` only while `ticket` is current; the check and the write share a lock.
    fn observe(&self, ticket: &PollTicket, f: impl FnOnce(&mut PollSnapshot)) -> bool {
        let mut snap = self.lock();
        if !self.current(ticket) {
            return false;
        }
        f(&mut snap);
        true
    }

    /// Records a terminal outcome; `raw` is the payload stored for `Done`.
    fn finish<T>(&self, ticket: &PollTicket, outcome: PollOutcome<T>, raw: Option<Value>) -> PollOutcome<T> {
        let applied = self.observe(ticket, |s| match &outcome {
            PollOutcome::Done(_) => {
                s.state = PollState::Done;
                s.result = raw;
            }
            PollOutcome::Failed(e) => {
                s.state = PollState::Failed;
                s.error = Some(e.clone());
            }
            PollOutcome::TimedOut(e) => {
                s.state = PollState::TimedOut;
                s.error = Some(e.clone());
            }
            PollOutcome::Cancelled => s.state = PollState::Cancelled,
        });
        if applied {
            outcome
        } else {
            PollOutcome::Cancelled
        }
    }

    /// Fetches the task status, returning the handle and the request id it was sent with.
    async fn fetch(&self, task_id: &str) -> Result<(JobHandle, String), Error> {
        let path = status_path(&self.status_path, task_id);
        let request_id = Uuid::new_v4().to_string();
        let request = TransportRequest::get(path).with_request_id(request_id.clone());
        let resp = self.transport.send(request).await?;
        Ok((JobHandle::from_value(resp.body.json()), request_id))
    }

    async fn run<T, F>(
        &self,
        mut ticket: PollTicket,
        task_id: String,
        options: PollOptions,
        decode: F,
    ) -> PollOutcome<T>
    where
        F: FnOnce(Value) -> Result<T, ClassifiedError>,
    {
        let interval = Duration::from_millis(options.interval_ms);
        let started = Instant::now();
        let deadline = started + Duration::from_millis(options.timeout_ms);

        let submitted = self.observe(&ticket, |s| {
            s.task_id = Some(task_id.clone());
            s.state = PollState::Submitted;
        });
        if !submitted {
            return PollOutcome::Cancelled;
        }

        let mut iteration: u32 = 0;
        loop {
            if !self.current(&ticket) {
                debug!(task_id = task_id.as_str(), "poll loop superseded");
                return PollOutcome::Cancelled;
            }
            if Instant::now() >= deadline {
                info!(
                    task_id = task_id.as_str(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "kube-guard task timed out"
                );
                return self.finish(&ticket, PollOutcome::TimedOut(ClassifiedError::task_timeout()), None);
            }

            iteration += 1;
            let fetched = self.fetch(&task_id).await;
            // The request may have outlived the token; stale observations are dropped.
            if !self.current(&ticket) {
                debug!(task_id = task_id.as_str(), iteration, "discarding stale poll response");
                return PollOutcome::Cancelled;
            }

            let (handle, request_id) = match fetched {
                Ok(fetched) => fetched,
                Err(e) => return self.finish(&ticket, PollOutcome::Failed(classify(&e)), None),
            };
            debug!(
                task_id = task_id.as_str(),
                iteration,
                status = handle.status.as_str(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "kube-guard task status"
            );

            match handle.status {
                JobStatus::Done => {
                    info!(task_id = task_id.as_str(), iteration, "kube-guard task done");
                    let result = handle.result.unwrap_or(Value::Null);
                    return match decode(result.clone()) {
                        Ok(decoded) => self.finish(&ticket, PollOutcome::Done(decoded), Some(result)),
                        Err(err) => {
                            info!(
                                task_id = task_id.as_str(),
                                message = err.message.as_str(),
                                "kube-guard task result rejected"
                            );
                            self.finish(&ticket, PollOutcome::Failed(err), None)
                        }
                    };
                }
                JobStatus::Failed | JobStatus::Restricted | JobStatus::Unknown => {
                    let fallback = if handle.status == JobStatus::Restricted {
                        RESTRICTED_MESSAGE
                    } else {
                        FAILED_MESSAGE
                    };
                    let err = classify_failure_text(
                        handle.failure_message(fallback),
                        Some(request_id.as_str()),
                    );
                    info!(
                        task_id = task_id.as_str(),
                        status = handle.status.as_str(),
                        kind = err.kind.name(),
                        "kube-guard task failed"
                    );
                    return self.finish(&ticket, PollOutcome::Failed(err), None);
                }
                JobStatus::Pending | JobStatus::Running => {
                    let status = handle.status;
                    self.observe(&ticket, |s| {
                        s.state = PollState::Polling;
                        s.job_status = Some(status);
                    });
                }
            }

            if Instant::now() >= deadline {
                continue;
            }
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                // Woken early by start() or stop() on this slot.
                _ = ticket.rx.changed() => {}
            }
        }
    }
}

fn status_path(template: &str, task_id: &str) -> String {
    template.replace("{id}", &utf8_percent_encode(task_id, TASK_ID_SEGMENT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_kind::ErrorKind;
    use crate::transport::{TransportError, TransportResponse};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Script {
        bodies: Mutex<VecDeque<Value>>,
        last: Value,
        calls: AtomicUsize,
        paths: Mutex<Vec<String>>,
    }

    impl Script {
        fn new(bodies: Vec<Value>, last: Value) -> Arc<Self> {
            Arc::new(Self {
                bodies: Mutex::new(bodies.into()),
                last,
                calls: AtomicUsize::new(0),
                paths: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for Script {
        async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.paths.lock().unwrap().push(request.path.clone());
            let body = self
                .bodies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.last.clone());
            Ok(TransportResponse::json(200, body))
        }
    }

    #[test]
    fn task_id_is_percent_encoded_into_the_status_path() {
        assert_eq!(status_path("/api/tasks/{id}", "a b/c"), "/api/tasks/a%20b%2Fc");
        assert_eq!(status_path("/api/tasks/{id}", "task-1_x.y~"), "/api/tasks/task-1_x.y~");
        assert_eq!(status_path("/t/{id}/status", "é"), "/t/%C3%A9/status");
    }

    #[tokio::test(start_paused = true)]
    async fn done_after_running_stops_polling() {
        let script = Script::new(
            vec![json!({"status": "RUNNING"})],
            json!({"task": {"status": "DONE", "result": {"n": 1}}}),
        );
        let poller = TaskPoller::new(script.clone(), "/api/tasks/{id}", PollOptions::default());

        let outcome = poller.start("t 1", None).await;
        assert_eq!(outcome, PollOutcome::Done(json!({"n": 1})));
        assert_eq!(script.calls.load(Ordering::SeqCst), 2);
        assert_eq!(script.paths.lock().unwrap()[0], "/api/tasks/t%201");

        let snap = poller.snapshot();
        assert_eq!(snap.state, PollState::Done);
        assert_eq!(snap.job_status, Some(JobStatus::Running));
        assert!(!snap.loading());
    }

    #[tokio::test(start_paused = true)]
    async fn restricted_uses_its_own_fallback_message() {
        let script = Script::new(vec![], json!({"status": "RESTRICTED"}));
        let poller = TaskPoller::new(script, "/t/{id}", PollOptions::default());
        match poller.start("t", None).await {
            PollOutcome::Failed(err) => {
                assert_eq!(err.kind, ErrorKind::System);
                assert!(err.message.starts_with("operation forbidden (request_id="));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_task_id_keeps_current_token() {
        let script = Script::new(vec![], json!({"status": "DONE"}));
        let poller = TaskPoller::new(script.clone(), "/t/{id}", PollOptions::default());
        let before = poller.snapshot().token;
        match poller.start("  ", None).await {
            PollOutcome::Failed(err) => assert_eq!(err.kind, ErrorKind::Param),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(poller.snapshot().token, before);
        assert_eq!(script.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_wakes_a_sleeping_loop() {
        let script = Script::new(vec![], json!({"status": "PENDING"}));
        let poller = TaskPoller::new(script.clone(), "/t/{id}", PollOptions::new(10_000, 600_000));
        let handle = tokio::spawn(poller.start("t", None));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(poller.snapshot().state, PollState::Polling);
        poller.stop();

        let outcome = handle.await.unwrap();
        assert!(outcome.is_cancelled());
        assert_eq!(poller.snapshot().state, PollState::Cancelled);
        assert_eq!(script.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_payload_is_recorded_as_failure() {
        let script = Script::new(vec![], json!({"status": "DONE", "result": {"n": "x"}}));
        let poller = TaskPoller::new(script, "/t/{id}", PollOptions::default());
        let ticket = poller.begin();
        let outcome = poller
            .poll_decoded(ticket, "t", None, |v| {
                v["n"]
                    .as_u64()
                    .ok_or_else(|| ClassifiedError::system("n is not a number"))
            })
            .await;
        assert_eq!(outcome, PollOutcome::Failed(ClassifiedError::system("n is not a number")));

        let snap = poller.snapshot();
        assert_eq!(snap.state, PollState::Failed);
        assert_eq!(snap.result, None);
        assert_eq!(snap.error, Some(ClassifiedError::system("n is not a number")));
    }

    #[tokio::test]
    async fn complete_ignores_superseded_tickets() {
        let script = Script::new(vec![], json!({}));
        let poller = TaskPoller::new(script, "/t/{id}", PollOptions::default());
        let old = poller.begin();
        let new = poller.begin();
        assert!(!poller.complete(&old, &Ok(json!("stale"))));
        assert!(poller.complete(&new, &Ok(json!("fresh"))));
        assert_eq!(poller.snapshot().result, Some(json!("fresh")));
    }
}
