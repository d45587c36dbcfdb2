//! # kube-guard-client
//!
//! 客户端编排层：统一同步/异步 AI 操作的结果解析、任务轮询、错误分类与本地状态恢复。
//!
//! Client-side orchestration layer between a UI and the Kube-Guard backend, which runs
//! slow analytical operations (forecasting, suggestion generation, remediation
//! execution) either inline or as background tasks.
//!
//! ## Overview
//!
//! A caller submits a [`RequestDescriptor`] and gets back a typed result or a
//! [`ClassifiedError`]. Whether the backend answered inline or handed out a task id that
//! had to be polled is invisible to the caller.
//!
//! ## Key Features
//!
//! - **Shape arbitration**: [`client::normalize`] decides between a terminal body and a job handle
//! - **Task polling**: [`TaskPoller`] drives a bounded, token-guarded poll loop
//! - **Error taxonomy**: every failure maps to one of `param`, `expired`, `unsupported`, `system`
//! - **Suggestion identity**: [`suggestions::derive_key`] builds stable row keys for feedback
//! - **Snapshot recovery**: [`persistence::load_snapshot`] rehydrates untrusted persisted state
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kube_guard_client::{OpsClientBuilder, RequestDescriptor, Target};
//!
//! #[tokio::main]
//! async fn main() -> kube_guard_client::Result<()> {
//!     let client = OpsClientBuilder::new()
//!         .base_url("http://127.0.0.1:8000")
//!         .token("secret")
//!         .build()?;
//!
//!     let request = RequestDescriptor::forecast(Target::NodeCpu).node("worker-1");
//!     match client.forecast(&request).await {
//!         Ok(resp) => println!("{} forecast points", resp.forecast.len()),
//!         Err(err) => eprintln!("[{}] {}", err.kind, err.message),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client, builder, validation, shape arbitration, error classification |
//! | [`tasks`] | Job handles and the task poller |
//! | [`transport`] | Transport trait and the reqwest-backed implementation |
//! | [`types`] | Request descriptors and typed results |
//! | [`suggestions`] | Suggestion row-key derivation |
//! | [`persistence`] | Snapshot coercion, storage and state actions |
//! | [`config`] | Client configuration (YAML + env) |

pub mod client;
pub mod config;
pub mod error_kind;
pub mod persistence;
pub mod suggestions;
pub mod tasks;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::error_classification::{classify, classify_message};
pub use client::{OpsClient, OpsClientBuilder, Resolution};
pub use config::ClientConfig;
pub use error_kind::{ErrorKind, Remediation};
pub use tasks::poller::{PollOutcome, TaskPoller};
pub use tasks::{JobHandle, JobStatus, PollOptions, PollState};
pub use types::{Operation, RequestDescriptor, ScalePolicy, Target};

/// Result type alias for infrastructure calls
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for operations whose failures are always classified
pub type OpResult<T> = std::result::Result<T, ClassifiedError>;

/// Error type for the library
pub mod error;
pub use error::{ClassifiedError, Error, ErrorContext};
