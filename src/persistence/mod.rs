//! 本地状态持久化：建议表单、最近结果与历史记录的存储、容错加载和整体原子写入。
//!
//! # Suggestions state persistence
//!
//! The suggestions screen keeps its form, last result and a bounded history across
//! sessions. The stored blob is untrusted on read: [`load_snapshot`] validates each
//! field on its own and never fails.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`PersistedSnapshot`] | Form, last result and history as stored |
//! | [`load_snapshot`] | Fail-soft coercion of a raw blob |
//! | [`SnapshotStore`] | Storage trait; [`FileSnapshotStore`] and [`MemorySnapshotStore`] |
//! | [`SuggestionsState`] | Actions that mutate the snapshot and write it whole |
//!
//! ## Example
//!
//! ```rust,no_run
//! use kube_guard_client::persistence::{FileSnapshotStore, SuggestionsState};
//! use std::sync::Arc;
//!
//! # async fn demo() {
//! let store = Arc::new(FileSnapshotStore::new("/var/lib/kube-guard"));
//! let mut state = SuggestionsState::open(store).await;
//! let request = state.form().to_descriptor();
//! # let _ = request;
//! state.clear_history().await;
//! # }
//! ```

pub mod coerce;
pub mod snapshot;
pub mod state;
pub mod store;

pub use coerce::{load_snapshot, snapshot_from_value};
pub use snapshot::{FormParams, HistoryEntry, PersistedSnapshot, HISTORY_LIMIT, SNAPSHOT_KEY};
pub use state::{PersistOutcome, SuggestionsState};
pub use store::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
