use super::coerce::{load_snapshot, safe_band};
use super::snapshot::{FormParams, HistoryEntry, PersistedSnapshot, HISTORY_LIMIT, SNAPSHOT_KEY};
use super::store::SnapshotStore;
use crate::types::SuggestionsResponse;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use uuid::Uuid;

/// Result of writing the snapshot after an action. Failures are reported, not raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Saved,
    Failed(String),
}

impl PersistOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, PersistOutcome::Saved)
    }
}

/// In-memory suggestions state backed by a [`SnapshotStore`].
///
/// Read once on [`open`](Self::open); every mutating action writes the entire snapshot.
pub struct SuggestionsState {
    store: Arc<dyn SnapshotStore>,
    snapshot: PersistedSnapshot,
}

impl SuggestionsState {
    pub async fn open(store: Arc<dyn SnapshotStore>) -> Self {
        let snapshot = match store.read(SNAPSHOT_KEY).await {
            Ok(Some(raw)) => load_snapshot(&raw),
            Ok(None) => PersistedSnapshot::default(),
            Err(e) => {
                warn!(store = store.name(), error = %e, "failed to read suggestions snapshot");
                PersistedSnapshot::default()
            }
        };
        debug!(
            store = store.name(),
            history = snapshot.history.len(),
            has_result = snapshot.last_result.is_some(),
            "suggestions state loaded"
        );
        Self { store, snapshot }
    }

    pub fn snapshot(&self) -> &PersistedSnapshot {
        &self.snapshot
    }

    pub fn form(&self) -> &FormParams {
        &self.snapshot.form
    }

    pub fn last_result(&self) -> Option<&SuggestionsResponse> {
        self.snapshot.last_result.as_ref()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.snapshot.history
    }

    /// Replaces the form. The safe band goes through the same clamp as on load.
    pub async fn set_form(&mut self, mut form: FormParams) -> PersistOutcome {
        let (low, high) = safe_band(form.safe_low, form.safe_high);
        form.safe_low = low;
        form.safe_high = high;
        self.snapshot.form = form;
        self.persist().await
    }

    pub async fn set_result(&mut self, resp: SuggestionsResponse) -> PersistOutcome {
        self.snapshot.last_result = Some(resp);
        self.persist().await
    }

    /// Records `resp` as the newest history entry and as the current result.
    pub async fn push_history(&mut self, resp: SuggestionsResponse) -> PersistOutcome {
        let entry = HistoryEntry {
            id: Uuid::new_v4().to_string(),
            ts: now_millis(),
            form: self.snapshot.form.clone(),
            resp: resp.clone(),
        };
        self.snapshot.history.insert(0, entry);
        self.snapshot.history.truncate(HISTORY_LIMIT);
        self.snapshot.last_result = Some(resp);
        self.persist().await
    }

    pub async fn remove_history(&mut self, id: &str) -> PersistOutcome {
        self.snapshot.history.retain(|e| e.id != id);
        if self.snapshot.history.is_empty() {
            self.snapshot.last_result = None;
        }
        self.persist().await
    }

    pub async fn clear_history(&mut self) -> PersistOutcome {
        self.snapshot.history.clear();
        self.snapshot.last_result = None;
        self.persist().await
    }

    /// Drops the current result and the pod selection; other form fields are kept.
    pub async fn reset(&mut self) -> PersistOutcome {
        self.snapshot.last_result = None;
        self.snapshot.form.pod.clear();
        self.persist().await
    }

    async fn persist(&self) -> PersistOutcome {
        let raw = match serde_json::to_string(&self.snapshot) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to encode suggestions snapshot");
                return PersistOutcome::Failed(e.to_string());
            }
        };
        match self.store.write(SNAPSHOT_KEY, &raw).await {
            Ok(()) => PersistOutcome::Saved,
            Err(e) => {
                warn!(store = self.store.name(), error = %e, "failed to persist suggestions snapshot");
                PersistOutcome::Failed(e.to_string())
            }
        }
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
