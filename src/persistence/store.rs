//! Snapshot storage backends.

use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Key-value storage for serialized snapshots. A write replaces the whole value.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>>;
    async fn write(&self, key: &str, value: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// One `<key>.json` file per key under a directory.
///
/// Writes go to a sibling `.tmp` file that is then renamed over the target, so a
/// crash mid-write leaves either the old snapshot or the new one.
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(Error::runtime_with_context(
                format!("invalid snapshot key '{}'", key),
                ErrorContext::new()
                    .with_details("expected [A-Za-z0-9._-], not starting with '.'")
                    .with_source("file_snapshot_store"),
            ));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[derive(Default)]
pub struct MemorySnapshotStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `value` under `key`.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::default();
        if let Ok(mut entries) = store.entries.write() {
            entries.insert(key.into(), value.into());
        }
        store
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("kube-guard-store-{}-{}", tag, uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn file_store_replaces_whole_value_and_leaves_no_tmp() {
        let dir = scratch_dir("replace");
        let store = FileSnapshotStore::new(&dir);
        assert_eq!(store.read("snap").await.unwrap(), None);

        store.write("snap", r#"{"v":1}"#).await.unwrap();
        store.write("snap", r#"{"v":2}"#).await.unwrap();
        assert_eq!(store.read("snap").await.unwrap().as_deref(), Some(r#"{"v":2}"#));
        assert!(!dir.join("snap.json.tmp").exists());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn file_store_rejects_path_like_keys() {
        let store = FileSnapshotStore::new(scratch_dir("keys"));
        let err = store.write("../escape", "{}").await.unwrap_err();
        assert!(matches!(err, Error::Runtime { .. }));
        assert!(store.read("").await.is_err());
    }

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemorySnapshotStore::with_entry("a", "1");
        assert_eq!(store.read("a").await.unwrap().as_deref(), Some("1"));
        store.write("a", "2").await.unwrap();
        assert_eq!(store.read("a").await.unwrap().as_deref(), Some("2"));
        assert_eq!(store.name(), "memory");
    }
}
