//! Local snapshot tier
//!
//! Each set has one snapshot document per language: a JSON array of card
//! records. [`SnapshotCache`] memoizes loads per set id, including misses, so
//! every worker of a run shares at most one load per set.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

/// Cards of one set, as loaded from its snapshot
pub type Snapshot = Arc<Vec<Value>>;

/// Source of per-set snapshot documents
#[async_trait]
pub trait SnapshotLoader: Send + Sync {
    /// Load the snapshot for `set_id`
    ///
    /// Any failure (missing, unreadable, wrong shape) is reported as
    /// [`SyncError::CacheRead`].
    async fn load(&self, set_id: &str) -> SyncResult<Vec<Value>>;
}

/// Reads `{data_root}/cards/{language}/{set_id}.json`
#[derive(Debug, Clone)]
pub struct FsSnapshotLoader {
    data_root: PathBuf,
    language: String,
}

impl FsSnapshotLoader {
    pub fn new(data_root: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            data_root: data_root.into(),
            language: language.into(),
        }
    }

    /// Location of the snapshot document for a set
    pub fn snapshot_path(&self, set_id: &str) -> PathBuf {
        self.data_root
            .join("cards")
            .join(&self.language)
            .join(format!("{}.json", set_id))
    }
}

fn cache_error(set_id: &str, path: &Path, reason: impl std::fmt::Display) -> SyncError {
    SyncError::CacheRead {
        set_id: set_id.to_string(),
        reason: format!("{}: {}", path.display(), reason),
    }
}

#[async_trait]
impl SnapshotLoader for FsSnapshotLoader {
    async fn load(&self, set_id: &str) -> SyncResult<Vec<Value>> {
        let path = self.snapshot_path(set_id);

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| cache_error(set_id, &path, e))?;

        let document: Value =
            serde_json::from_str(&content).map_err(|e| cache_error(set_id, &path, e))?;

        match document {
            Value::Array(cards) => Ok(cards),
            _ => Err(cache_error(set_id, &path, "top-level value is not an array")),
        }
    }
}

/// Memoizing front of a [`SnapshotLoader`]
///
/// Lives for one run; there is no invalidation.
pub struct SnapshotCache {
    loader: Arc<dyn SnapshotLoader>,
    entries: Mutex<HashMap<String, Arc<OnceCell<Option<Snapshot>>>>>,
}

impl SnapshotCache {
    pub fn new(loader: Arc<dyn SnapshotLoader>) -> Self {
        Self {
            loader,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Snapshot for `set_id`, loading it on first use
    ///
    /// Returns `None` when the snapshot is unavailable; the miss is logged
    /// once and remembered.
    pub async fn get_or_load(&self, set_id: &str) -> Option<Snapshot> {
        let cell = {
            let mut entries = self.entries.lock().await;
            entries
                .entry(set_id.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        cell.get_or_init(|| async {
            match self.loader.load(set_id).await {
                Ok(cards) => {
                    debug!(set_id = %set_id, cards = cards.len(), "Loaded set snapshot");
                    Some(Arc::new(cards))
                }
                Err(e) => {
                    warn!(set_id = %set_id, error = %e, "Set snapshot unavailable");
                    None
                }
            }
        })
        .await
        .clone()
    }

    /// First card of the set snapshot whose `id` equals `card_id`
    pub async fn find_card(&self, card_id: &str, set_id: &str) -> Option<Value> {
        let snapshot = self.get_or_load(set_id).await?;
        snapshot
            .iter()
            .find(|card| card.get("id").and_then(Value::as_str) == Some(card_id))
            .cloned()
    }
}
