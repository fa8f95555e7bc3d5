//! Retry backlog
//!
//! Cards that no tier could resolve are recorded here for the whole run.
//! Exporting or re-queuing the backlog is left to the caller.

use crate::error::SyncResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// One unresolved card
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogEntry {
    pub set_id: String,
    pub ordinal: u32,
}

impl BacklogEntry {
    pub fn new(set_id: impl Into<String>, ordinal: u32) -> Self {
        Self {
            set_id: set_id.into(),
            ordinal,
        }
    }
}

/// Append-only list of unresolved cards, safe to share between workers
#[derive(Debug, Default)]
pub struct RetryBacklog {
    entries: Mutex<Vec<BacklogEntry>>,
}

impl RetryBacklog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: BacklogEntry) {
        self.lock().push(entry);
    }

    /// Snapshot of all entries in append order
    pub fn entries(&self) -> Vec<BacklogEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove and return all entries
    pub fn drain(&self) -> Vec<BacklogEntry> {
        std::mem::take(&mut *self.lock())
    }

    /// Write the current entries as a JSON array
    pub async fn export_json(&self, path: &Path) -> SyncResult<usize> {
        let entries = self.entries();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, serde_json::to_string_pretty(&entries)?).await?;

        info!("Exported {} backlog entries to {}", entries.len(), path.display());
        Ok(entries.len())
    }

    /// Read entries previously written by [`RetryBacklog::export_json`]
    pub async fn load_json(path: &Path) -> SyncResult<Vec<BacklogEntry>> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    // A panicking pusher cannot leave a half-written Vec, so poisoning is ignored
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<BacklogEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
