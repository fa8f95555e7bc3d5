//! Test Helper Utilities
//!
//! Temporary catalogs, snapshot trees and document builders shared by the
//! integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use ptcg_sync::{
    FsSnapshotLoader, ResolutionPipeline, RetryBacklog, SnapshotCache, SnapshotLoader,
    SqliteCatalogStore, SyncOrchestrator, SyncResult,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Temporary workspace: database file plus snapshot root
///
/// The TempDir must be kept alive for the duration of the test.
pub struct TestCatalog {
    pub temp_dir: TempDir,
    pub store: SqliteCatalogStore,
}

impl TestCatalog {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteCatalogStore::open(&temp_dir.path().join("catalog.db"))
            .await
            .unwrap();
        Self { temp_dir, store }
    }

    pub fn db_path(&self) -> PathBuf {
        self.temp_dir.path().join("catalog.db")
    }

    pub fn data_root(&self) -> PathBuf {
        self.temp_dir.path().join("data")
    }

    /// Write `cards` as the English snapshot of `set_id`
    pub fn write_snapshot(&self, set_id: &str, cards: &[Value]) {
        write_snapshot(&self.data_root(), "en", set_id, cards);
    }

    /// Orchestrator over the English snapshots with a fresh backlog
    pub fn orchestrator(&self, concurrency: usize) -> SyncOrchestrator {
        let loader = FsSnapshotLoader::new(self.data_root(), "en");
        self.orchestrator_with_loader(Arc::new(loader), concurrency)
    }

    pub fn orchestrator_with_loader(
        &self,
        loader: Arc<dyn SnapshotLoader>,
        concurrency: usize,
    ) -> SyncOrchestrator {
        let store = Arc::new(self.store.clone());
        let pipeline = ResolutionPipeline::new(
            store.clone(),
            Arc::new(SnapshotCache::new(loader)),
            Arc::new(RetryBacklog::new()),
        );
        SyncOrchestrator::new(store, Arc::new(pipeline), concurrency)
    }
}

pub fn write_snapshot(root: &Path, language: &str, set_id: &str, cards: &[Value]) {
    let dir = root.join("cards").join(language);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join(format!("{}.json", set_id)),
        serde_json::to_string(cards).unwrap(),
    )
    .unwrap();
}

/// Set record as returned by the sets listing
pub fn set_doc(id: &str, name: &str, total: i64, release_date: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "series": "Test",
        "printedTotal": total,
        "total": total,
        "legalities": {"unlimited": "Legal"},
        "releaseDate": release_date,
        "updatedAt": "2024/01/01 00:00:00",
        "images": {
            "symbol": format!("https://images.example/{}/symbol.png", id),
            "logo": format!("https://images.example/{}/logo.png", id)
        }
    })
}

/// Card record carrying a snapshot of its set
pub fn card_doc(card_id: &str, name: &str, set: &Value) -> Value {
    json!({
        "id": card_id,
        "name": name,
        "supertype": "Pokémon",
        "subtypes": ["Basic"],
        "hp": "60",
        "types": ["Colorless"],
        "number": card_id.rsplit('-').next().unwrap_or_default(),
        "rarity": "Common",
        "set": set,
        "images": {"small": format!("https://images.example/{}.png", card_id)}
    })
}

/// Loader that records the order sets are requested in
pub struct RecordingLoader {
    inner: FsSnapshotLoader,
    pub requested: Mutex<Vec<String>>,
}

impl RecordingLoader {
    pub fn new(inner: FsSnapshotLoader) -> Self {
        Self {
            inner,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotLoader for RecordingLoader {
    async fn load(&self, set_id: &str) -> SyncResult<Vec<Value>> {
        self.requested.lock().unwrap().push(set_id.to_string());
        self.inner.load(set_id).await
    }
}
