//! Per-card resolution pipeline
//!
//! Tiers are consulted in a fixed order:
//! 1. store: card already persisted, nothing to do
//! 2. local snapshot: import the cached record
//! 3. remote source: only when enabled for the call and a source is attached
//! 4. retry backlog: record `(set, ordinal)` for later
//!
//! Nothing in here aborts a run. Every error is logged and the card is deferred.

use crate::cache::SnapshotCache;
use crate::db::CatalogStore;
use crate::error::{SyncError, SyncResult};
use crate::identifier;
use crate::services::backlog::{BacklogEntry, RetryBacklog};
use crate::services::remote_client::RemoteSource;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Whether the remote tier may be consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Store and local snapshots only
    #[default]
    LocalOnly,
    /// Also try the remote source before deferring
    WithRemote,
}

/// Why a card ended up in the backlog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferReason {
    /// No tier had the card
    NotFound,
    /// A tier failed; the message is the logged error
    Error(String),
}

/// Result of resolving one card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardOutcome {
    AlreadyPersisted,
    ImportedFromCache,
    ImportedFromRemote,
    Deferred(DeferReason),
}

/// One unit of work: the `ordinal`-th card of `set_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardTask {
    pub set_id: Arc<str>,
    pub ordinal: u32,
}

impl CardTask {
    pub fn new(set_id: impl Into<Arc<str>>, ordinal: u32) -> Self {
        Self {
            set_id: set_id.into(),
            ordinal,
        }
    }
}

/// Tiered resolution with injected store, cache, backlog and remote source
pub struct ResolutionPipeline {
    store: Arc<dyn CatalogStore>,
    cache: Arc<SnapshotCache>,
    backlog: Arc<RetryBacklog>,
    remote: Option<Arc<dyn RemoteSource>>,
}

impl ResolutionPipeline {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        cache: Arc<SnapshotCache>,
        backlog: Arc<RetryBacklog>,
    ) -> Self {
        Self {
            store,
            cache,
            backlog,
            remote: None,
        }
    }

    /// Attach a remote source; it is only used by calls in [`FetchMode::WithRemote`]
    pub fn with_remote(mut self, remote: Arc<dyn RemoteSource>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn backlog(&self) -> &Arc<RetryBacklog> {
        &self.backlog
    }

    /// Resolve one card, deferring it to the backlog if no tier succeeds
    pub async fn process(&self, task: &CardTask, mode: FetchMode) -> CardOutcome {
        let card_id = identifier::resolve(&task.set_id, task.ordinal);

        let outcome = match self.resolve_tiers(task, &card_id, mode).await {
            Ok(Some(outcome)) => outcome,
            Ok(None) => CardOutcome::Deferred(DeferReason::NotFound),
            Err(e) => {
                error!(card_id = %card_id, error = %e, "Card resolution failed");
                CardOutcome::Deferred(DeferReason::Error(e.to_string()))
            }
        };

        match &outcome {
            CardOutcome::Deferred(reason) => {
                debug!(card_id = %card_id, reason = ?reason, "Deferred to retry backlog");
                self.backlog
                    .push(BacklogEntry::new(&*task.set_id, task.ordinal));
            }
            resolved => debug!(card_id = %card_id, outcome = ?resolved, "Card resolved"),
        }

        outcome
    }

    /// Walk the tiers; `Ok(None)` when none of them has the card
    async fn resolve_tiers(
        &self,
        task: &CardTask,
        card_id: &str,
        mode: FetchMode,
    ) -> SyncResult<Option<CardOutcome>> {
        if self.store.row_exists(card_id).await? {
            return Ok(Some(CardOutcome::AlreadyPersisted));
        }

        if let Some(card) = self.cache.find_card(card_id, &task.set_id).await {
            self.store.upsert_cards(std::slice::from_ref(&card)).await?;
            return Ok(Some(CardOutcome::ImportedFromCache));
        }

        if mode == FetchMode::WithRemote {
            if let Some(remote) = &self.remote {
                if self.try_remote(remote.as_ref(), card_id).await {
                    return Ok(Some(CardOutcome::ImportedFromRemote));
                }
            }
        }

        Ok(None)
    }

    /// Single remote attempt; failures are logged and reported as "not imported"
    async fn try_remote(&self, remote: &dyn RemoteSource, card_id: &str) -> bool {
        let result: SyncResult<bool> = async {
            match remote.fetch_card(card_id).await? {
                Some(card) => {
                    self.store.upsert_cards(std::slice::from_ref(&card)).await?;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
        .await;

        match result {
            Ok(imported) => imported,
            Err(e) => {
                if matches!(e, SyncError::Store(_)) {
                    error!(card_id = %card_id, error = %e, "Storing remote card failed");
                } else {
                    warn!(card_id = %card_id, error = %e, "Remote lookup failed");
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SnapshotLoader;
    use crate::models::SetRow;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory store recording every call
    #[derive(Default)]
    struct FakeStore {
        rows: Mutex<HashMap<String, Value>>,
        exists_calls: AtomicUsize,
        upsert_calls: Mutex<Vec<Vec<Value>>>,
        fail_lookups: bool,
    }

    impl FakeStore {
        fn with_rows(ids: &[&str]) -> Self {
            let store = Self::default();
            for id in ids {
                store.rows.lock().unwrap().insert(id.to_string(), json!({"id": id}));
            }
            store
        }

        fn upserts(&self) -> Vec<Vec<Value>> {
            self.upsert_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CatalogStore for FakeStore {
        async fn row_exists(&self, card_id: &str) -> SyncResult<bool> {
            self.exists_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_lookups {
                return Err(SyncError::Store(sqlx::Error::PoolTimedOut));
            }
            Ok(self.rows.lock().unwrap().contains_key(card_id))
        }

        async fn upsert_cards(&self, documents: &[Value]) -> SyncResult<usize> {
            self.upsert_calls.lock().unwrap().push(documents.to_vec());
            let mut rows = self.rows.lock().unwrap();
            for doc in documents {
                let id = doc["id"].as_str().unwrap_or_default().to_string();
                rows.insert(id, doc.clone());
            }
            Ok(documents.len())
        }

        async fn upsert_sets(&self, documents: &[Value]) -> SyncResult<usize> {
            Ok(documents.len())
        }

        async fn sets_by_release_date(&self) -> SyncResult<Vec<SetRow>> {
            Ok(Vec::new())
        }
    }

    /// Snapshot loader serving fixed per-set documents
    #[derive(Default)]
    struct FakeLoader {
        sets: HashMap<String, Vec<Value>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SnapshotLoader for FakeLoader {
        async fn load(&self, set_id: &str) -> SyncResult<Vec<Value>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.sets.get(set_id).cloned().ok_or_else(|| SyncError::CacheRead {
                set_id: set_id.to_string(),
                reason: "not cached".to_string(),
            })
        }
    }

    /// Remote source with one optional card and an optional failure
    struct FakeRemote {
        card: Option<Value>,
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteSource for FakeRemote {
        async fn fetch_card(&self, _card_id: &str) -> SyncResult<Option<Value>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SyncError::Remote("503".to_string()));
            }
            Ok(self.card.clone())
        }
    }

    fn loader_with(set_id: &str, cards: Vec<Value>) -> Arc<FakeLoader> {
        let mut loader = FakeLoader::default();
        loader.sets.insert(set_id.to_string(), cards);
        Arc::new(loader)
    }

    fn pipeline(store: Arc<FakeStore>, loader: Arc<FakeLoader>) -> ResolutionPipeline {
        ResolutionPipeline::new(
            store,
            Arc::new(SnapshotCache::new(loader)),
            Arc::new(RetryBacklog::new()),
        )
    }

    #[tokio::test]
    async fn test_persisted_card_is_skipped() {
        let store = Arc::new(FakeStore::with_rows(&["base1-4"]));
        let loader = loader_with("base1", vec![json!({"id": "base1-4", "name": "Charizard"})]);
        let pipeline = pipeline(store.clone(), loader.clone());

        let outcome = pipeline.process(&CardTask::new("base1", 4), FetchMode::LocalOnly).await;

        assert_eq!(outcome, CardOutcome::AlreadyPersisted);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0, "No cache lookup");
        assert!(store.upserts().is_empty(), "No store write");
        assert!(pipeline.backlog().is_empty());
    }

    #[tokio::test]
    async fn test_cached_card_is_imported_once() {
        let store = Arc::new(FakeStore::default());
        let cached = json!({"id": "swshp-SWSH007", "name": "Rillaboom"});
        let loader = loader_with("swshp", vec![json!({"id": "swshp-SWSH006"}), cached.clone()]);
        let pipeline = pipeline(store.clone(), loader);

        let outcome = pipeline.process(&CardTask::new("swshp", 7), FetchMode::LocalOnly).await;

        assert_eq!(outcome, CardOutcome::ImportedFromCache);
        assert_eq!(store.upserts(), vec![vec![cached]]);
        assert!(pipeline.backlog().is_empty());
    }

    #[tokio::test]
    async fn test_missing_card_goes_to_backlog() {
        let store = Arc::new(FakeStore::default());
        let loader = loader_with("base1", vec![json!({"id": "base1-1"})]);
        let pipeline = pipeline(store.clone(), loader);

        let outcome = pipeline.process(&CardTask::new("base1", 2), FetchMode::LocalOnly).await;

        assert_eq!(outcome, CardOutcome::Deferred(DeferReason::NotFound));
        assert!(store.upserts().is_empty());
        assert_eq!(pipeline.backlog().entries(), vec![BacklogEntry::new("base1", 2)]);
    }

    #[tokio::test]
    async fn test_missing_snapshot_goes_to_backlog() {
        let store = Arc::new(FakeStore::default());
        let pipeline = pipeline(store.clone(), Arc::new(FakeLoader::default()));

        let outcome = pipeline.process(&CardTask::new("sv1", 1), FetchMode::LocalOnly).await;

        assert_eq!(outcome, CardOutcome::Deferred(DeferReason::NotFound));
        assert_eq!(pipeline.backlog().len(), 1);
    }

    #[tokio::test]
    async fn test_store_error_defers_instead_of_failing() {
        let store = Arc::new(FakeStore {
            fail_lookups: true,
            ..Default::default()
        });
        let pipeline = pipeline(store.clone(), Arc::new(FakeLoader::default()));

        let outcome = pipeline.process(&CardTask::new("base1", 1), FetchMode::LocalOnly).await;

        assert!(matches!(outcome, CardOutcome::Deferred(DeferReason::Error(_))));
        assert_eq!(pipeline.backlog().entries(), vec![BacklogEntry::new("base1", 1)]);
    }

    #[tokio::test]
    async fn test_remote_tier_ignored_in_local_mode() {
        let store = Arc::new(FakeStore::default());
        let remote = Arc::new(FakeRemote {
            card: Some(json!({"id": "base1-1", "name": "Alakazam"})),
            fail: false,
            calls: AtomicUsize::new(0),
        });
        let pipeline =
            pipeline(store.clone(), Arc::new(FakeLoader::default())).with_remote(remote.clone());

        let outcome = pipeline.process(&CardTask::new("base1", 1), FetchMode::LocalOnly).await;

        assert_eq!(outcome, CardOutcome::Deferred(DeferReason::NotFound));
        assert_eq!(remote.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remote_tier_imports_card() {
        let store = Arc::new(FakeStore::default());
        let card = json!({"id": "base1-1", "name": "Alakazam"});
        let remote = Arc::new(FakeRemote {
            card: Some(card.clone()),
            fail: false,
            calls: AtomicUsize::new(0),
        });
        let pipeline =
            pipeline(store.clone(), Arc::new(FakeLoader::default())).with_remote(remote.clone());

        let outcome = pipeline.process(&CardTask::new("base1", 1), FetchMode::WithRemote).await;

        assert_eq!(outcome, CardOutcome::ImportedFromRemote);
        assert_eq!(store.upserts(), vec![vec![card]]);
        assert!(pipeline.backlog().is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_falls_through_to_backlog() {
        let store = Arc::new(FakeStore::default());
        let remote = Arc::new(FakeRemote {
            card: None,
            fail: true,
            calls: AtomicUsize::new(0),
        });
        let pipeline =
            pipeline(store.clone(), Arc::new(FakeLoader::default())).with_remote(remote.clone());

        let outcome = pipeline.process(&CardTask::new("base1", 1), FetchMode::WithRemote).await;

        assert_eq!(outcome, CardOutcome::Deferred(DeferReason::NotFound));
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1, "Single attempt");
        assert_eq!(pipeline.backlog().len(), 1);
    }

    #[tokio::test]
    async fn test_cache_tier_wins_over_remote() {
        let store = Arc::new(FakeStore::default());
        let loader = loader_with("base1", vec![json!({"id": "base1-1", "name": "Alakazam"})]);
        let remote = Arc::new(FakeRemote {
            card: None,
            fail: false,
            calls: AtomicUsize::new(0),
        });
        let pipeline = pipeline(store.clone(), loader).with_remote(remote.clone());

        let outcome = pipeline.process(&CardTask::new("base1", 1), FetchMode::WithRemote).await;

        assert_eq!(outcome, CardOutcome::ImportedFromCache);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 0);
    }
}
