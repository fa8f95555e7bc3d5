//! Run orchestrator
//!
//! Walks the set catalog newest release first and drives every card of a set
//! through the resolution pipeline on a bounded worker pool. Sets are handled
//! one after another; a fresh pool is used per set.

use crate::db::CatalogStore;
use crate::error::SyncResult;
use crate::services::backlog::BacklogEntry;
use crate::services::pipeline::{CardOutcome, CardTask, FetchMode, ResolutionPipeline};
use crate::services::scheduler::run_bounded;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Totals of one run or retry pass
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sets: usize,
    pub claimed: usize,
    pub already_persisted: usize,
    pub imported_from_cache: usize,
    pub imported_from_remote: usize,
    pub deferred: usize,
    /// Backlog size when the run finished
    pub backlog_len: usize,
}

/// Outcome counters shared by the workers of a run
#[derive(Debug, Default)]
struct OutcomeCounters {
    already_persisted: AtomicUsize,
    imported_from_cache: AtomicUsize,
    imported_from_remote: AtomicUsize,
    deferred: AtomicUsize,
}

impl OutcomeCounters {
    fn record(&self, outcome: &CardOutcome) {
        let counter = match outcome {
            CardOutcome::AlreadyPersisted => &self.already_persisted,
            CardOutcome::ImportedFromCache => &self.imported_from_cache,
            CardOutcome::ImportedFromRemote => &self.imported_from_remote,
            CardOutcome::Deferred(_) => &self.deferred,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Drives whole-catalog runs and backlog retries
pub struct SyncOrchestrator {
    store: Arc<dyn CatalogStore>,
    pipeline: Arc<ResolutionPipeline>,
    concurrency: usize,
}

impl SyncOrchestrator {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        pipeline: Arc<ResolutionPipeline>,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            pipeline,
            concurrency,
        }
    }

    pub fn pipeline(&self) -> &Arc<ResolutionPipeline> {
        &self.pipeline
    }

    /// Synchronize every known set, newest release first
    ///
    /// Only a failure to read the set catalog aborts the run; per-card
    /// failures end up in the backlog.
    pub async fn run(&self, mode: FetchMode) -> SyncResult<RunSummary> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(run_id = %run_id, mode = ?mode, "Starting catalog sync");

        let sets = self.store.sets_by_release_date().await?;
        let counters = Arc::new(OutcomeCounters::default());
        let mut claimed = 0;

        for set in sets.iter().rev() {
            let tasks = card_tasks(&set.id, set.total);
            claimed += self.dispatch_set(&set.id, tasks, mode, &counters).await;
        }

        Ok(self.summarize(run_id, started_at, sets.len(), claimed, &counters))
    }

    /// Re-run backlog entries through the pipeline
    ///
    /// Entries are grouped by set in first-seen order; within a set they keep
    /// their original order. Cards that still cannot be resolved are appended
    /// to the pipeline's backlog again.
    pub async fn retry(&self, entries: Vec<BacklogEntry>, mode: FetchMode) -> RunSummary {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(run_id = %run_id, entries = entries.len(), "Starting backlog retry");

        let groups = group_by_set(entries);
        let counters = Arc::new(OutcomeCounters::default());
        let mut claimed = 0;

        for (set_id, ordinals) in &groups {
            let set_id: Arc<str> = Arc::from(set_id.as_str());
            let tasks = ordinals
                .iter()
                .map(|&ordinal| CardTask::new(Arc::clone(&set_id), ordinal))
                .collect();
            claimed += self.dispatch_set(&set_id, tasks, mode, &counters).await;
        }

        self.summarize(run_id, started_at, groups.len(), claimed, &counters)
    }

    async fn dispatch_set(
        &self,
        set_id: &str,
        tasks: Vec<CardTask>,
        mode: FetchMode,
        counters: &Arc<OutcomeCounters>,
    ) -> usize {
        let deferred_before = OutcomeCounters::get(&counters.deferred);
        let pipeline = Arc::clone(&self.pipeline);
        let set_counters = Arc::clone(counters);

        let claimed = run_bounded(tasks, self.concurrency, move |task: CardTask| {
            let pipeline = Arc::clone(&pipeline);
            let counters = Arc::clone(&set_counters);
            async move {
                let outcome = pipeline.process(&task, mode).await;
                counters.record(&outcome);
            }
        })
        .await;

        info!(
            set_id = %set_id,
            claimed,
            deferred = OutcomeCounters::get(&counters.deferred) - deferred_before,
            "Set processed"
        );
        claimed
    }

    fn summarize(
        &self,
        run_id: Uuid,
        started_at: DateTime<Utc>,
        sets: usize,
        claimed: usize,
        counters: &OutcomeCounters,
    ) -> RunSummary {
        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            sets,
            claimed,
            already_persisted: OutcomeCounters::get(&counters.already_persisted),
            imported_from_cache: OutcomeCounters::get(&counters.imported_from_cache),
            imported_from_remote: OutcomeCounters::get(&counters.imported_from_remote),
            deferred: OutcomeCounters::get(&counters.deferred),
            backlog_len: self.pipeline.backlog().len(),
        };

        info!(
            run_id = %summary.run_id,
            sets = summary.sets,
            claimed = summary.claimed,
            persisted = summary.already_persisted,
            cached = summary.imported_from_cache,
            remote = summary.imported_from_remote,
            deferred = summary.deferred,
            "Run complete"
        );
        summary
    }
}

/// Largest set total accepted; anything above is treated as corrupt data
pub const MAX_SET_TOTAL: i64 = 10_000;

/// Tasks for ordinals `1..=total`
///
/// None when the total is unknown, not positive, or above [`MAX_SET_TOTAL`].
fn card_tasks(set_id: &str, total: Option<i64>) -> Vec<CardTask> {
    let total = match total {
        Some(total) if total > MAX_SET_TOTAL => {
            warn!(set_id = %set_id, total, "Set total exceeds {}, skipping set", MAX_SET_TOTAL);
            return Vec::new();
        }
        // Bounded by MAX_SET_TOTAL above
        Some(total) if total > 0 => total as u32,
        _ => return Vec::new(),
    };
    let set_id: Arc<str> = Arc::from(set_id);
    (1..=total)
        .map(|ordinal| CardTask::new(Arc::clone(&set_id), ordinal))
        .collect()
}

fn group_by_set(entries: Vec<BacklogEntry>) -> Vec<(String, Vec<u32>)> {
    let mut groups: Vec<(String, Vec<u32>)> = Vec::new();
    for entry in entries {
        match groups.iter_mut().find(|(set_id, _)| *set_id == entry.set_id) {
            Some((_, ordinals)) => ordinals.push(entry.ordinal),
            None => groups.push((entry.set_id, vec![entry.ordinal])),
        }
    }
    groups
}
