//! Bounded task scheduler
//!
//! A fixed set of workers drains one task list. Workers claim tasks through a
//! shared atomic cursor, so claims follow input order and no task is claimed
//! twice; completion order is unspecified. The scheduler has no retry logic:
//! handlers deal with their own failures.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error};

/// Run `handler` over every task with at most `limit` in flight
///
/// Spawns `min(limit, tasks.len())` workers (a limit of 0 is treated as 1).
/// Each worker runs its handler to completion before claiming the next task.
/// Returns once every task has been claimed and handled, with the number of
/// tasks claimed.
pub async fn run_bounded<T, F, Fut>(tasks: Vec<T>, limit: usize, handler: F) -> usize
where
    T: Clone + Send + Sync + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    if tasks.is_empty() {
        return 0;
    }

    let total = tasks.len();
    let workers = limit.max(1).min(total);
    let tasks = Arc::new(tasks);
    let cursor = Arc::new(AtomicUsize::new(0));
    let claimed = Arc::new(AtomicUsize::new(0));
    let handler = Arc::new(handler);

    debug!(tasks = total, workers, "Starting bounded dispatch");

    let mut join_set = JoinSet::new();
    for worker_id in 0..workers {
        let tasks = Arc::clone(&tasks);
        let cursor = Arc::clone(&cursor);
        let claimed = Arc::clone(&claimed);
        let handler = Arc::clone(&handler);

        join_set.spawn(async move {
            loop {
                let index = cursor.fetch_add(1, Ordering::SeqCst);
                if index >= tasks.len() {
                    break;
                }
                claimed.fetch_add(1, Ordering::SeqCst);
                handler(tasks[index].clone()).await;
            }
            worker_id
        });
    }

    while let Some(result) = join_set.join_next().await {
        match result {
            Ok(worker_id) => debug!(worker_id, "Worker finished"),
            Err(e) => error!(error = %e, "Worker aborted"),
        }
    }

    claimed.load(Ordering::SeqCst)
}
