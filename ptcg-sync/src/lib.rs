//! ptcg-sync: Pokémon TCG catalog synchronization engine
//!
//! Fills a relational catalog (`sets`, `cards`) from per-set local snapshots
//! and, optionally, a remote catalog API. Cards that cannot be resolved are
//! collected in a retry backlog instead of failing the run. The card
//! vocabulary (types, subtypes, rarities, ...) is kept in `catalog_values`.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod identifier;
pub mod models;
pub mod services;

pub use crate::cache::{FsSnapshotLoader, SnapshotCache, SnapshotLoader};
pub use crate::config::{ConfigOverrides, SyncConfig};
pub use crate::db::catalog_values::CatalogCategory;
pub use crate::db::{CatalogStore, SqliteCatalogStore};
pub use crate::error::{SyncError, SyncResult};
pub use crate::services::{
    BacklogEntry, CardOutcome, CardTask, FetchMode, ResolutionPipeline, RetryBacklog, RunSummary,
    SyncOrchestrator,
};
