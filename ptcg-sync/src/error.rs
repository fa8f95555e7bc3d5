//! Error types for ptcg-sync
//!
//! Variants follow the failure taxonomy of a sync run:
//! - `Store`: connection/query failure, fatal for the triggering operation
//! - `CacheRead`: missing or malformed snapshot, downgraded to "absent" by the cache
//! - `MalformedDocument` / `InvalidRecord`: bad bulk input, fatal for that import call

use thiserror::Error;

/// Sync engine error type
#[derive(Debug, Error)]
pub enum SyncError {
    /// Relational store failure
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Snapshot document could not be used
    #[error("Snapshot for set {set_id} unavailable: {reason}")]
    CacheRead { set_id: String, reason: String },

    /// Bulk import document has the wrong top-level shape
    #[error("Malformed import document: {0}")]
    MalformedDocument(String),

    /// One record of a batch is unusable; the whole batch is rolled back
    #[error("Invalid record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    /// Remote catalog lookup failed
    #[error("Remote error: {0}")]
    Remote(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ptcg-common error
    #[error("Common error: {0}")]
    Common(#[from] ptcg_common::Error),
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
