//! Catalog store
//!
//! [`CatalogStore`] is the only component that writes the `sets` and `cards`
//! tables; `catalog_values` is maintained through [`SqliteCatalogStore`].
//! The engine receives the store as an injected handle, so the resolution
//! pipeline can be exercised against an in-memory fake.

pub mod cards;
pub mod catalog_values;
pub mod sets;

use crate::error::SyncResult;
use crate::models::{CardRow, SetRow};
use catalog_values::{CatalogCategory, CategoryValues};
use chrono::{DateTime, Utc};
use ptcg_common::db::{create_cards_table, create_catalog_values_table, create_sets_table};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::SqlitePool;
use std::path::Path;

/// Row-level store used by the sync engine
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Point lookup on the card primary key
    async fn row_exists(&self, card_id: &str) -> SyncResult<bool>;

    /// Insert or fully replace card rows in one transaction
    ///
    /// Returns the number of rows written. Any bad record rolls back the
    /// whole batch.
    async fn upsert_cards(&self, documents: &[Value]) -> SyncResult<usize>;

    /// Insert or fully replace set rows in one transaction
    async fn upsert_sets(&self, documents: &[Value]) -> SyncResult<usize>;

    /// All sets, oldest release first
    async fn sets_by_release_date(&self) -> SyncResult<Vec<SetRow>>;
}

/// SQLite-backed [`CatalogStore`]
#[derive(Clone)]
pub struct SqliteCatalogStore {
    pool: SqlitePool,
}

impl SqliteCatalogStore {
    /// Wrap an existing pool, creating any missing catalog table
    pub async fn new(pool: SqlitePool) -> SyncResult<Self> {
        create_sets_table(&pool).await?;
        create_cards_table(&pool).await?;
        create_catalog_values_table(&pool).await?;
        Ok(Self { pool })
    }

    /// Open (or create) the database file and its catalog tables
    pub async fn open(db_path: &Path) -> SyncResult<Self> {
        let pool = ptcg_common::db::init_database(db_path).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Load a card row by id
    pub async fn load_card(&self, card_id: &str) -> SyncResult<Option<CardRow>> {
        cards::load_card(&self.pool, card_id).await
    }

    /// Number of card rows
    pub async fn count_cards(&self) -> SyncResult<i64> {
        cards::count_cards(&self.pool).await
    }

    /// Replace the card vocabulary with `values`, stamped `synced_at`
    pub async fn upsert_catalog_values(
        &self,
        values: &[CategoryValues],
        synced_at: DateTime<Utc>,
    ) -> SyncResult<usize> {
        catalog_values::upsert_catalog_values(&self.pool, values, synced_at).await
    }

    /// Stored vocabulary of one category
    pub async fn catalog_values(&self, category: CatalogCategory) -> SyncResult<Vec<String>> {
        catalog_values::catalog_values(&self.pool, category).await
    }

    /// Vocabulary found on stored cards
    pub async fn derive_catalog_values(&self) -> SyncResult<Vec<CategoryValues>> {
        catalog_values::derive_from_cards(&self.pool).await
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn row_exists(&self, card_id: &str) -> SyncResult<bool> {
        cards::card_exists(&self.pool, card_id).await
    }

    async fn upsert_cards(&self, documents: &[Value]) -> SyncResult<usize> {
        cards::upsert_cards(&self.pool, documents).await
    }

    async fn upsert_sets(&self, documents: &[Value]) -> SyncResult<usize> {
        sets::upsert_sets(&self.pool, documents).await
    }

    async fn sets_by_release_date(&self) -> SyncResult<Vec<SetRow>> {
        sets::sets_by_release_date(&self.pool).await
    }
}

/// Single-connection in-memory pool for unit tests
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database")
}
