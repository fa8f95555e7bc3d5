//! Card vocabulary table
//!
//! Distinct values of the card classification fields (types, supertypes,
//! subtypes, rarities), keyed by `(category, value)`. A refresh writes every
//! value it knows with one timestamp, then prunes rows older than it.

use crate::error::SyncResult;
use chrono::{DateTime, SecondsFormat, Utc};
use ptcg_common::db::create_catalog_values_table;
use serde_json::json;
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use tracing::{debug, info};

const CATALOG_UPSERT_SQL: &str = r#"
    INSERT INTO catalog_values (category, value, data, last_synced_at)
    VALUES (?, ?, ?, ?)
    ON CONFLICT(category, value) DO UPDATE SET
        data = excluded.data,
        last_synced_at = excluded.last_synced_at
"#;

/// Classification field a catalog value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogCategory {
    Type,
    Supertype,
    Subtype,
    Rarity,
}

impl CatalogCategory {
    pub const ALL: [CatalogCategory; 4] = [
        CatalogCategory::Type,
        CatalogCategory::Supertype,
        CatalogCategory::Subtype,
        CatalogCategory::Rarity,
    ];

    /// Value stored in the `category` column
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogCategory::Type => "type",
            CatalogCategory::Supertype => "supertype",
            CatalogCategory::Subtype => "subtype",
            CatalogCategory::Rarity => "rarity",
        }
    }

    /// Listing endpoint below the API root
    pub fn endpoint(&self) -> &'static str {
        match self {
            CatalogCategory::Type => "types",
            CatalogCategory::Supertype => "supertypes",
            CatalogCategory::Subtype => "subtypes",
            CatalogCategory::Rarity => "rarities",
        }
    }

    /// Query listing the distinct values of this field across stored cards
    fn derive_sql(&self) -> &'static str {
        match self {
            CatalogCategory::Type => {
                "SELECT DISTINCT j.value FROM cards, json_each(cards.types) AS j"
            }
            CatalogCategory::Subtype => {
                "SELECT DISTINCT j.value FROM cards, json_each(cards.subtypes) AS j"
            }
            CatalogCategory::Supertype => {
                "SELECT DISTINCT supertype FROM cards WHERE supertype IS NOT NULL"
            }
            CatalogCategory::Rarity => {
                "SELECT DISTINCT rarity FROM cards WHERE rarity IS NOT NULL"
            }
        }
    }
}

/// Values of one category for one refresh
pub type CategoryValues = (CatalogCategory, Vec<String>);

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Write all values with `synced_at`, then drop rows last seen before it
///
/// Values are trimmed and de-duplicated; blank values are skipped. Runs in
/// one transaction. Returns the number of distinct values written.
pub async fn upsert_catalog_values(
    pool: &SqlitePool,
    values: &[CategoryValues],
    synced_at: DateTime<Utc>,
) -> SyncResult<usize> {
    create_catalog_values_table(pool).await?;

    let synced_at = timestamp(synced_at);
    let mut tx = pool.begin().await?;
    let mut written = 0;

    for (category, raw_values) in values {
        let distinct: BTreeSet<&str> = raw_values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .collect();

        for value in &distinct {
            sqlx::query(CATALOG_UPSERT_SQL)
                .bind(category.as_str())
                .bind(*value)
                .bind(json!({ "value": value }).to_string())
                .bind(&synced_at)
                .execute(&mut *tx)
                .await?;
        }

        debug!(category = category.as_str(), values = distinct.len(), "Upserted catalog values");
        written += distinct.len();
    }

    let pruned = sqlx::query("DELETE FROM catalog_values WHERE last_synced_at < ?")
        .bind(&synced_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    info!("Upserted {} catalog values, pruned {}", written, pruned);
    Ok(written)
}

/// Stored values of one category, sorted
pub async fn catalog_values(pool: &SqlitePool, category: CatalogCategory) -> SyncResult<Vec<String>> {
    let values = sqlx::query_scalar::<_, String>(
        "SELECT value FROM catalog_values WHERE category = ? ORDER BY value",
    )
    .bind(category.as_str())
    .fetch_all(pool)
    .await?;

    Ok(values)
}

/// Distinct classification values found on stored cards, per category
pub async fn derive_from_cards(pool: &SqlitePool) -> SyncResult<Vec<CategoryValues>> {
    let mut derived = Vec::with_capacity(CatalogCategory::ALL.len());
    for category in CatalogCategory::ALL {
        let values = sqlx::query_scalar::<_, String>(category.derive_sql())
            .fetch_all(pool)
            .await?;
        derived.push((category, values));
    }
    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::cards::upsert_cards;
    use crate::db::test_pool;
    use chrono::Duration;

    fn values(category: CatalogCategory, items: &[&str]) -> CategoryValues {
        (category, items.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn test_upsert_dedupes_and_sorts() {
        let pool = test_pool().await;

        let written = upsert_catalog_values(
            &pool,
            &[
                values(CatalogCategory::Type, &["Fire", "Water", "Fire", " ", "Grass "]),
                values(CatalogCategory::Rarity, &["Common"]),
            ],
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(written, 4);
        assert_eq!(
            catalog_values(&pool, CatalogCategory::Type).await.unwrap(),
            vec!["Fire", "Grass", "Water"]
        );
        assert_eq!(
            catalog_values(&pool, CatalogCategory::Rarity).await.unwrap(),
            vec!["Common"]
        );
    }

    #[tokio::test]
    async fn test_same_value_in_two_categories() {
        let pool = test_pool().await;

        upsert_catalog_values(
            &pool,
            &[
                values(CatalogCategory::Subtype, &["Basic"]),
                values(CatalogCategory::Supertype, &["Basic"]),
            ],
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(catalog_values(&pool, CatalogCategory::Subtype).await.unwrap(), vec!["Basic"]);
        assert_eq!(catalog_values(&pool, CatalogCategory::Supertype).await.unwrap(), vec!["Basic"]);
    }

    #[tokio::test]
    async fn test_refresh_prunes_values_not_seen_again() {
        let pool = test_pool().await;
        let first = Utc::now();

        upsert_catalog_values(&pool, &[values(CatalogCategory::Type, &["Fire", "Dragon"])], first)
            .await
            .unwrap();
        upsert_catalog_values(
            &pool,
            &[values(CatalogCategory::Type, &["Fire"])],
            first + Duration::seconds(1),
        )
        .await
        .unwrap();

        assert_eq!(catalog_values(&pool, CatalogCategory::Type).await.unwrap(), vec!["Fire"]);
    }

    #[tokio::test]
    async fn test_repeated_refresh_is_idempotent() {
        let pool = test_pool().await;
        let at = Utc::now();
        let batch = [values(CatalogCategory::Rarity, &["Common", "Rare"])];

        upsert_catalog_values(&pool, &batch, at).await.unwrap();
        upsert_catalog_values(&pool, &batch, at).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM catalog_values")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_derive_from_cards() {
        let pool = test_pool().await;
        upsert_cards(
            &pool,
            &[
                serde_json::json!({"id": "a-1", "name": "Charmander", "supertype": "Pokémon",
                    "subtypes": ["Basic"], "types": ["Fire"], "rarity": "Common"}),
                serde_json::json!({"id": "a-2", "name": "Bill", "supertype": "Trainer",
                    "subtypes": ["Item", "Basic"], "types": null}),
            ],
        )
        .await
        .unwrap();

        let mut derived = derive_from_cards(&pool).await.unwrap();
        for (_, values) in derived.iter_mut() {
            values.sort();
        }

        assert_eq!(
            derived,
            vec![
                values(CatalogCategory::Type, &["Fire"]),
                values(CatalogCategory::Supertype, &["Pokémon", "Trainer"]),
                values(CatalogCategory::Subtype, &["Basic", "Item"]),
                values(CatalogCategory::Rarity, &["Common"]),
            ]
        );
    }
}
