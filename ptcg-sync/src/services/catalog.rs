//! Card vocabulary refresh
//!
//! Rebuilds the `catalog_values` table either from the remote listing
//! endpoints or from the classification fields of cards already stored.

use crate::db::catalog_values::{CatalogCategory, CategoryValues};
use crate::db::SqliteCatalogStore;
use crate::error::SyncResult;
use crate::services::remote_client::PokemonTcgClient;
use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

/// Source of the full value list of a classification field
#[async_trait]
pub trait CatalogValueSource: Send + Sync {
    async fn fetch_values(&self, category: CatalogCategory) -> SyncResult<Vec<String>>;
}

#[async_trait]
impl CatalogValueSource for PokemonTcgClient {
    async fn fetch_values(&self, category: CatalogCategory) -> SyncResult<Vec<String>> {
        self.fetch_catalog_values(category).await
    }
}

/// Replace the vocabulary with the lists served by `source`
///
/// Every category is fetched before anything is written, so a failed fetch
/// leaves the stored vocabulary untouched.
pub async fn refresh_from_source(
    store: &SqliteCatalogStore,
    source: &dyn CatalogValueSource,
) -> SyncResult<usize> {
    let mut fetched: Vec<CategoryValues> = Vec::with_capacity(CatalogCategory::ALL.len());
    for category in CatalogCategory::ALL {
        let values = source.fetch_values(category).await?;
        info!(category = category.as_str(), values = values.len(), "Fetched catalog values");
        fetched.push((category, values));
    }

    store.upsert_catalog_values(&fetched, Utc::now()).await
}

/// Replace the vocabulary with the values found on stored cards
pub async fn refresh_from_cards(store: &SqliteCatalogStore) -> SyncResult<usize> {
    let derived = store.derive_catalog_values().await?;
    store.upsert_catalog_values(&derived, Utc::now()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{test_pool, CatalogStore};
    use crate::error::SyncError;
    use serde_json::json;
    use std::collections::HashMap;

    /// Serves fixed lists; categories without a list fail
    struct FixedSource {
        lists: HashMap<CatalogCategory, Vec<&'static str>>,
    }

    #[async_trait]
    impl CatalogValueSource for FixedSource {
        async fn fetch_values(&self, category: CatalogCategory) -> SyncResult<Vec<String>> {
            self.lists
                .get(&category)
                .map(|values| values.iter().map(|v| v.to_string()).collect())
                .ok_or_else(|| SyncError::Remote(format!("{} unavailable", category.endpoint())))
        }
    }

    fn full_source() -> FixedSource {
        let mut lists = HashMap::new();
        lists.insert(CatalogCategory::Type, vec!["Fire", "Water"]);
        lists.insert(CatalogCategory::Supertype, vec!["Energy", "Pokémon", "Trainer"]);
        lists.insert(CatalogCategory::Subtype, vec!["Basic", "Stage 1"]);
        lists.insert(CatalogCategory::Rarity, vec!["Common", "Rare Holo"]);
        FixedSource { lists }
    }

    #[tokio::test]
    async fn test_refresh_from_source() {
        let store = SqliteCatalogStore::new(test_pool().await).await.unwrap();

        let written = refresh_from_source(&store, &full_source()).await.unwrap();

        assert_eq!(written, 9);
        assert_eq!(
            store.catalog_values(CatalogCategory::Supertype).await.unwrap(),
            vec!["Energy", "Pokémon", "Trainer"]
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_stored_values() {
        let store = SqliteCatalogStore::new(test_pool().await).await.unwrap();
        refresh_from_source(&store, &full_source()).await.unwrap();

        let mut partial = full_source();
        partial.lists.remove(&CatalogCategory::Rarity);
        let result = refresh_from_source(&store, &partial).await;

        assert!(matches!(result, Err(SyncError::Remote(_))));
        assert_eq!(
            store.catalog_values(CatalogCategory::Rarity).await.unwrap(),
            vec!["Common", "Rare Holo"]
        );
    }

    #[tokio::test]
    async fn test_refresh_from_cards() {
        let store = SqliteCatalogStore::new(test_pool().await).await.unwrap();
        store
            .upsert_cards(&[
                json!({"id": "base1-4", "name": "Charizard", "supertype": "Pokémon",
                    "subtypes": ["Stage 2"], "types": ["Fire"], "rarity": "Rare Holo"}),
                json!({"id": "base1-7", "name": "Hitmonchan", "supertype": "Pokémon",
                    "subtypes": ["Basic"], "types": ["Fighting"], "rarity": "Rare Holo"}),
            ])
            .await
            .unwrap();

        refresh_from_cards(&store).await.unwrap();

        assert_eq!(
            store.catalog_values(CatalogCategory::Type).await.unwrap(),
            vec!["Fighting", "Fire"]
        );
        assert_eq!(
            store.catalog_values(CatalogCategory::Rarity).await.unwrap(),
            vec!["Rare Holo"]
        );
    }
}
