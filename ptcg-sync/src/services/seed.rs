//! Bulk set import
//!
//! Seeds the `sets` table from a catalog document shaped like an API listing
//! response: `{"data": [ <set>, ... ]}`.

use crate::db::CatalogStore;
use crate::error::{SyncError, SyncResult};
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Upsert every set listed under `data`
///
/// A document without an array under `data` is rejected before anything is
/// written.
pub async fn import_sets_document(store: &dyn CatalogStore, document: &Value) -> SyncResult<usize> {
    let sets = match document.get("data") {
        Some(Value::Array(sets)) => sets,
        Some(_) => {
            return Err(SyncError::MalformedDocument(
                "`data` is not an array".to_string(),
            ))
        }
        None => {
            return Err(SyncError::MalformedDocument(
                "document has no `data` key".to_string(),
            ))
        }
    };

    let written = store.upsert_sets(sets).await?;
    info!("Imported {} sets", written);
    Ok(written)
}

/// Read a set catalog file and import it
pub async fn import_sets_file(store: &dyn CatalogStore, path: &Path) -> SyncResult<usize> {
    let content = tokio::fs::read_to_string(path).await?;
    let document: Value = serde_json::from_str(&content)?;
    import_sets_document(store, &document).await
}
