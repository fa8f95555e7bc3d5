//! Set table operations

use crate::error::{SyncError, SyncResult};
use crate::models::{SetDocument, SetRow};
use ptcg_common::db::create_sets_table;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, info};

const SET_UPSERT_SQL: &str = r#"
    INSERT INTO sets (
        id, name, series, printed_total, total,
        legal_unlimited, legal_expanded, ptcgo_code,
        release_date, updated_at, symbol_url, logo_url
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        name = excluded.name,
        series = excluded.series,
        printed_total = excluded.printed_total,
        total = excluded.total,
        legal_unlimited = excluded.legal_unlimited,
        legal_expanded = excluded.legal_expanded,
        ptcgo_code = excluded.ptcgo_code,
        release_date = excluded.release_date,
        updated_at = excluded.updated_at,
        symbol_url = excluded.symbol_url,
        logo_url = excluded.logo_url
"#;

fn parse_set(index: usize, value: &Value) -> SyncResult<SetDocument> {
    let doc: SetDocument = serde_json::from_value(value.clone()).map_err(|e| {
        SyncError::InvalidRecord {
            index,
            reason: e.to_string(),
        }
    })?;

    if doc.id.is_empty() {
        return Err(SyncError::InvalidRecord {
            index,
            reason: "set has no id".to_string(),
        });
    }

    if doc.name.is_none() {
        return Err(SyncError::InvalidRecord {
            index,
            reason: format!("set {} has no name", doc.id),
        });
    }

    Ok(doc)
}

/// Insert or fully replace set rows
///
/// All rows are written in one transaction. The first bad record aborts the
/// call and nothing is committed.
pub async fn upsert_sets(pool: &SqlitePool, documents: &[Value]) -> SyncResult<usize> {
    create_sets_table(pool).await?;

    let mut tx = pool.begin().await?;

    for (index, value) in documents.iter().enumerate() {
        let doc = parse_set(index, value)?;

        sqlx::query(SET_UPSERT_SQL)
            .bind(&doc.id)
            .bind(&doc.name)
            .bind(&doc.series)
            .bind(doc.printed_total)
            .bind(doc.total)
            .bind(doc.legal_unlimited())
            .bind(doc.legal_expanded())
            .bind(&doc.ptcgo_code)
            .bind(&doc.release_date)
            .bind(&doc.updated_at)
            .bind(doc.symbol_url())
            .bind(doc.logo_url())
            .execute(&mut *tx)
            .await?;

        debug!(set_id = %doc.id, "Upserted set");
    }

    tx.commit().await?;

    info!("Upserted {} sets", documents.len());
    Ok(documents.len())
}

/// All set rows ordered by release date, oldest first
pub async fn sets_by_release_date(pool: &SqlitePool) -> SyncResult<Vec<SetRow>> {
    let rows = sqlx::query_as::<_, SetRow>(
        r#"
        SELECT id, name, series, printed_total, total,
               legal_unlimited, legal_expanded, ptcgo_code,
               release_date, updated_at, symbol_url, logo_url
        FROM sets
        ORDER BY release_date ASC, id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
