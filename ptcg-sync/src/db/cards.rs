//! Card table operations
//!
//! Source records are flattened into typed columns: the parent set is copied
//! onto the row (11 `set_*` columns), images and marketplace blocks are split
//! into URL and price columns, and the remaining nested documents are stored
//! as JSON text. The unmodified record is kept in `raw`.

use crate::error::{SyncError, SyncResult};
use crate::models::{CardDocument, CardRow};
use ptcg_common::db::create_cards_table;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::debug;

const CARD_UPSERT_SQL: &str = r#"
    INSERT INTO cards (
        id, name, supertype, subtypes, hp, types, evolves_from,
        number, artist, rarity, flavor_text, rules, regulation_mark,
        national_pokedex_numbers,
        set_id, set_name, set_series, set_ptcgo_code, set_release_date,
        set_printed_total, set_total, set_legal_unlimited, set_legal_expanded,
        set_symbol_url, set_logo_url,
        image_small, image_large, legalities, abilities, attacks, weaknesses,
        retreat_cost, converted_retreat_cost,
        tcgplayer_url, tcgplayer_updated_at, tcgplayer_prices,
        cardmarket_url, cardmarket_updated_at, cardmarket_prices,
        raw
    ) VALUES (
        ?, ?, ?, ?, ?, ?, ?,
        ?, ?, ?, ?, ?, ?,
        ?,
        ?, ?, ?, ?, ?,
        ?, ?, ?, ?,
        ?, ?,
        ?, ?, ?, ?, ?, ?,
        ?, ?,
        ?, ?, ?,
        ?, ?, ?,
        ?
    )
    ON CONFLICT(id) DO UPDATE SET
        name = excluded.name,
        supertype = excluded.supertype,
        subtypes = excluded.subtypes,
        hp = excluded.hp,
        types = excluded.types,
        evolves_from = excluded.evolves_from,
        number = excluded.number,
        artist = excluded.artist,
        rarity = excluded.rarity,
        flavor_text = excluded.flavor_text,
        rules = excluded.rules,
        regulation_mark = excluded.regulation_mark,
        national_pokedex_numbers = excluded.national_pokedex_numbers,
        set_id = excluded.set_id,
        set_name = excluded.set_name,
        set_series = excluded.set_series,
        set_ptcgo_code = excluded.set_ptcgo_code,
        set_release_date = excluded.set_release_date,
        set_printed_total = excluded.set_printed_total,
        set_total = excluded.set_total,
        set_legal_unlimited = excluded.set_legal_unlimited,
        set_legal_expanded = excluded.set_legal_expanded,
        set_symbol_url = excluded.set_symbol_url,
        set_logo_url = excluded.set_logo_url,
        image_small = excluded.image_small,
        image_large = excluded.image_large,
        legalities = excluded.legalities,
        abilities = excluded.abilities,
        attacks = excluded.attacks,
        weaknesses = excluded.weaknesses,
        retreat_cost = excluded.retreat_cost,
        converted_retreat_cost = excluded.converted_retreat_cost,
        tcgplayer_url = excluded.tcgplayer_url,
        tcgplayer_updated_at = excluded.tcgplayer_updated_at,
        tcgplayer_prices = excluded.tcgplayer_prices,
        cardmarket_url = excluded.cardmarket_url,
        cardmarket_updated_at = excluded.cardmarket_updated_at,
        cardmarket_prices = excluded.cardmarket_prices,
        raw = excluded.raw
"#;

/// JSON text for an optional nested document
fn json_text(value: &Option<Value>) -> SyncResult<Option<String>> {
    value
        .as_ref()
        .filter(|v| !v.is_null())
        .map(serde_json::to_string)
        .transpose()
        .map_err(SyncError::from)
}

fn parse_card(index: usize, value: &Value) -> SyncResult<CardDocument> {
    CardDocument::from_value(value).map_err(|e| SyncError::InvalidRecord {
        index,
        reason: e.to_string(),
    })
}

/// Insert or fully replace card rows
///
/// All rows are written in one transaction; the first bad record aborts the
/// call and nothing is committed.
pub async fn upsert_cards(pool: &SqlitePool, documents: &[Value]) -> SyncResult<usize> {
    create_cards_table(pool).await?;

    let mut tx = pool.begin().await?;

    for (index, value) in documents.iter().enumerate() {
        let card = parse_card(index, value)?;
        let set = card.set.as_ref();
        let tcgplayer = card.tcgplayer.clone().unwrap_or_default();
        let cardmarket = card.cardmarket.clone().unwrap_or_default();

        sqlx::query(CARD_UPSERT_SQL)
            .bind(&card.id)
            .bind(&card.name)
            .bind(&card.supertype)
            .bind(serde_json::to_string(&card.subtypes)?)
            .bind(card.hp)
            .bind(serde_json::to_string(&card.types)?)
            .bind(&card.evolves_from)
            .bind(&card.number)
            .bind(&card.artist)
            .bind(&card.rarity)
            .bind(&card.flavor_text)
            .bind(serde_json::to_string(&card.rules)?)
            .bind(&card.regulation_mark)
            .bind(serde_json::to_string(&card.national_pokedex_numbers)?)
            // Snapshot of the parent set
            .bind(set.map(|s| s.id.as_str()).filter(|id| !id.is_empty()))
            .bind(set.and_then(|s| s.name.as_deref()))
            .bind(set.and_then(|s| s.series.as_deref()))
            .bind(set.and_then(|s| s.ptcgo_code.as_deref()))
            .bind(set.and_then(|s| s.release_date.as_deref()))
            .bind(set.and_then(|s| s.printed_total))
            .bind(set.and_then(|s| s.total))
            .bind(set.map(|s| s.legal_unlimited()).unwrap_or(false))
            .bind(set.map(|s| s.legal_expanded()).unwrap_or(false))
            .bind(set.and_then(|s| s.symbol_url()))
            .bind(set.and_then(|s| s.logo_url()))
            // Images and nested documents
            .bind(card.image_small())
            .bind(card.image_large())
            .bind(json_text(&card.legalities)?)
            .bind(json_text(&card.abilities)?)
            .bind(json_text(&card.attacks)?)
            .bind(json_text(&card.weaknesses)?)
            .bind(serde_json::to_string(&card.retreat_cost)?)
            .bind(card.converted_retreat_cost)
            // Marketplaces
            .bind(&tcgplayer.url)
            .bind(&tcgplayer.updated_at)
            .bind(json_text(&tcgplayer.prices)?)
            .bind(&cardmarket.url)
            .bind(&cardmarket.updated_at)
            .bind(json_text(&cardmarket.prices)?)
            .bind(serde_json::to_string(value)?)
            .execute(&mut *tx)
            .await?;

        debug!(card_id = %card.id, "Upserted card");
    }

    tx.commit().await?;

    Ok(documents.len())
}

/// Primary-key point lookup
pub async fn card_exists(pool: &SqlitePool, card_id: &str) -> SyncResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM cards WHERE id = ?")
        .bind(card_id)
        .fetch_optional(pool)
        .await?;

    Ok(found.is_some())
}

/// Load a card row by id
pub async fn load_card(pool: &SqlitePool, card_id: &str) -> SyncResult<Option<CardRow>> {
    let row = sqlx::query_as::<_, CardRow>(
        r#"
        SELECT id, name, supertype, subtypes, hp, types, evolves_from, number,
               rarity, set_id, set_name, set_total, set_legal_unlimited,
               image_small, attacks, retreat_cost, converted_retreat_cost,
               tcgplayer_url, tcgplayer_prices, cardmarket_url, raw
        FROM cards
        WHERE id = ?
        "#,
    )
    .bind(card_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Number of card rows
pub async fn count_cards(pool: &SqlitePool) -> SyncResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cards")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
