//! Catalog table definitions
//!
//! All functions are idempotent (`CREATE TABLE IF NOT EXISTS`) and accept any
//! SQLite executor, so the upsert paths can run them inside their own
//! transaction.

use crate::Result;
use sqlx::{Executor, Sqlite};

/// Create the `sets` table
pub async fn create_sets_table<'e, E>(executor: E) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    executor
        .execute(
            r#"
            CREATE TABLE IF NOT EXISTS sets (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                series TEXT,
                printed_total INTEGER,
                total INTEGER,
                legal_unlimited INTEGER NOT NULL DEFAULT 0,
                legal_expanded INTEGER NOT NULL DEFAULT 0,
                ptcgo_code TEXT,
                release_date TEXT,
                updated_at TEXT,
                symbol_url TEXT,
                logo_url TEXT
            )
            "#,
        )
        .await?;

    Ok(())
}

/// Create the `cards` table
///
/// `set_*` columns are a copy of the parent set taken at import time; there
/// is no foreign key to `sets`.
pub async fn create_cards_table<'e, E>(executor: E) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    executor
        .execute(
            r#"
            CREATE TABLE IF NOT EXISTS cards (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                supertype TEXT,
                subtypes TEXT NOT NULL DEFAULT '[]',
                hp INTEGER,
                types TEXT NOT NULL DEFAULT '[]',
                evolves_from TEXT,
                number TEXT,
                artist TEXT,
                rarity TEXT,
                flavor_text TEXT,
                rules TEXT NOT NULL DEFAULT '[]',
                regulation_mark TEXT,
                national_pokedex_numbers TEXT NOT NULL DEFAULT '[]',
                set_id TEXT,
                set_name TEXT,
                set_series TEXT,
                set_ptcgo_code TEXT,
                set_release_date TEXT,
                set_printed_total INTEGER,
                set_total INTEGER,
                set_legal_unlimited INTEGER NOT NULL DEFAULT 0,
                set_legal_expanded INTEGER NOT NULL DEFAULT 0,
                set_symbol_url TEXT,
                set_logo_url TEXT,
                image_small TEXT,
                image_large TEXT,
                legalities TEXT,
                abilities TEXT,
                attacks TEXT,
                weaknesses TEXT,
                retreat_cost TEXT NOT NULL DEFAULT '[]',
                converted_retreat_cost INTEGER,
                tcgplayer_url TEXT,
                tcgplayer_updated_at TEXT,
                tcgplayer_prices TEXT,
                cardmarket_url TEXT,
                cardmarket_updated_at TEXT,
                cardmarket_prices TEXT,
                raw TEXT NOT NULL
            )
            "#,
        )
        .await?;

    Ok(())
}

/// Create the `catalog_values` table
///
/// One row per `(category, value)` pair of the card vocabulary (types,
/// supertypes, subtypes, rarities). `last_synced_at` is an RFC 3339 UTC
/// timestamp; rows older than the latest refresh are pruned by it.
pub async fn create_catalog_values_table<'e, E>(executor: E) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    executor
        .execute(
            r#"
            CREATE TABLE IF NOT EXISTS catalog_values (
                category TEXT NOT NULL,
                value TEXT NOT NULL,
                data TEXT NOT NULL,
                last_synced_at TEXT NOT NULL,
                PRIMARY KEY (category, value)
            )
            "#,
        )
        .await?;

    Ok(())
}
