//! Set documents and rows

use super::lenient_i64;
use serde::{Deserialize, Serialize};

/// Set record as found in the source document (camelCase keys)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDocument {
    /// Empty when the source omits it; set imports reject that, card set blocks tolerate it
    #[serde(default)]
    pub id: String,
    pub name: Option<String>,
    pub series: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub printed_total: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub total: Option<i64>,
    pub legalities: Option<SetLegalities>,
    pub ptcgo_code: Option<String>,
    pub release_date: Option<String>,
    pub updated_at: Option<String>,
    pub images: Option<SetImages>,
}

/// Legality per ruleset, values are `"Legal"` or `"Banned"` when present
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SetLegalities {
    pub unlimited: Option<String>,
    pub expanded: Option<String>,
    pub standard: Option<String>,
}

/// Set artwork URLs
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SetImages {
    pub symbol: Option<String>,
    pub logo: Option<String>,
}

fn is_legal(value: &Option<String>) -> bool {
    value.as_deref() == Some("Legal")
}

impl SetDocument {
    pub fn legal_unlimited(&self) -> bool {
        self.legalities
            .as_ref()
            .map(|l| is_legal(&l.unlimited))
            .unwrap_or(false)
    }

    pub fn legal_expanded(&self) -> bool {
        self.legalities
            .as_ref()
            .map(|l| is_legal(&l.expanded))
            .unwrap_or(false)
    }

    pub fn symbol_url(&self) -> Option<&str> {
        self.images.as_ref().and_then(|i| i.symbol.as_deref())
    }

    pub fn logo_url(&self) -> Option<&str> {
        self.images.as_ref().and_then(|i| i.logo.as_deref())
    }
}

/// Row of the `sets` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SetRow {
    pub id: String,
    pub name: String,
    pub series: Option<String>,
    pub printed_total: Option<i64>,
    pub total: Option<i64>,
    pub legal_unlimited: bool,
    pub legal_expanded: bool,
    pub ptcgo_code: Option<String>,
    pub release_date: Option<String>,
    pub updated_at: Option<String>,
    pub symbol_url: Option<String>,
    pub logo_url: Option<String>,
}
