//! Card documents and rows
//!
//! A [`CardDocument`] is the typed view of one source record. Nested blocks
//! the store flattens (set, images, marketplaces) are typed; blocks stored as
//! JSON documents (abilities, attacks, weaknesses, legalities, prices) stay as
//! [`serde_json::Value`].

use super::{lenient_i64, lenient_i64_list, lenient_string, null_as_empty, SetDocument};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Card record as found in snapshot files and remote responses
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDocument {
    pub id: String,
    pub name: String,
    pub supertype: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub subtypes: Vec<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub hp: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub types: Vec<String>,
    pub evolves_from: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub number: Option<String>,
    pub artist: Option<String>,
    pub rarity: Option<String>,
    pub flavor_text: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub rules: Vec<String>,
    pub regulation_mark: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64_list")]
    pub national_pokedex_numbers: Vec<i64>,
    pub set: Option<SetDocument>,
    pub images: Option<CardImages>,
    pub legalities: Option<Value>,
    pub abilities: Option<Value>,
    pub attacks: Option<Value>,
    pub weaknesses: Option<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub retreat_cost: Vec<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub converted_retreat_cost: Option<i64>,
    pub tcgplayer: Option<MarketBlock>,
    pub cardmarket: Option<MarketBlock>,
}

/// Card artwork URLs
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CardImages {
    pub small: Option<String>,
    pub large: Option<String>,
}

/// Marketplace listing: product URL plus a price snapshot
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketBlock {
    pub url: Option<String>,
    pub updated_at: Option<String>,
    pub prices: Option<Value>,
}

impl CardDocument {
    /// Parse a raw source record
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    pub fn image_small(&self) -> Option<&str> {
        self.images.as_ref().and_then(|i| i.small.as_deref())
    }

    pub fn image_large(&self) -> Option<&str> {
        self.images.as_ref().and_then(|i| i.large.as_deref())
    }
}

/// Selected columns of the `cards` table, used for inspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CardRow {
    pub id: String,
    pub name: String,
    pub supertype: Option<String>,
    pub subtypes: String,
    pub hp: Option<i64>,
    pub types: String,
    pub evolves_from: Option<String>,
    pub number: Option<String>,
    pub rarity: Option<String>,
    pub set_id: Option<String>,
    pub set_name: Option<String>,
    pub set_total: Option<i64>,
    pub set_legal_unlimited: bool,
    pub image_small: Option<String>,
    pub attacks: Option<String>,
    pub retreat_cost: String,
    pub converted_retreat_cost: Option<i64>,
    pub tcgplayer_url: Option<String>,
    pub tcgplayer_prices: Option<String>,
    pub cardmarket_url: Option<String>,
    pub raw: String,
}
