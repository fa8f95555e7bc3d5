//! Source documents and stored rows for sets and cards

pub mod card;
pub mod set;

pub use card::{CardDocument, CardImages, CardRow, MarketBlock};
pub use set::{SetDocument, SetImages, SetLegalities, SetRow};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize an optional integer that may arrive as a number or a numeric string
///
/// Anything else (`"N/A"`, objects, fractional numbers) becomes `None` instead
/// of failing the record.
pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_i64))
}

/// Deserialize an optional string that may arrive as a number
///
/// Card numbers are usually strings (`"4"`, `"SWSH007"`) but some records
/// carry a bare integer. Other shapes become `None`.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Deserialize a list of integers, coercing numeric strings and dropping the rest
pub(crate) fn lenient_i64_list<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items.iter().filter_map(coerce_i64).collect(),
        _ => Vec::new(),
    })
}

/// Deserialize a list that may be `null`
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_i64() {
        assert_eq!(coerce_i64(&json!(60)), Some(60));
        assert_eq!(coerce_i64(&json!("120")), Some(120));
        assert_eq!(coerce_i64(&json!(" 70 ")), Some(70));
        assert_eq!(coerce_i64(&json!(2.0)), Some(2));
        assert_eq!(coerce_i64(&json!(2.5)), None);
        assert_eq!(coerce_i64(&json!("N/A")), None);
        assert_eq!(coerce_i64(&json!({"hp": 1})), None);
        assert_eq!(coerce_i64(&Value::Null), None);
    }

    #[derive(Debug, Deserialize)]
    struct Lenient {
        #[serde(default, deserialize_with = "lenient_string")]
        number: Option<String>,
        #[serde(default, deserialize_with = "lenient_i64_list")]
        dex: Vec<i64>,
    }

    #[test]
    fn test_lenient_string_and_list() {
        let parsed: Lenient =
            serde_json::from_value(json!({"number": 12, "dex": [25, "26", "n/a", null]})).unwrap();
        assert_eq!(parsed.number.as_deref(), Some("12"));
        assert_eq!(parsed.dex, vec![25, 26]);

        let parsed: Lenient = serde_json::from_value(json!({"number": {"x": 1}, "dex": "25"})).unwrap();
        assert_eq!(parsed.number, None);
        assert!(parsed.dex.is_empty());
    }
}
