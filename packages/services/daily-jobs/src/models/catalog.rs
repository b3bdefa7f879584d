use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One active sellable item as read from the catalog collection.
///
/// Records are read fresh on every run and never written back. Missing
/// optional fields stay `None` so the index documents omit them instead of
/// inventing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,
    pub title: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    /// Milliseconds since the epoch for date-like values, otherwise the raw stored value.
    pub created_at: Option<Value>,
    pub images: Vec<String>,
    pub seller_id: Option<String>,
}

impl CatalogRecord {
    pub fn from_document(doc: &Document) -> Self {
        let id = match doc.get("_id") {
            Some(Bson::ObjectId(oid)) => oid.to_hex(),
            Some(Bson::String(s)) => s.clone(),
            Some(other) => bson_to_plain_string(other),
            None => String::new(),
        };
        let images = doc
            .get("images")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|b| b.as_str().map(|s| s.to_string())).collect())
            .unwrap_or_default();

        Self {
            id,
            title: doc.get("title").and_then(|v| v.as_str()).map(|s| s.to_string()),
            price: doc.get("price").and_then(numeric_f64),
            currency: doc.get("currency").and_then(|v| v.as_str()).map(|s| s.to_string()),
            created_at: normalize_created_at(doc.get("createdAt")),
            images,
            seller_id: doc.get("sellerId").and_then(|v| v.as_str()).map(|s| s.to_string()),
        }
    }
}

/// Date-like BSON values become epoch milliseconds; anything else passes through as JSON.
/// Falsy values (zero, NaN, empty string, `false`) count as absent.
pub fn normalize_created_at(value: Option<&Bson>) -> Option<Value> {
    match value? {
        Bson::Null | Bson::Undefined => None,
        Bson::Boolean(false) | Bson::Int32(0) | Bson::Int64(0) => None,
        Bson::Double(f) if *f == 0.0 || f.is_nan() => None,
        Bson::String(s) if s.is_empty() => None,
        Bson::DateTime(dt) => Some(Value::from(dt.timestamp_millis())),
        Bson::Timestamp(ts) => Some(Value::from(i64::from(ts.time) * 1000)),
        other => Some(other.clone().into_relaxed_extjson()),
    }
}

/// Accepts any numeric BSON representation.
pub fn numeric_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Double(f) => Some(*f),
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        _ => None,
    }
}

fn bson_to_plain_string(value: &Bson) -> String {
    match value.clone().into_relaxed_extjson() {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
