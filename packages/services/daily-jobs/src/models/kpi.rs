use chrono::NaiveDate;
use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use crate::models::catalog::numeric_f64;

/// Aggregated performance metrics for one calendar day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyKpi {
    pub ctr: Option<f64>,
    pub diversity: Option<f64>,
    pub impressions: Option<i64>,
    pub clicks: Option<i64>,
}

impl DailyKpi {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            ctr: doc.get("ctr").and_then(numeric_f64),
            diversity: doc.get("diversity").and_then(numeric_f64),
            impressions: doc.get("impressions").and_then(numeric_i64),
            clicks: doc.get("clicks").and_then(numeric_i64),
        }
    }
}

/// Document key for a day's KPI snapshot (`YYYY-MM-DD`).
pub fn kpi_doc_id(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn numeric_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(i) => Some(i64::from(*i)),
        Bson::Int64(i) => Some(*i),
        Bson::Double(f) if f.is_finite() => Some(f.round() as i64),
        _ => None,
    }
}
