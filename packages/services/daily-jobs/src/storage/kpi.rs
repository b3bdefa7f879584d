use async_trait::async_trait;
use chrono::NaiveDate;
use mongodb::bson::{doc, Document};
use mongodb::{Collection, Database};

use crate::models::*;
use crate::storage::KpiSource;

/// Daily KPI documents keyed by `YYYY-MM-DD` in `_id`.
#[derive(Clone)]
pub struct MongoKpiStore {
    collection: Collection<Document>,
}

impl MongoKpiStore {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self { collection: db.collection(collection_name) }
    }
}

#[async_trait]
impl KpiSource for MongoKpiStore {
    async fn daily_kpi(&self, date: NaiveDate) -> Result<Option<DailyKpi>> {
        let id = kpi_doc_id(date);
        let found = self.collection.find_one(doc! { "_id": id.as_str() }, None).await?;
        tracing::debug!(kpi_date = %id, found = found.is_some(), "kpi snapshot lookup");
        Ok(found.as_ref().map(DailyKpi::from_document))
    }
}
