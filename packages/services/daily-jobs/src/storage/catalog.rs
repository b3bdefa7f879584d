use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Collection, Database};

use crate::models::*;
use crate::storage::CatalogSource;

#[derive(Clone)]
pub struct MongoCatalogReader {
    collection: Collection<Document>,
}

impl MongoCatalogReader {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self { collection: db.collection(collection_name) }
    }
}

#[async_trait]
impl CatalogSource for MongoCatalogReader {
    async fn active_records(&self) -> Result<Vec<CatalogRecord>> {
        let mut cursor = self.collection.find(doc! { "active": true }, None).await?;
        let mut records = Vec::new();
        while let Some(d) = cursor.try_next().await? {
            records.push(CatalogRecord::from_document(&d));
        }
        tracing::info!(
            collection = %self.collection.name(),
            records = records.len(),
            "catalog snapshot: read active records"
        );
        Ok(records)
    }
}
