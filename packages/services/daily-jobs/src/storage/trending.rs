use async_trait::async_trait;
use mongodb::bson::{doc, DateTime as BsonDateTime, Document};
use mongodb::options::UpdateOptions;
use mongodb::{Collection, Database};

use crate::models::*;
use crate::storage::TrendingWriter;

const TRENDING_DOC_ID: &str = "trending";

/// Placeholder trending snapshot: merges an empty item list and a fresh
/// timestamp into the singleton trending document.
#[derive(Clone)]
pub struct MongoTrendingWriter {
    collection: Collection<Document>,
}

impl MongoTrendingWriter {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self { collection: db.collection(collection_name) }
    }
}

#[async_trait]
impl TrendingWriter for MongoTrendingWriter {
    async fn recompute(&self) -> Result<()> {
        let filter = doc! { "_id": TRENDING_DOC_ID };
        let update = doc! {
            "$set": {
                "items": [],
                "updatedAt": BsonDateTime::now(),
            }
        };
        let options = UpdateOptions::builder().upsert(true).build();
        self.collection.update_one(filter, update, options).await?;
        tracing::info!(collection = %self.collection.name(), "trending snapshot written");
        Ok(())
    }
}
