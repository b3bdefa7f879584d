use async_trait::async_trait;
use serde_json::Value;

use crate::clients::AlgoliaClient;
use crate::config::SearchEngineKind;
use crate::models::*;
use crate::sync::{index_document, SearchBackend};

/// Additive/overwrite synchronization against the hosted index. Objects that
/// are no longer in the snapshot are not removed.
pub struct HostedUpsertBackend {
    client: Option<AlgoliaClient>,
    index_name: String,
    batch_size: usize,
}

impl HostedUpsertBackend {
    pub fn new(client: Option<AlgoliaClient>, index_name: String, batch_size: usize) -> Self {
        Self { client, index_name, batch_size: batch_size.max(1) }
    }
}

#[async_trait]
impl SearchBackend for HostedUpsertBackend {
    fn kind(&self) -> SearchEngineKind {
        SearchEngineKind::Algolia
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn replace_catalog(&self, records: &[CatalogRecord]) -> Result<SyncOutcome> {
        let Some(client) = &self.client else {
            tracing::info!(backend = %self.kind(), "Algolia keys missing, skipping.");
            return Ok(SyncOutcome::Skipped {
                backend: self.kind(),
                reason: "ALGOLIA_APP_ID / ALGOLIA_API_KEY not set".to_string(),
            });
        };

        let objects: Vec<Value> = records.iter().map(|r| index_document(r, "objectID")).collect();
        for chunk in objects.chunks(self.batch_size) {
            client.save_objects(&self.index_name, chunk).await?;
        }
        tracing::info!(index = %self.index_name, pushed = objects.len(), "Algolia pushed");
        Ok(SyncOutcome::Synced { backend: self.kind(), pushed: objects.len() })
    }
}
