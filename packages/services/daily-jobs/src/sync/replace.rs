use async_trait::async_trait;
use serde_json::Value;

use crate::clients::{IndexSettings, MeiliClient};
use crate::config::SearchEngineKind;
use crate::models::*;
use crate::sync::{index_document, SearchBackend};

pub const PRIMARY_KEY: &str = "id";

pub fn replace_index_settings() -> IndexSettings {
    IndexSettings {
        searchable_attributes: vec!["title".into()],
        filterable_attributes: vec!["sellerId".into(), "currency".into()],
        sortable_attributes: vec!["price".into(), "createdAt".into()],
    }
}

/// Full-replacement synchronization against a self-hosted Meilisearch.
///
/// The snapshot is loaded into a staging index which is then swapped with
/// the live one, so the live index never disappears and ends up holding
/// exactly the snapshot. The previous generation is dropped afterwards.
/// A failure mid-way leaves the live index untouched and at most a stale
/// staging index, which the next run deletes before building.
pub struct SelfHostedReplaceBackend {
    client: Option<MeiliClient>,
    index_name: String,
}

impl SelfHostedReplaceBackend {
    pub fn new(client: Option<MeiliClient>, index_name: String) -> Self {
        Self { client, index_name }
    }

    pub fn staging_index_name(&self) -> String {
        format!("{}_staging", self.index_name)
    }
}

#[async_trait]
impl SearchBackend for SelfHostedReplaceBackend {
    fn kind(&self) -> SearchEngineKind {
        SearchEngineKind::Meilisearch
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn replace_catalog(&self, records: &[CatalogRecord]) -> Result<SyncOutcome> {
        let Some(client) = &self.client else {
            tracing::info!(backend = %self.kind(), "Meili keys missing, skipping.");
            return Ok(SyncOutcome::Skipped {
                backend: self.kind(),
                reason: "MEILI_HOST / MEILI_API_KEY not set".to_string(),
            });
        };
        let live = self.index_name.as_str();
        let staging = self.staging_index_name();

        client.delete_index_if_exists(&staging).await?;
        client.create_index_and_wait(&staging, PRIMARY_KEY).await?;

        let docs: Vec<Value> = records.iter().map(|r| index_document(r, PRIMARY_KEY)).collect();
        if !docs.is_empty() {
            let task = client.add_documents(&staging, &docs).await?;
            client.wait_for_success("add documents", task).await?;
        }

        let task = client.update_settings(&staging, &replace_index_settings()).await?;
        client.wait_for_success("update settings", task).await?;

        if !client.index_exists(live).await? {
            client.create_index_and_wait(live, PRIMARY_KEY).await?;
        }
        let task = client.swap_indexes(live, &staging).await?;
        client.wait_for_success("swap indexes", task).await?;

        // staging now holds the previous generation
        client.delete_index_if_exists(&staging).await?;

        tracing::info!(index = %live, pushed = docs.len(), "Meili pushed");
        Ok(SyncOutcome::Synced { backend: self.kind(), pushed: docs.len() })
    }
}
