//! Catalog → search index synchronization.
//!
//! Two backends share one input contract but intentionally differ in what
//! "synchronize" means:
//!
//! * [`HostedUpsertBackend`] overwrites objects by id and never deletes, so
//!   records that stopped being active stay in the index until removed by
//!   other means.
//! * [`SelfHostedReplaceBackend`] builds a fresh index and swaps it in, so the
//!   live index mirrors the snapshot exactly.
//!
//! Both report a missing-credentials configuration as
//! [`SyncOutcome::Skipped`] rather than an error.

pub mod hosted;
pub mod replace;

pub use hosted::*;
pub use replace::*;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};

use crate::clients::{AlgoliaClient, MeiliClient, RetryPolicy};
use crate::config::{Config, SearchEngineKind};
use crate::models::*;

#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn kind(&self) -> SearchEngineKind;

    /// False when required credentials are absent; the run then skips this step.
    fn is_configured(&self) -> bool;

    /// Pushes the snapshot into the index and returns how many documents were sent.
    async fn replace_catalog(&self, records: &[CatalogRecord]) -> Result<SyncOutcome>;
}

/// Resolves the configured backend once at startup.
pub fn build_backend(cfg: &Config, http: Client) -> Arc<dyn SearchBackend> {
    let retry = RetryPolicy::from_config(cfg);
    match cfg.search_engine {
        SearchEngineKind::Meilisearch => {
            let client = match (&cfg.meili_host, &cfg.meili_api_key) {
                (Some(host), Some(key)) => Some(MeiliClient::new(
                    http,
                    host.clone(),
                    key.clone(),
                    retry,
                    Duration::from_millis(cfg.meili_task_poll_ms),
                    Duration::from_millis(cfg.meili_task_timeout_ms),
                )),
                _ => None,
            };
            Arc::new(SelfHostedReplaceBackend::new(client, cfg.meili_index_name.clone()))
        }
        SearchEngineKind::Algolia => {
            let client = match (&cfg.algolia_app_id, &cfg.algolia_api_key) {
                (Some(app_id), Some(key)) => Some(AlgoliaClient::new(
                    http,
                    app_id.clone(),
                    key.clone(),
                    cfg.algolia_host.clone(),
                    retry,
                )),
                _ => None,
            };
            Arc::new(HostedUpsertBackend::new(client, cfg.algolia_index_name.clone(), cfg.algolia_batch_size))
        }
    }
}

/// Backend-agnostic index document; `key_field` carries the record id
/// (`objectID` for Algolia, `id` for Meilisearch).
pub fn index_document(record: &CatalogRecord, key_field: &str) -> Value {
    let mut obj = Map::new();
    obj.insert(key_field.to_string(), Value::String(record.id.clone()));
    if let Some(title) = &record.title {
        obj.insert("title".into(), Value::String(title.clone()));
    }
    if let Some(price) = record.price {
        obj.insert("price".into(), serde_json::Number::from_f64(price).map(Value::Number).unwrap_or(Value::Null));
    }
    if let Some(currency) = &record.currency {
        obj.insert("currency".into(), Value::String(currency.clone()));
    }
    obj.insert("createdAt".into(), record.created_at.clone().unwrap_or(Value::Null));
    obj.insert(
        "images".into(),
        Value::Array(record.images.iter().cloned().map(Value::String).collect()),
    );
    obj.insert(
        "sellerId".into(),
        record.seller_id.clone().map(Value::String).unwrap_or(Value::Null),
    );
    Value::Object(obj)
}
