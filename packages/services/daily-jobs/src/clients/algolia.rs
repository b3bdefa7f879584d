use reqwest::Client;
use serde_json::{json, Value};

use crate::clients::retry::{failure_summary, send_with_retry, RetryPolicy};
use crate::models::*;

/// Minimal Algolia REST client: batched `updateObject` writes only.
#[derive(Clone)]
pub struct AlgoliaClient {
    http: Client,
    base_url: String,
    app_id: String,
    api_key: String,
    retry: RetryPolicy,
}

impl AlgoliaClient {
    /// `host` overrides the default `https://{app_id}.algolia.net`.
    pub fn new(http: Client, app_id: String, api_key: String, host: Option<String>, retry: RetryPolicy) -> Self {
        let base_url = host
            .map(|h| h.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("https://{}.algolia.net", app_id));
        Self { http, base_url, app_id, api_key, retry }
    }

    /// Upserts objects by `objectID`; objects missing from `objects` are left alone.
    pub async fn save_objects(&self, index_name: &str, objects: &[Value]) -> Result<()> {
        if objects.is_empty() {
            return Ok(());
        }
        let url = format!("{}/1/indexes/{}/batch", self.base_url, urlencoding::encode(index_name));
        let requests: Vec<Value> = objects
            .iter()
            .map(|o| json!({ "action": "updateObject", "body": o }))
            .collect();
        let body = json!({ "requests": requests });

        tracing::info!(index = %index_name, objects = objects.len(), "algolia batch: sending request");
        let response = send_with_retry("algolia", self.retry, || {
            self.http
                .post(&url)
                .header("X-Algolia-Application-Id", &self.app_id)
                .header("X-Algolia-API-Key", &self.api_key)
                .json(&body)
        })
        .await?;

        if !response.status().is_success() {
            return Err(JobsError::SearchBackend(format!(
                "algolia batch failed: {}",
                failure_summary(response).await
            )));
        }
        let result: Value = response.json().await?;
        tracing::info!(
            index = %index_name,
            objects = objects.len(),
            task_id = ?result.get("taskID"),
            "algolia batch: success"
        );
        Ok(())
    }
}
