use async_trait::async_trait;
use reqwest::header::{ETAG, IF_MATCH};
use reqwest::Client;
use serde_json::Value;

use crate::clients::retry::{failure_summary, send_with_retry, RetryPolicy};
use crate::models::*;
use crate::tuner::{RemoteConfigTemplate, TemplateStore};

/// Firebase Remote Config REST client (`/v1/projects/{project}/remoteConfig`).
#[derive(Clone)]
pub struct RemoteConfigClient {
    http: Client,
    url: String,
    access_token: String,
    retry: RetryPolicy,
}

impl RemoteConfigClient {
    pub fn new(http: Client, endpoint: &str, project_id: &str, access_token: String, retry: RetryPolicy) -> Self {
        let url = format!(
            "{}/v1/projects/{}/remoteConfig",
            endpoint.trim_end_matches('/'),
            urlencoding::encode(project_id)
        );
        Self { http, url, access_token, retry }
    }
}

#[async_trait]
impl TemplateStore for RemoteConfigClient {
    async fn fetch_template(&self) -> Result<RemoteConfigTemplate> {
        let response = send_with_retry("remote_config", self.retry, || {
            self.http.get(&self.url).bearer_auth(&self.access_token)
        })
        .await?;
        if !response.status().is_success() {
            return Err(JobsError::RemoteConfig(format!(
                "get template failed: {}",
                failure_summary(response).await
            )));
        }
        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body: Value = response.json().await?;
        Ok(RemoteConfigTemplate { etag, body })
    }

    async fn publish_template(&self, template: &RemoteConfigTemplate) -> Result<()> {
        // Without an etag the publish is forced over whatever is current
        let if_match = template.etag.clone().unwrap_or_else(|| "*".to_string());
        let response = send_with_retry("remote_config", self.retry, || {
            self.http
                .put(&self.url)
                .bearer_auth(&self.access_token)
                .header(IF_MATCH, &if_match)
                .json(&template.body)
        })
        .await?;
        if !response.status().is_success() {
            return Err(JobsError::RemoteConfig(format!(
                "publish template failed: {}",
                failure_summary(response).await
            )));
        }
        tracing::info!(etag = ?response.headers().get(ETAG), "remote config template published");
        Ok(())
    }
}
