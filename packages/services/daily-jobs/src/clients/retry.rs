use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::config::Config;
use crate::models::*;

/// Bounded exponential backoff for transient upstream failures
/// (transport errors, 5xx, 429).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(cfg: &Config) -> Self {
        Self { max_retries: cfg.http_max_retries, base_backoff_ms: cfg.http_retry_backoff_ms }
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_backoff_ms.saturating_mul(1u64 << attempt.min(16)))
    }
}

pub fn build_http_client(cfg: &Config) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_millis(cfg.http_timeout_ms))
        .connect_timeout(Duration::from_millis(cfg.http_timeout_ms.min(10_000)))
        .user_agent(cfg.http_user_agent.clone())
        .build()?;
    Ok(client)
}

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Sends the request produced by `build`, rebuilding it for every attempt.
/// Non-transient responses (including errors) are returned to the caller as-is.
pub async fn send_with_retry<F>(service: &str, policy: RetryPolicy, build: F) -> Result<Response>
where
    F: Fn() -> RequestBuilder,
{
    let mut attempt: u32 = 0;
    loop {
        match build().send().await {
            Ok(response) => {
                let status = response.status();
                if is_transient(status) && attempt < policy.max_retries {
                    let backoff = policy.backoff(attempt);
                    tracing::warn!(
                        service = service,
                        status = %status,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        "transient upstream status; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                    continue;
                }
                return Ok(response);
            }
            Err(e) => {
                if attempt < policy.max_retries {
                    let backoff = policy.backoff(attempt);
                    tracing::warn!(
                        service = service,
                        error = %e,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        "upstream request error; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                    continue;
                }
                return Err(JobsError::Http(e));
            }
        }
    }
}

/// Status plus a bounded preview of the body, for error messages.
pub async fn failure_summary(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    format!("status={} body={}", status, text.chars().take(500).collect::<String>())
}
