use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Search backend selected once at startup from `SEARCH_ENGINE`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SearchEngineKind {
    /// Hosted backend, additive upsert synchronization.
    Algolia,
    /// Self-hosted backend, full replacement synchronization.
    Meilisearch,
}

impl SearchEngineKind {
    /// Case-insensitive; anything unrecognized (or unset) selects the hosted backend.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_uppercase()).as_deref() {
            Some("MEILI") | Some("MEILISEARCH") => SearchEngineKind::Meilisearch,
            _ => SearchEngineKind::Algolia,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchEngineKind::Algolia => "algolia",
            SearchEngineKind::Meilisearch => "meilisearch",
        }
    }
}

impl std::fmt::Display for SearchEngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub port: u16,
    pub mongodb_uri: String,
    pub database_name: String,
    pub catalog_collection: String,
    pub kpi_collection: String,
    pub public_collection: String,
    // Bearer secret for the trigger endpoint; requests are rejected while unset
    #[serde(skip_serializing)]
    pub daily_jobs_token: Option<String>,
    pub search_engine: SearchEngineKind,
    // Hosted (Algolia) backend
    pub algolia_app_id: Option<String>,
    #[serde(skip_serializing)]
    pub algolia_api_key: Option<String>,
    pub algolia_index_name: String,
    pub algolia_host: Option<String>,
    pub algolia_batch_size: usize,
    // Self-hosted (Meilisearch) backend
    pub meili_host: Option<String>,
    #[serde(skip_serializing)]
    pub meili_api_key: Option<String>,
    pub meili_index_name: String,
    pub meili_task_poll_ms: u64,
    pub meili_task_timeout_ms: u64,
    // Remote configuration template
    pub remote_config_endpoint: String,
    pub remote_config_project_id: Option<String>,
    #[serde(skip_serializing)]
    pub remote_config_access_token: Option<String>,
    // Outbound HTTP
    pub http_timeout_ms: u64,
    pub http_user_agent: String,
    pub http_max_retries: u32,
    pub http_retry_backoff_ms: u64,
    pub enable_scheduler: bool,
    pub daily_jobs_cron: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port: u16 = get("PORT").and_then(|s| s.parse().ok()).unwrap_or(8080);
        let mongodb_uri = get("MONGODB_URI").unwrap_or_else(|| "mongodb://localhost:27017".to_string());
        let database_name = get("DATABASE_NAME").unwrap_or_else(|| "catalog".to_string());
        let catalog_collection = get("CATALOG_COLLECTION").unwrap_or_else(|| "products".to_string());
        let kpi_collection = get("KPI_COLLECTION").unwrap_or_else(|| "kpi_daily".to_string());
        let public_collection = get("PUBLIC_COLLECTION").unwrap_or_else(|| "public".to_string());
        let daily_jobs_token = get("DAILY_JOBS_TOKEN");
        let search_engine = SearchEngineKind::parse(get("SEARCH_ENGINE").as_deref());

        let algolia_app_id = get("ALGOLIA_APP_ID");
        let algolia_api_key = get("ALGOLIA_API_KEY");
        let algolia_index_name = get("ALGOLIA_INDEX_NAME").unwrap_or_else(|| "products".to_string());
        let algolia_host = get("ALGOLIA_HOST");
        let algolia_batch_size: usize = get("ALGOLIA_BATCH_SIZE")
            .and_then(|s| s.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(1000);

        let meili_host = get("MEILI_HOST");
        let meili_api_key = get("MEILI_API_KEY");
        let meili_index_name = get("MEILI_INDEX_NAME").unwrap_or_else(|| "products".to_string());
        let meili_task_poll_ms: u64 = get("MEILI_TASK_POLL_MS").and_then(|s| s.parse().ok()).unwrap_or(100);
        let meili_task_timeout_ms: u64 = get("MEILI_TASK_TIMEOUT_MS").and_then(|s| s.parse().ok()).unwrap_or(300_000);

        let remote_config_endpoint = get("REMOTE_CONFIG_ENDPOINT")
            .unwrap_or_else(|| "https://firebaseremoteconfig.googleapis.com".to_string());
        let remote_config_project_id = get("REMOTE_CONFIG_PROJECT_ID");
        let remote_config_access_token = get("REMOTE_CONFIG_ACCESS_TOKEN");

        let http_timeout_ms: u64 = get("HTTP_TIMEOUT_MS").and_then(|s| s.parse().ok()).unwrap_or(60_000);
        let http_user_agent = get("HTTP_USER_AGENT").unwrap_or_else(|| "daily-jobs-service/1.0".to_string());
        let http_max_retries: u32 = get("HTTP_MAX_RETRIES").and_then(|s| s.parse().ok()).unwrap_or(3);
        let http_retry_backoff_ms: u64 = get("HTTP_RETRY_BACKOFF_MS").and_then(|s| s.parse().ok()).unwrap_or(500);
        let enable_scheduler: bool = get("ENABLE_SCHEDULER").and_then(|s| s.parse().ok()).unwrap_or(false);
        let daily_jobs_cron = get("DAILY_JOBS_CRON").unwrap_or_else(|| "0 0 3 * * *".to_string());

        Self {
            port,
            mongodb_uri,
            database_name,
            catalog_collection,
            kpi_collection,
            public_collection,
            daily_jobs_token,
            search_engine,
            algolia_app_id,
            algolia_api_key,
            algolia_index_name,
            algolia_host,
            algolia_batch_size,
            meili_host,
            meili_api_key,
            meili_index_name,
            meili_task_poll_ms,
            meili_task_timeout_ms,
            remote_config_endpoint,
            remote_config_project_id,
            remote_config_access_token,
            http_timeout_ms,
            http_user_agent,
            http_max_retries,
            http_retry_backoff_ms,
            enable_scheduler,
            daily_jobs_cron,
        }
    }
}

/// Log filter from `RUST_LOG`-style directives; `info` when unset or unparsable.
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
