pub mod catalog;
pub mod kpi;
pub mod thresholds;
pub mod outcome;

pub use catalog::*;
pub use kpi::*;
pub use thresholds::*;
pub use outcome::*;

#[derive(Debug, thiserror::Error)]
pub enum JobsError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Search backend error: {0}")]
    SearchBackend(String),

    #[error("Remote config error: {0}")]
    RemoteConfig(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

pub type Result<T> = std::result::Result<T, JobsError>;
