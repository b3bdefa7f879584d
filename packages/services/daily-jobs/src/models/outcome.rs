use serde::Serialize;

use crate::config::SearchEngineKind;
use crate::models::{JobsError, TargetWindows};

/// Result of one catalog synchronization. A skip is not a failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Synced { backend: SearchEngineKind, pushed: usize },
    Skipped { backend: SearchEngineKind, reason: String },
}

impl SyncOutcome {
    pub fn pushed(&self) -> usize {
        match self {
            SyncOutcome::Synced { pushed, .. } => *pushed,
            SyncOutcome::Skipped { .. } => 0,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, SyncOutcome::Skipped { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TuneOutcome {
    Published { windows: TargetWindows },
    Skipped { windows: TargetWindows, reason: String },
}

impl TuneOutcome {
    pub fn windows(&self) -> &TargetWindows {
        match self {
            TuneOutcome::Published { windows } | TuneOutcome::Skipped { windows, .. } => windows,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStep {
    CatalogSync,
    Trending,
    Tuning,
}

impl JobStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStep::CatalogSync => "catalog_sync",
            JobStep::Trending => "trending",
            JobStep::Tuning => "tuning",
        }
    }
}

impl std::fmt::Display for JobStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A run aborted at `step`; later steps did not execute.
#[derive(Debug, thiserror::Error)]
#[error("{step} failed: {error}")]
pub struct StepFailure {
    pub step: JobStep,
    #[source]
    pub error: JobsError,
}

impl StepFailure {
    pub fn at(step: JobStep) -> impl FnOnce(JobsError) -> StepFailure {
        move |error| StepFailure { step, error }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub catalog: SyncOutcome,
    pub tuning: TuneOutcome,
}
