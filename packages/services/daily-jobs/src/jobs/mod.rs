//! Runs the daily steps in their fixed order and attributes failures to a step.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::Instrument;

use crate::models::*;
use crate::storage::{CatalogSource, TrendingWriter};
use crate::sync::SearchBackend;
use crate::tuner::ConfigTuner;

pub struct DailyJobs {
    catalog: Arc<dyn CatalogSource>,
    backend: Arc<dyn SearchBackend>,
    trending: Arc<dyn TrendingWriter>,
    tuner: ConfigTuner,
}

impl DailyJobs {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        backend: Arc<dyn SearchBackend>,
        trending: Arc<dyn TrendingWriter>,
        tuner: ConfigTuner,
    ) -> Self {
        Self { catalog, backend, trending, tuner }
    }

    pub async fn run(&self) -> std::result::Result<RunReport, StepFailure> {
        self.run_on(Utc::now().date_naive()).await
    }

    /// Catalog sync, then trending, then tuning. The first failing step
    /// aborts the run.
    pub async fn run_on(&self, today: NaiveDate) -> std::result::Result<RunReport, StepFailure> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("daily_jobs.run", run_id = %run_id, backend = %self.backend.kind());
        async move {
            tracing::info!("daily jobs: starting");

            let catalog = self.sync_catalog().await.map_err(StepFailure::at(JobStep::CatalogSync))?;
            tracing::info!(outcome = ?catalog, "daily jobs: catalog sync done");

            self.trending.recompute().await.map_err(StepFailure::at(JobStep::Trending))?;

            let tuning = self.tuner.tune(today).await.map_err(StepFailure::at(JobStep::Tuning))?;
            tracing::info!(outcome = ?tuning, "daily jobs: tuning done");

            Ok(RunReport { run_id, catalog, tuning })
        }
        .instrument(span)
        .await
    }

    async fn sync_catalog(&self) -> Result<SyncOutcome> {
        // An unconfigured backend reports its own skip without a catalog read
        if !self.backend.is_configured() {
            return self.backend.replace_catalog(&[]).await;
        }
        let records = self.catalog.active_records().await?;
        self.backend.replace_catalog(&records).await
    }
}
