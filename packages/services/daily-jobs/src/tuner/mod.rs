//! KPI-aware tuning of the remote configuration target windows.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use crate::models::*;
use crate::storage::KpiSource;

/// A fetched remote configuration template. `body` is kept as raw JSON so
/// parameters this service does not know about survive the round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfigTemplate {
    pub etag: Option<String>,
    pub body: Value,
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn fetch_template(&self) -> Result<RemoteConfigTemplate>;
    async fn publish_template(&self, template: &RemoteConfigTemplate) -> Result<()>;
}

pub struct ConfigTuner {
    kpis: Arc<dyn KpiSource>,
    templates: Option<Arc<dyn TemplateStore>>,
}

impl ConfigTuner {
    pub fn new(kpis: Arc<dyn KpiSource>, templates: Option<Arc<dyn TemplateStore>>) -> Self {
        Self { kpis, templates }
    }

    /// Reads the KPI snapshot for the day before `today`, computes both
    /// windows and publishes them as one template update.
    pub async fn tune(&self, today: NaiveDate) -> Result<TuneOutcome> {
        let day = today.pred_opt().unwrap_or(today);
        let kpi = self.kpis.daily_kpi(day).await?;
        let windows = TargetWindows::from_kpi(kpi.as_ref());
        tracing::info!(
            kpi_date = %kpi_doc_id(day),
            kpi_found = kpi.is_some(),
            ctr_low = windows.ctr.low,
            ctr_high = windows.ctr.high,
            div_low = windows.diversity.low,
            div_high = windows.diversity.high,
            "computed target windows"
        );

        let Some(templates) = &self.templates else {
            tracing::info!("Remote config credentials missing, skipping publish.");
            return Ok(TuneOutcome::Skipped {
                windows,
                reason: "REMOTE_CONFIG_PROJECT_ID / REMOTE_CONFIG_ACCESS_TOKEN not set".to_string(),
            });
        };

        let mut template = templates.fetch_template().await?;
        windows.apply_to_template(&mut template.body)?;
        templates.publish_template(&template).await?;
        Ok(TuneOutcome::Published { windows })
    }
}
