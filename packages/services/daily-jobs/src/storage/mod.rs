//! Primary-store access. Each concern sits behind a trait so the job runner
//! can be driven by in-memory sources in tests.

mod catalog;
mod kpi;
mod trending;

pub use catalog::*;
pub use kpi::*;
pub use trending::*;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::*;

/// Reads the active catalog snapshot.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// All records with `active == true`, in store order.
    async fn active_records(&self) -> Result<Vec<CatalogRecord>>;
}

/// Read-only access to daily KPI snapshots.
#[async_trait]
pub trait KpiSource: Send + Sync {
    async fn daily_kpi(&self, date: NaiveDate) -> Result<Option<DailyKpi>>;
}

#[async_trait]
pub trait TrendingWriter: Send + Sync {
    async fn recompute(&self) -> Result<()>;
}
