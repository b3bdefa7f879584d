//! KPI-aware threshold windows published to the remote configuration template.
//!
//! Both windows are clamped into fixed absolute bounds and always satisfy
//! `low < high`; a missing or implausible KPI snapshot leaves the static
//! defaults in place.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::models::{DailyKpi, JobsError, Result};

pub const DEFAULT_CTR_WINDOW: ThresholdWindow = ThresholdWindow { low: 0.12, high: 0.16 };
pub const DEFAULT_DIVERSITY_WINDOW: ThresholdWindow = ThresholdWindow { low: 0.55, high: 0.70 };

pub const CTR_LOW_PARAM: &str = "targetCtrLow";
pub const CTR_HIGH_PARAM: &str = "targetCtrHigh";
pub const DIVERSITY_LOW_PARAM: &str = "targetDivLow";
pub const DIVERSITY_HIGH_PARAM: &str = "targetDivHigh";

/// Accepted operating band `(low, high)` for a downstream ranking parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdWindow {
    pub low: f64,
    pub high: f64,
}

pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    lo.max(x.min(hi))
}

impl ThresholdWindow {
    /// CTR is only trusted strictly inside `(0, 0.8)`.
    pub fn for_ctr(ctr: Option<f64>) -> Self {
        match ctr {
            Some(c) if c.is_finite() && c > 0.0 && c < 0.8 => {
                let low = clamp(c - 0.01, 0.08, 0.22);
                let high = (low + 0.02).max(clamp(c + 0.01, 0.08, 0.28));
                Self { low, high }
            }
            _ => DEFAULT_CTR_WINDOW,
        }
    }

    /// Any numeric diversity is accepted, infinities included; only NaN falls back.
    pub fn for_diversity(diversity: Option<f64>) -> Self {
        match diversity {
            Some(d) if !d.is_nan() => {
                let low = clamp(d - 0.05, 0.45, 0.80);
                let high = (low + 0.05).max(clamp(d + 0.05, 0.45, 0.90));
                Self { low, high }
            }
            _ => DEFAULT_DIVERSITY_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetWindows {
    pub ctr: ThresholdWindow,
    pub diversity: ThresholdWindow,
}

impl TargetWindows {
    pub fn from_kpi(kpi: Option<&DailyKpi>) -> Self {
        Self {
            ctr: ThresholdWindow::for_ctr(kpi.and_then(|k| k.ctr)),
            diversity: ThresholdWindow::for_diversity(kpi.and_then(|k| k.diversity)),
        }
    }

    /// Parameter name → stringified value, in publish order.
    pub fn parameters(&self) -> [(&'static str, String); 4] {
        [
            (CTR_LOW_PARAM, self.ctr.low.to_string()),
            (CTR_HIGH_PARAM, self.ctr.high.to_string()),
            (DIVERSITY_LOW_PARAM, self.diversity.low.to_string()),
            (DIVERSITY_HIGH_PARAM, self.diversity.high.to_string()),
        ]
    }

    /// Overwrites the four target parameters inside `template.parameters`,
    /// leaving every other key of the template untouched.
    pub fn apply_to_template(&self, template: &mut Value) -> Result<()> {
        let root = template
            .as_object_mut()
            .ok_or_else(|| JobsError::RemoteConfig("template is not a JSON object".to_string()))?;
        let params = root
            .entry("parameters")
            .or_insert_with(|| Value::Object(Map::new()));
        if !params.is_object() {
            *params = Value::Object(Map::new());
        }
        if let Some(map) = params.as_object_mut() {
            for (name, value) in self.parameters() {
                map.insert(name.to_string(), json!({ "defaultValue": { "value": value } }));
            }
        }
        Ok(())
    }
}
