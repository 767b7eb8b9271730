//! Per-cell risk classification from the composite index.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::grid::{var, Grid};
use crate::types::DetectionError;

use super::RiskField;

/// Operator-tunable classification thresholds.
///
/// Defaults reproduce the operational values; per-region overrides come in
/// through the TOML config. The CI factor weights are NOT here — those are
/// fixed design parameters of the index itself (see [`crate::indices`]).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierThresholds {
    /// CI at or above this is danger on its own.
    pub ci_high: f64,
    /// CI at or above this opens the secondary (caution) rule.
    pub ci_med: f64,
    /// Minimum cooling rate for the secondary rule (K/10min).
    pub rcr_threshold: f64,
    /// Maximum BT for the secondary rule (K).
    pub bt_deep: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            ci_high: 0.7,
            ci_med: 0.4,
            rcr_threshold: 3.0,
            bt_deep: 235.0,
        }
    }
}

impl ClassifierThresholds {
    /// Reject threshold sets that cannot order the rules correctly.
    pub fn validate(&self) -> Result<(), DetectionError> {
        if !(0.0..=1.0).contains(&self.ci_high) || !(0.0..=1.0).contains(&self.ci_med) {
            return Err(DetectionError::InvalidConfig(format!(
                "CI thresholds must lie in [0, 1], got ci_high={} ci_med={}",
                self.ci_high, self.ci_med
            )));
        }
        if self.ci_med > self.ci_high {
            return Err(DetectionError::InvalidConfig(format!(
                "ci_med ({}) must not exceed ci_high ({})",
                self.ci_med, self.ci_high
            )));
        }
        Ok(())
    }
}

/// Classify every `(time, lat, lon)` position into a risk flag.
///
/// Rules are evaluated highest risk first; the first match wins:
///
/// 1. `CI >= ci_high` → 2 (danger)
/// 2. `CI >= ci_med && RCR >= rcr_threshold && BT <= bt_deep` → 1 (caution)
/// 3. otherwise → 0 (low)
///
/// CI is required; RCR and BT are optional and only serve the secondary
/// rule — when either is absent the rule simply cannot fire. NaN values
/// fail every comparison, so masked cells classify as low.
pub fn classify_risk(
    grid: &Grid,
    thresholds: &ClassifierThresholds,
) -> Result<RiskField, DetectionError> {
    let ci = grid.require(var::CI)?;
    let rcr = grid.field(var::RCR);
    let bt = grid.field(var::BT);
    let th = *thresholds;

    let data: Vec<u8> = ci
        .par_iter()
        .enumerate()
        .map(|(i, &ci_val)| {
            if ci_val >= th.ci_high {
                2
            } else {
                let rapid = rcr.is_some_and(|r| r[i] >= th.rcr_threshold);
                let deep = bt.is_some_and(|b| b[i] <= th.bt_deep);
                u8::from(ci_val >= th.ci_med && rapid && deep)
            }
        })
        .collect();

    Ok(RiskField::new(data, grid.shape()))
}

// ============================================================================
// Tests
// ============================================================================
