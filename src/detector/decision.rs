//! Decision engine: map the regional risk series onto status records.

use chrono::{DateTime, Utc};

use crate::types::{AlertStatus, Decision};

/// Produce one [`Decision`] per timestep from the aggregated regional risk.
///
/// Input time order is preserved. Boundary values map to the higher
/// category: exactly 1.0 is caution, exactly 2.0 is early warning (see
/// [`AlertStatus::from_risk_value`]).
pub fn decide(times: &[DateTime<Utc>], regional_risk: &[f64]) -> Vec<Decision> {
    debug_assert_eq!(times.len(), regional_risk.len());
    times
        .iter()
        .zip(regional_risk.iter())
        .map(|(&time, &risk_value)| Decision {
            time,
            risk_value,
            status: AlertStatus::from_risk_value(risk_value),
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
