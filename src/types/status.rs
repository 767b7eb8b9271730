//! Decision records and operational status types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Alert Status
// ============================================================================

/// Regional alert status emitted by the decision engine.
///
/// Ordering matters: `Normal < Caution < Warning`. The numeric level matches
/// the per-cell risk flag domain (0/1/2) so dashboards can reuse the same
/// color mapping for both.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlertStatus {
    /// No significant convective signal.
    Normal = 0,
    /// Persistent moderate signal — extreme weather watch.
    Caution = 1,
    /// Persistent strong signal — early warning.
    Warning = 2,
}

impl AlertStatus {
    /// Map an aggregated regional risk value onto a status.
    ///
    /// Boundaries are inclusive lower bounds: exactly 1.0 is Caution,
    /// exactly 2.0 is Warning.
    pub fn from_risk_value(value: f64) -> Self {
        if value >= 2.0 {
            AlertStatus::Warning
        } else if value >= 1.0 {
            AlertStatus::Caution
        } else {
            AlertStatus::Normal
        }
    }

    /// Numeric level (0/1/2) for the status snapshot.
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Operational label as displayed to forecasters.
    pub fn label(self) -> &'static str {
        match self {
            AlertStatus::Normal => "NORMAL",
            AlertStatus::Caution => "WASPADA CUACA EKSTREM",
            AlertStatus::Warning => "PERINGATAN DINI",
        }
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Default for AlertStatus {
    fn default() -> Self {
        AlertStatus::Normal
    }
}

// ============================================================================
// Decision Records
// ============================================================================

/// One decision per timestep. Terminal output of the pipeline; immutable
/// once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    /// Observation timestamp (UTC).
    pub time: DateTime<Utc>,
    /// Aggregated regional risk (0.0 - 2.0; fractional under mean aggregation).
    pub risk_value: f64,
    /// Status label derived from `risk_value`.
    pub status: AlertStatus,
}

// ============================================================================
// Published Status Snapshot
// ============================================================================

/// Machine-readable snapshot written by the operational loop after each
/// successful cycle (`latest_status.json`). Consumed by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestStatus {
    /// Wall-clock time the cycle completed (UTC).
    pub timestamp_utc: DateTime<Utc>,
    /// Region the decision applies to.
    pub region: String,
    /// Numeric risk level of the latest decision (0/1/2).
    pub risk_level: u8,
    /// Status label of the latest decision.
    pub risk_text: String,
    /// Aggregated regional risk value of the latest decision.
    pub risk_value: f64,
    /// Observation time of the latest decision (UTC).
    pub observation_time: DateTime<Utc>,
    /// Operational narrative for display.
    pub narration: String,
}

/// Significant-event record appended to the event log. NORMAL cycles are
/// never logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Wall-clock time the event was logged (UTC).
    pub time_utc: DateTime<Utc>,
    /// Region the event applies to.
    pub region: String,
    /// Status label at the time of the event.
    pub status: String,
    /// Narrative text at the time of the event.
    pub narrative: String,
}

// ============================================================================
// Tests
// ============================================================================
