//! Detection Pipeline Orchestrator
//!
//! Runs the fixed stage chain on one input grid:
//!
//! ```text
//! STAGE 1: Index computation (RCR if absent, CI)
//! STAGE 2: Per-cell risk classification
//! STAGE 3: Temporal consistency filter
//! STAGE 4: Regional aggregation
//! STAGE 5: Decision engine
//! ```
//!
//! Each stage sees the completed output of the previous one; any stage
//! failure aborts the run and propagates to the caller (the operational
//! loop owns retry policy). The pipeline holds no state between runs — a
//! run is a pure function of `(grid, config)`.

use tracing::debug;

use crate::config::DetectionConfig;
use crate::detector::{aggregate_region, classify_risk, decide, filter_transients};
use crate::grid::{var, Grid};
use crate::indices::calculate_indices;
use crate::types::{Decision, DetectionError};

/// Result bundle of one pipeline run.
#[derive(Debug, Clone)]
pub struct DetectionBundle {
    /// Input grid augmented with RCR, CI, and both flag variables. The
    /// map/dashboard collaborator reads `risk_flag_filtered` from here.
    pub grid: Grid,
    /// Aggregated regional risk, one value per timestep.
    pub regional_risk: Vec<f64>,
    /// One decision per timestep, in input time order.
    pub decisions: Vec<Decision>,
}

impl DetectionBundle {
    /// The most recent decision of the run, if the grid had any timesteps.
    pub fn latest(&self) -> Option<&Decision> {
        self.decisions.last()
    }
}

/// Composes the detection stages in fixed order.
pub struct DetectionPipeline {
    config: DetectionConfig,
}

impl DetectionPipeline {
    /// Build a pipeline after validating the configuration.
    pub fn new(config: DetectionConfig) -> Result<Self, DetectionError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Run all stages on `input` and return the result bundle.
    ///
    /// The input grid is not mutated; the returned bundle carries its own
    /// augmented copy. A fresh run needs BT; a partial run may instead
    /// supply a grid already carrying RCR and/or CI.
    pub fn run(&self, input: &Grid) -> Result<DetectionBundle, DetectionError> {
        let shape = input.shape();
        debug!(
            nt = shape.nt,
            nlat = shape.nlat,
            nlon = shape.nlon,
            "Starting detection run"
        );

        let mut grid = calculate_indices(input)?;

        let raw_flags = classify_risk(&grid, &self.config.thresholds)?;
        grid.insert(var::RISK_FLAG, raw_flags.to_f64())?;

        let filtered = filter_transients(&raw_flags, self.config.min_duration);
        grid.insert(var::RISK_FLAG_FILTERED, filtered.to_f64())?;

        let regional_risk = aggregate_region(&filtered, self.config.aggregation);
        let decisions = decide(grid.times(), &regional_risk);

        debug!(
            timesteps = decisions.len(),
            peak_risk = regional_risk.iter().copied().fold(0.0_f64, f64::max),
            "Detection run complete"
        );

        Ok(DetectionBundle {
            grid,
            regional_risk,
            decisions,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
