//! Risk detection stages: per-cell classification, temporal noise
//! filtering, regional aggregation, and the operational decision.
//!
//! Stage order is fixed (classify → filter → aggregate → decide) and each
//! stage is a pure transformation of its inputs. The orchestrator in
//! [`crate::pipeline`] wires them together.

mod aggregate;
mod classifier;
mod decision;
mod temporal;

pub use aggregate::{aggregate_region, Aggregation};
pub use classifier::{classify_risk, ClassifierThresholds};
pub use decision::decide;
pub use temporal::filter_transients;

use crate::grid::GridShape;

/// Per-cell, per-timestep risk flags (0 = low, 1 = caution, 2 = danger) in
/// `(time, lat, lon)` row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskField {
    data: Vec<u8>,
    shape: GridShape,
}

impl RiskField {
    pub(crate) fn new(data: Vec<u8>, shape: GridShape) -> Self {
        debug_assert_eq!(data.len(), shape.len());
        Self { data, shape }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Flag at `(t, y, x)`.
    pub fn get(&self, t: usize, y: usize, x: usize) -> u8 {
        self.data[self.shape.idx(t, y, x)]
    }

    /// Flags for one timestep, as a contiguous spatial slice.
    pub fn timestep(&self, t: usize) -> &[u8] {
        let cells = self.shape.cells();
        &self.data[t * cells..(t + 1) * cells]
    }

    /// Numeric copy for attaching to a [`crate::grid::Grid`] so the map
    /// renderer can consume flags like any other variable.
    pub fn to_f64(&self) -> Vec<f64> {
        self.data.iter().map(|&v| f64::from(v)).collect()
    }
}
