//! Detection error taxonomy.
//!
//! Every failure in the detection core maps to one of these variants. No
//! stage substitutes defaults for missing required data — an incomplete grid
//! fails loudly rather than producing a misleading "NORMAL".

use thiserror::Error;

/// Errors produced by the detection pipeline and its stages.
#[derive(Debug, Error)]
pub enum DetectionError {
    /// A required grid variable (e.g. `BT_IR`, `CI`) is absent.
    #[error("required variable '{0}' is not present in the grid")]
    MissingVariable(String),

    /// Two grids (or a variable and its host grid) disagree on an axis.
    #[error("coordinate mismatch on axis '{axis}' while attaching '{variable}'")]
    CoordinateMismatch {
        variable: String,
        axis: &'static str,
    },

    /// Aggregation method string is not one of the supported reducers.
    #[error("unknown aggregation method '{0}' (expected 'max' or 'mean')")]
    UnknownAggregationMethod(String),

    /// A variable buffer does not match the grid shape.
    #[error("variable '{variable}' has {actual} values, grid shape requires {expected}")]
    ShapeMismatch {
        variable: String,
        expected: usize,
        actual: usize,
    },

    /// A grid axis is empty.
    #[error("grid axis '{0}' is empty")]
    EmptyAxis(&'static str),

    /// A bounding-box subset selected no cells.
    #[error("region subset '{0}' selected no grid cells")]
    EmptySelection(String),

    /// Configuration value outside its valid domain.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
