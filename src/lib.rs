//! SIGAP: Convective Early-Warning Intelligence
//!
//! Operational nowcasting engine for puting beliung (tornadic convection)
//! detection from satellite brightness-temperature grids.
//!
//! ## Architecture
//!
//! - **Preprocessor**: physical-range QC, gap filling, temporal smoothing
//! - **Index Calculator**: Rapid Cooling Rate and Composite Index
//! - **Detector**: per-cell risk classification, temporal noise filter,
//!   regional aggregation, operational decision
//! - **Pipeline**: fixed-order stage orchestration, fail-fast
//! - **Operational Loop**: periodic cycles, last-known-good status,
//!   snapshot + event-log publishing

pub mod config;
pub mod detector;
pub mod grid;
pub mod indices;
pub mod narrator;
pub mod ops;
pub mod pipeline;
pub mod preprocess;
pub mod source;
pub mod types;

// Re-export configuration
pub use config::{DetectionConfig, SigapConfig};

// Re-export commonly used types
pub use types::{AlertStatus, Decision, DetectionError, EventRecord, LatestStatus};

// Re-export the grid and pipeline entry points
pub use grid::{BoundingBox, Grid, GridShape};
pub use pipeline::{DetectionBundle, DetectionPipeline};

// Re-export detector stages for standalone use
pub use detector::{
    aggregate_region, classify_risk, decide, filter_transients, Aggregation,
    ClassifierThresholds, RiskField,
};

// Re-export operational components
pub use ops::{OperationalLoop, StatusPublisher};
pub use source::{GridSource, SyntheticSource};
