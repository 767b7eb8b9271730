//! Spatial reduction of filtered flags to one regional value per timestep.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::DetectionError;

use super::RiskField;

/// Spatial reduction method.
///
/// `Max` is the operational default: a single danger cell elevates the whole
/// region. `Mean` smooths isolated detections and is kept for analysis use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Aggregation {
    Max,
    Mean,
}

impl Default for Aggregation {
    fn default() -> Self {
        Aggregation::Max
    }
}

impl std::str::FromStr for Aggregation {
    type Err = DetectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "max" => Ok(Aggregation::Max),
            "mean" => Ok(Aggregation::Mean),
            other => Err(DetectionError::UnknownAggregationMethod(other.to_string())),
        }
    }
}

impl TryFrom<String> for Aggregation {
    type Error = DetectionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Aggregation> for String {
    fn from(a: Aggregation) -> Self {
        match a {
            Aggregation::Max => "max".to_string(),
            Aggregation::Mean => "mean".to_string(),
        }
    }
}

impl std::fmt::Display for Aggregation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Aggregation::Max => f.write_str("max"),
            Aggregation::Mean => f.write_str("mean"),
        }
    }
}

/// Reduce filtered flags over all cells of the region, per timestep.
///
/// Timesteps are independent and reduce in parallel; the reduction over
/// cells is commutative, so the result is identical to sequential execution.
pub fn aggregate_region(flags: &RiskField, method: Aggregation) -> Vec<f64> {
    let shape = flags.shape();
    let cells = shape.cells();

    flags
        .data()
        .par_chunks(cells)
        .map(|step| match method {
            Aggregation::Max => f64::from(step.iter().copied().max().unwrap_or(0)),
            Aggregation::Mean => {
                step.iter().map(|&v| f64::from(v)).sum::<f64>() / cells as f64
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridShape;

    #[test]
    fn test_max_and_mean() {
        let shape = GridShape {
            nt: 1,
            nlat: 1,
            nlon: 3,
        };
        let flags = RiskField::new(vec![0, 1, 2], shape);
        assert_eq!(aggregate_region(&flags, Aggregation::Max), vec![2.0]);
        assert_eq!(aggregate_region(&flags, Aggregation::Mean), vec![1.0]);
    }

    #[test]
    fn test_per_timestep_series() {
        let shape = GridShape {
            nt: 3,
            nlat: 2,
            nlon: 1,
        };
        let flags = RiskField::new(vec![0, 0, 2, 0, 1, 1], shape);
        assert_eq!(
            aggregate_region(&flags, Aggregation::Max),
            vec![0.0, 2.0, 1.0]
        );
        assert_eq!(
            aggregate_region(&flags, Aggregation::Mean),
            vec![0.0, 1.0, 1.0]
        );
    }

    #[test]
    fn test_unknown_method_string() {
        let err = "median".parse::<Aggregation>().unwrap_err();
        assert!(matches!(
            err,
            DetectionError::UnknownAggregationMethod(m) if m == "median"
        ));
        assert_eq!("MAX".parse::<Aggregation>().unwrap(), Aggregation::Max);
        assert_eq!("mean".parse::<Aggregation>().unwrap(), Aggregation::Mean);
    }
}
