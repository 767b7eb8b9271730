//! Gridded dataset shared by every pipeline stage.
//!
//! A [`Grid`] holds named variables on common `(time, lat, lon)` axes.
//! Variables are flat `f64` buffers in row-major `(time, lat, lon)` order and
//! always span the full axes; positions where a derived variable is undefined
//! (e.g. the cooling rate at the first timestep) hold NaN. Threshold
//! comparisons against NaN are false, so undefined positions never contribute
//! to an index or a flag.
//!
//! Stages never mutate a grid they received: each stage clones and augments,
//! so a caller's grid is unchanged after a pipeline run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::DetectionError;

/// Canonical variable names used across the pipeline.
pub mod var {
    /// Brightness temperature, Kelvin. Source variable; never derived.
    pub const BT: &str = "BT_IR";
    /// Rapid cooling rate, K per 10 minutes.
    pub const RCR: &str = "RCR";
    /// Composite convective index, dimensionless [0, 1].
    pub const CI: &str = "CI";
    /// Raw per-cell risk flag (0/1/2), attached for map rendering.
    pub const RISK_FLAG: &str = "risk_flag";
    /// Temporally filtered risk flag (0/1/2), attached for map rendering.
    pub const RISK_FLAG_FILTERED: &str = "risk_flag_filtered";
}

// ============================================================================
// Shape and Bounding Box
// ============================================================================

/// Axis lengths of a grid, used for index arithmetic by the detector stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub nt: usize,
    pub nlat: usize,
    pub nlon: usize,
}

impl GridShape {
    /// Total number of values per variable.
    pub fn len(&self) -> usize {
        self.nt * self.nlat * self.nlon
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of spatial cells per timestep.
    pub fn cells(&self) -> usize {
        self.nlat * self.nlon
    }

    /// Flat index of `(t, y, x)`.
    pub fn idx(&self, t: usize, y: usize, x: usize) -> usize {
        (t * self.nlat + y) * self.nlon + x
    }
}

/// Inclusive lat/lon bounding box for region subsetting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }
}

// ============================================================================
// Grid
// ============================================================================

/// Multi-variable dataset on shared `(time, lat, lon)` axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    times: Vec<DateTime<Utc>>,
    lats: Vec<f64>,
    lons: Vec<f64>,
    fields: BTreeMap<String, Vec<f64>>,
}

impl Grid {
    /// Create an empty grid over the given axes.
    ///
    /// Fails with [`DetectionError::EmptyAxis`] if any axis has no points.
    pub fn new(
        times: Vec<DateTime<Utc>>,
        lats: Vec<f64>,
        lons: Vec<f64>,
    ) -> Result<Self, DetectionError> {
        if times.is_empty() {
            return Err(DetectionError::EmptyAxis("time"));
        }
        if lats.is_empty() {
            return Err(DetectionError::EmptyAxis("lat"));
        }
        if lons.is_empty() {
            return Err(DetectionError::EmptyAxis("lon"));
        }
        Ok(Self {
            times,
            lats,
            lons,
            fields: BTreeMap::new(),
        })
    }

    pub fn shape(&self) -> GridShape {
        GridShape {
            nt: self.times.len(),
            nlat: self.lats.len(),
            nlon: self.lons.len(),
        }
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// Names of the variables currently attached, in sorted order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Attach a variable. The buffer must match the grid shape exactly.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), DetectionError> {
        let name = name.into();
        let expected = self.shape().len();
        if values.len() != expected {
            return Err(DetectionError::ShapeMismatch {
                variable: name,
                expected,
                actual: values.len(),
            });
        }
        self.fields.insert(name, values);
        Ok(())
    }

    /// Look up a variable, if present.
    pub fn field(&self, name: &str) -> Option<&[f64]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    /// Mutable access for in-crate transformations (QC masking, filling).
    /// Shape cannot change through this path.
    pub(crate) fn field_mut(&mut self, name: &str) -> Option<&mut [f64]> {
        self.fields.get_mut(name).map(Vec::as_mut_slice)
    }

    /// Look up a required variable.
    ///
    /// Fails with [`DetectionError::MissingVariable`] — stages use this for
    /// their mandatory inputs so an incomplete grid aborts the run.
    pub fn require(&self, name: &str) -> Result<&[f64], DetectionError> {
        self.field(name)
            .ok_or_else(|| DetectionError::MissingVariable(name.to_string()))
    }

    /// Copy a variable from another grid, verifying axis agreement first.
    ///
    /// This is the attachment path for pre-augmented inputs (e.g. an RCR
    /// field computed upstream): axes must match exactly or the run fails
    /// with [`DetectionError::CoordinateMismatch`].
    pub fn attach_from(&mut self, other: &Grid, name: &str) -> Result<(), DetectionError> {
        let mismatch = |axis| DetectionError::CoordinateMismatch {
            variable: name.to_string(),
            axis,
        };
        if self.times != other.times {
            return Err(mismatch("time"));
        }
        if self.lats != other.lats {
            return Err(mismatch("lat"));
        }
        if self.lons != other.lons {
            return Err(mismatch("lon"));
        }
        let values = other.require(name)?;
        self.insert(name, values.to_vec())
    }

    /// Subset to the cells inside an inclusive bounding box.
    ///
    /// Handles ascending or descending lat/lon axes (satellite grids are
    /// frequently north-to-south). All variables are carried over.
    pub fn subset(&self, region: &str, bbox: &BoundingBox) -> Result<Grid, DetectionError> {
        let lat_idx: Vec<usize> = self
            .lats
            .iter()
            .enumerate()
            .filter(|(_, &lat)| lat >= bbox.lat_min && lat <= bbox.lat_max)
            .map(|(i, _)| i)
            .collect();
        let lon_idx: Vec<usize> = self
            .lons
            .iter()
            .enumerate()
            .filter(|(_, &lon)| lon >= bbox.lon_min && lon <= bbox.lon_max)
            .map(|(i, _)| i)
            .collect();

        if lat_idx.is_empty() || lon_idx.is_empty() {
            return Err(DetectionError::EmptySelection(region.to_string()));
        }

        let shape = self.shape();
        let mut out = Grid::new(
            self.times.clone(),
            lat_idx.iter().map(|&i| self.lats[i]).collect(),
            lon_idx.iter().map(|&i| self.lons[i]).collect(),
        )?;

        for (name, values) in &self.fields {
            let mut sub = Vec::with_capacity(shape.nt * lat_idx.len() * lon_idx.len());
            for t in 0..shape.nt {
                for &y in &lat_idx {
                    for &x in &lon_idx {
                        sub.push(values[shape.idx(t, y, x)]);
                    }
                }
            }
            out.insert(name.clone(), sub)?;
        }
        Ok(out)
    }

    /// NaN-skipping minimum of a variable, if any finite value exists.
    pub fn field_min(&self, name: &str) -> Option<f64> {
        self.field(name)?
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<f64>, v| {
                Some(acc.map_or(v, |a| a.min(v)))
            })
    }

    /// NaN-skipping maximum of a variable, if any finite value exists.
    pub fn field_max(&self, name: &str) -> Option<f64> {
        self.field(name)?
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<f64>, v| {
                Some(acc.map_or(v, |a| a.max(v)))
            })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn axis_times(n: usize) -> Vec<DateTime<Utc>> {
        (0..n)
            .map(|i| {
                Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::minutes(10 * i as i64)
            })
            .collect()
    }

    fn small_grid() -> Grid {
        Grid::new(axis_times(3), vec![-8.0, -7.5], vec![112.0, 112.5, 113.0]).unwrap()
    }

    #[test]
    fn test_empty_axis_rejected() {
        let err = Grid::new(vec![], vec![-8.0], vec![112.0]).unwrap_err();
        assert!(matches!(err, DetectionError::EmptyAxis("time")));
        let err = Grid::new(axis_times(1), vec![], vec![112.0]).unwrap_err();
        assert!(matches!(err, DetectionError::EmptyAxis("lat")));
    }

    #[test]
    fn test_insert_shape_checked() {
        let mut grid = small_grid();
        let err = grid.insert(var::BT, vec![0.0; 5]).unwrap_err();
        assert!(matches!(
            err,
            DetectionError::ShapeMismatch {
                expected: 18,
                actual: 5,
                ..
            }
        ));
        assert!(grid.insert(var::BT, vec![290.0; 18]).is_ok());
        assert!(grid.has(var::BT));
    }

    #[test]
    fn test_require_missing_variable() {
        let grid = small_grid();
        let err = grid.require(var::CI).unwrap_err();
        assert!(matches!(err, DetectionError::MissingVariable(name) if name == "CI"));
    }

    #[test]
    fn test_attach_from_checks_axes() {
        let mut a = small_grid();
        let mut b = Grid::new(axis_times(3), vec![-8.0, -7.5], vec![112.0, 112.5, 113.0]).unwrap();
        b.insert(var::RCR, vec![1.0; 18]).unwrap();
        assert!(a.attach_from(&b, var::RCR).is_ok());
        assert_eq!(a.field(var::RCR).unwrap()[0], 1.0);

        // Misaligned lat axis must fail loudly
        let mut c = Grid::new(axis_times(3), vec![-8.1, -7.5], vec![112.0, 112.5, 113.0]).unwrap();
        c.insert(var::RCR, vec![1.0; 18]).unwrap();
        let err = a.attach_from(&c, var::RCR).unwrap_err();
        assert!(matches!(
            err,
            DetectionError::CoordinateMismatch { axis: "lat", .. }
        ));
    }

    #[test]
    fn test_subset_inclusive_bounds() {
        let mut grid = small_grid();
        let values: Vec<f64> = (0..18).map(f64::from).collect();
        grid.insert(var::BT, values).unwrap();

        let bbox = BoundingBox {
            lat_min: -8.0,
            lat_max: -8.0,
            lon_min: 112.5,
            lon_max: 113.0,
        };
        let sub = grid.subset("test", &bbox).unwrap();
        assert_eq!(sub.shape(), GridShape { nt: 3, nlat: 1, nlon: 2 });
        // Boundary points are included; values keep (t, lat, lon) order
        assert_eq!(sub.field(var::BT).unwrap(), &[1.0, 2.0, 7.0, 8.0, 13.0, 14.0]);
    }

    #[test]
    fn test_subset_empty_selection() {
        let grid = small_grid();
        let bbox = BoundingBox {
            lat_min: 5.0,
            lat_max: 6.0,
            lon_min: 112.0,
            lon_max: 113.0,
        };
        let err = grid.subset("north", &bbox).unwrap_err();
        assert!(matches!(err, DetectionError::EmptySelection(name) if name == "north"));
    }

    #[test]
    fn test_extrema_skip_nan() {
        let mut grid = small_grid();
        let mut values = vec![f64::NAN; 18];
        values[3] = 210.0;
        values[7] = 280.0;
        grid.insert(var::BT, values).unwrap();
        assert_eq!(grid.field_min(var::BT), Some(210.0));
        assert_eq!(grid.field_max(var::BT), Some(280.0));
        assert_eq!(grid.field_min(var::CI), None);
    }
}
