//! Grid source abstraction for dataset ingestion.
//!
//! The operational loop pulls each cycle's input grid from a [`GridSource`].
//! Real deployments plug in a reader for their satellite/NWP feed; this
//! crate ships a synthetic Himawari-like source for development, demos, and
//! replay testing. The pipeline itself never parses file formats.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::grid::{var, BoundingBox, Grid};

/// Where input grids come from.
pub trait GridSource: Send {
    /// Produce the grid for the current cycle.
    fn fetch(&mut self) -> Result<Grid>;

    /// Human-readable name for logging (e.g. "synthetic", "himawari-nc").
    fn source_name(&self) -> &str;
}

// ============================================================================
// Synthetic Source (Himawari-like mock)
// ============================================================================

/// Generates a warm background field with Gaussian noise and, optionally, a
/// deterministic cooling cell ramping from background temperature down to
/// deep-convective values over the last timesteps.
///
/// The embedded cell makes demo cycles reproducible enough to trigger the
/// detector; without it the field stays warm and cycles report NORMAL.
pub struct SyntheticSource {
    bbox: BoundingBox,
    nlat: usize,
    nlon: usize,
    timesteps: usize,
    step_minutes: i64,
    background_k: f64,
    noise_sigma_k: f64,
    convective_cell: Option<(usize, usize)>,
}

impl SyntheticSource {
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            nlat: 20,
            nlon: 20,
            timesteps: 6,
            step_minutes: 10,
            background_k: 288.0,
            noise_sigma_k: 1.5,
            convective_cell: None,
        }
    }

    /// Embed a deterministic convective cell at grid position `(y, x)`.
    pub fn with_convective_cell(mut self, y: usize, x: usize) -> Self {
        self.convective_cell = Some((y, x));
        self
    }

    pub fn with_grid_size(mut self, nlat: usize, nlon: usize) -> Self {
        self.nlat = nlat;
        self.nlon = nlon;
        self
    }

    pub fn with_timesteps(mut self, timesteps: usize) -> Self {
        self.timesteps = timesteps;
        self
    }

    fn axis(lo: f64, hi: f64, n: usize) -> Vec<f64> {
        if n <= 1 {
            return vec![lo; n];
        }
        let step = (hi - lo) / (n - 1) as f64;
        (0..n).map(|i| lo + step * i as f64).collect()
    }

    fn time_axis(&self, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        (0..self.timesteps)
            .map(|i| end - Duration::minutes(self.step_minutes * (self.timesteps - 1 - i) as i64))
            .collect()
    }
}

impl GridSource for SyntheticSource {
    fn fetch(&mut self) -> Result<Grid> {
        let times = self.time_axis(Utc::now());
        let lats = Self::axis(self.bbox.lat_min, self.bbox.lat_max, self.nlat);
        let lons = Self::axis(self.bbox.lon_min, self.bbox.lon_max, self.nlon);
        let mut grid = Grid::new(times, lats, lons)?;

        let mut rng = rand::thread_rng();
        let noise = Normal::new(0.0, self.noise_sigma_k)
            .map_err(|e| anyhow::anyhow!("invalid noise sigma: {e}"))?;

        let shape = grid.shape();
        let mut bt = Vec::with_capacity(shape.len());
        for _ in 0..shape.len() {
            bt.push(self.background_k + noise.sample(&mut rng));
        }

        if let Some((cy, cx)) = self.convective_cell {
            let (cy, cx) = (cy.min(shape.nlat - 1), cx.min(shape.nlon - 1));
            // Ramp the cell down to 210 K over the final three timesteps.
            // The last two land below the deep-convection cutoff while still
            // cooling, so the flag persists through the temporal filter.
            let ramp = [250.0, 215.0, 210.0];
            let start = shape.nt.saturating_sub(ramp.len());
            for (i, &target) in ramp.iter().enumerate() {
                let t = start + i;
                if t < shape.nt {
                    bt[shape.idx(t, cy, cx)] = target + rng.gen_range(-0.5..0.5);
                }
            }
        }

        grid.insert(var::BT, bt)?;
        Ok(grid)
    }

    fn source_name(&self) -> &str {
        "synthetic"
    }
}

// ============================================================================
// Tests
// ============================================================================
