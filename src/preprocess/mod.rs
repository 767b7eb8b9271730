//! Quality control and preprocessing applied before index computation.
//!
//! Three steps, in order: physical-range QC (out-of-range values become
//! NaN), per-cell gap filling along the time axis, and centered temporal
//! smoothing. All steps are pure — the caller's grid is never mutated.

use crate::grid::{var, Grid};
use crate::types::DetectionError;

/// Physical bounds for brightness temperature (K).
pub const QC_BT_MIN: f64 = 180.0;
pub const QC_BT_MAX: f64 = 330.0;
/// Physical bounds for the cooling rate (K/10min).
pub const QC_RCR_MIN: f64 = -20.0;
pub const QC_RCR_MAX: f64 = 5.0;
/// Default temporal smoothing window (timesteps).
pub const SMOOTH_WINDOW: usize = 3;

/// Mask values of one variable outside the closed `[vmin, vmax]` range.
///
/// Fails with [`DetectionError::MissingVariable`] if the variable is absent.
pub fn qc_range(
    grid: &Grid,
    name: &str,
    vmin: Option<f64>,
    vmax: Option<f64>,
) -> Result<Grid, DetectionError> {
    let mut out = grid.clone();
    let values = out
        .field_mut(name)
        .ok_or_else(|| DetectionError::MissingVariable(name.to_string()))?;
    for v in values.iter_mut() {
        let below = vmin.is_some_and(|min| *v < min);
        let above = vmax.is_some_and(|max| *v > max);
        if below || above {
            *v = f64::NAN;
        }
    }
    Ok(out)
}

/// Fill NaN gaps along the time axis for every variable.
///
/// Interior gaps are linearly interpolated between the nearest defined
/// neighbors; leading and trailing gaps take the nearest defined value.
/// A cell with no defined value at all stays all-NaN.
pub fn fill_missing(grid: &Grid) -> Grid {
    let mut out = grid.clone();
    let shape = grid.shape();
    let cells = shape.cells();
    let names: Vec<String> = grid.variables().map(str::to_string).collect();

    for name in names {
        let Some(values) = out.field_mut(&name) else {
            continue;
        };
        let mut column = vec![0.0; shape.nt];
        for c in 0..cells {
            for t in 0..shape.nt {
                column[t] = values[t * cells + c];
            }
            interpolate_column(&mut column);
            for t in 0..shape.nt {
                values[t * cells + c] = column[t];
            }
        }
    }
    out
}

/// Linear interpolation of NaN runs in place, nearest-value at the ends.
fn interpolate_column(column: &mut [f64]) {
    let defined: Vec<usize> = column
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .map(|(i, _)| i)
        .collect();
    if defined.is_empty() || defined.len() == column.len() {
        return;
    }

    let first = defined[0];
    let last = defined[defined.len() - 1];
    for t in 0..first {
        column[t] = column[first];
    }
    for t in last + 1..column.len() {
        column[t] = column[last];
    }
    for pair in defined.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if hi - lo < 2 {
            continue;
        }
        let span = (hi - lo) as f64;
        let (a, b) = (column[lo], column[hi]);
        for t in lo + 1..hi {
            let frac = (t - lo) as f64 / span;
            column[t] = a + (b - a) * frac;
        }
    }
}

/// Centered rolling mean along the time axis for every variable.
///
/// Partial windows at the series boundaries average whatever is available
/// (min_periods = 1 semantics); NaN values are skipped inside the window,
/// and a window of only NaN yields NaN.
pub fn smooth_time(grid: &Grid, window: usize) -> Grid {
    if window <= 1 {
        return grid.clone();
    }
    let mut out = grid.clone();
    let shape = grid.shape();
    let cells = shape.cells();
    let half_before = (window - 1) / 2;
    let half_after = window / 2;
    let names: Vec<String> = grid.variables().map(str::to_string).collect();

    for name in names {
        let Some(values) = out.field_mut(&name) else {
            continue;
        };
        let original: Vec<f64> = values.to_vec();
        for c in 0..cells {
            for t in 0..shape.nt {
                let lo = t.saturating_sub(half_before);
                let hi = (t + half_after).min(shape.nt - 1);
                let mut sum = 0.0;
                let mut count = 0usize;
                for s in lo..=hi {
                    let v = original[s * cells + c];
                    if !v.is_nan() {
                        sum += v;
                        count += 1;
                    }
                }
                values[t * cells + c] = if count == 0 { f64::NAN } else { sum / count as f64 };
            }
        }
    }
    out
}

/// Satellite preprocessing pipeline: QC(BT), QC(RCR if present), fill, smooth.
pub fn preprocess_satellite(grid: &Grid) -> Result<Grid, DetectionError> {
    let mut out = grid.clone();

    if out.has(var::BT) {
        out = qc_range(&out, var::BT, Some(QC_BT_MIN), Some(QC_BT_MAX))?;
    }
    if out.has(var::RCR) {
        out = qc_range(&out, var::RCR, Some(QC_RCR_MIN), Some(QC_RCR_MAX))?;
    }

    out = fill_missing(&out);
    out = smooth_time(&out, SMOOTH_WINDOW);
    Ok(out)
}

// ============================================================================
// Tests
// ============================================================================
