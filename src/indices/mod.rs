//! Convective index computation: Rapid Cooling Rate and Composite Index.
//!
//! Both indices derive from the brightness-temperature field. RCR is the
//! negated first difference of BT along the time axis; CI is a weighted sum
//! of boolean threshold contributions, clipped to [0, 1]. The contribution
//! weights and cutoffs are fixed design parameters of the index, not
//! operator-tunable thresholds.

use rayon::prelude::*;

use crate::grid::{var, Grid};
use crate::types::DetectionError;

/// BT below this marks deep convection (K). Contributes 0.4 to CI.
pub const CI_BT_DEEP: f64 = 235.0;
/// RCR above this marks rapid vertical growth (K/10min). Contributes 0.4 to CI.
pub const CI_RCR_RAPID: f64 = 3.0;
/// BT below this marks very cold cloud tops (K). Contributes 0.2 to CI.
pub const CI_BT_VERY_COLD: f64 = 220.0;

/// CI contribution weights for the three factors above.
pub const CI_WEIGHT_DEEP: f64 = 0.4;
pub const CI_WEIGHT_RAPID: f64 = 0.4;
pub const CI_WEIGHT_VERY_COLD: f64 = 0.2;

/// Compute the Rapid Cooling Rate from brightness temperature.
///
/// `RCR[t] = -(BT[t] - BT[t-1])` for `t >= 1`; the first timestep is NaN
/// (undefined — there is no earlier observation to difference against). The
/// unit is K per native timestep, assumed to be 10 minutes; resampling a
/// different cadence is the caller's responsibility.
pub fn compute_rcr(grid: &Grid) -> Result<Vec<f64>, DetectionError> {
    let bt = grid.require(var::BT)?;
    let shape = grid.shape();
    let cells = shape.cells();

    let mut rcr = vec![f64::NAN; shape.len()];
    // Each timestep slice only reads its predecessor, so the slices are
    // independent work items.
    rcr[cells..]
        .par_chunks_mut(cells)
        .enumerate()
        .for_each(|(i, out)| {
            let t = i + 1;
            let curr = &bt[t * cells..(t + 1) * cells];
            let prev = &bt[(t - 1) * cells..t * cells];
            for (o, (c, p)) in out.iter_mut().zip(curr.iter().zip(prev.iter())) {
                *o = -(c - p);
            }
        });
    Ok(rcr)
}

/// Compute the Composite Index from BT and (when present) RCR.
///
/// Scores start at zero per cell; each satisfied factor adds its weight and
/// the sum is clipped to [0, 1]. NaN inputs satisfy no factor, so a fully
/// masked cell scores 0.
pub fn composite_index(grid: &Grid) -> Result<Vec<f64>, DetectionError> {
    let bt = grid.require(var::BT)?;
    let rcr = grid.field(var::RCR);

    let ci = bt
        .par_iter()
        .enumerate()
        .map(|(i, &bt_val)| {
            let mut score = 0.0;
            if bt_val < CI_BT_DEEP {
                score += CI_WEIGHT_DEEP;
            }
            if let Some(rcr) = rcr {
                if rcr[i] > CI_RCR_RAPID {
                    score += CI_WEIGHT_RAPID;
                }
            }
            if bt_val < CI_BT_VERY_COLD {
                score += CI_WEIGHT_VERY_COLD;
            }
            score.clamp(0.0, 1.0)
        })
        .collect();
    Ok(ci)
}

/// Index-calculation stage: augment a grid with RCR (if absent) and CI.
///
/// Returns a new grid; the input is never mutated. Fails with
/// [`DetectionError::MissingVariable`] when BT is absent.
pub fn calculate_indices(grid: &Grid) -> Result<Grid, DetectionError> {
    let mut out = grid.clone();

    if !out.has(var::RCR) {
        let rcr = compute_rcr(&out)?;
        out.insert(var::RCR, rcr)?;
    }

    let ci = composite_index(&out)?;
    out.insert(var::CI, ci)?;

    Ok(out)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn grid_with_bt(nt: usize, bt: Vec<f64>) -> Grid {
        let times = (0..nt)
            .map(|i| {
                Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::minutes(10 * i as i64)
            })
            .collect();
        let mut grid = Grid::new(times, vec![-8.0], vec![112.0]).unwrap();
        grid.insert(var::BT, bt).unwrap();
        grid
    }

    #[test]
    fn test_rcr_constant_bt_is_zero() {
        let grid = grid_with_bt(4, vec![290.0; 4]);
        let rcr = compute_rcr(&grid).unwrap();
        assert!(rcr[0].is_nan());
        assert!(rcr[1..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_rcr_sign_convention() {
        // Cooling (BT dropping) must give positive RCR
        let grid = grid_with_bt(3, vec![290.0, 280.0, 285.0]);
        let rcr = compute_rcr(&grid).unwrap();
        assert!(rcr[0].is_nan());
        assert_eq!(rcr[1], 10.0);
        assert_eq!(rcr[2], -5.0);
    }

    #[test]
    fn test_rcr_requires_bt() {
        let times = vec![Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()];
        let grid = Grid::new(times, vec![-8.0], vec![112.0]).unwrap();
        assert!(matches!(
            compute_rcr(&grid),
            Err(DetectionError::MissingVariable(_))
        ));
    }

    #[test]
    fn test_ci_factor_sum_and_clip() {
        // BT = 210: deep (0.4) + very cold (0.2); RCR = 5: rapid (0.4) => 1.0
        let mut grid = grid_with_bt(2, vec![210.0, 210.0]);
        grid.insert(var::RCR, vec![5.0, 5.0]).unwrap();
        let ci = composite_index(&grid).unwrap();
        assert!(ci.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_ci_without_rcr() {
        // No RCR variable: only BT factors can contribute
        let grid = grid_with_bt(1, vec![210.0]);
        let ci = composite_index(&grid).unwrap();
        assert!((ci[0] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_ci_range_for_extreme_inputs() {
        let mut grid = grid_with_bt(4, vec![f64::NAN, -1000.0, 1000.0, 0.0]);
        grid.insert(var::RCR, vec![f64::NAN, 1e9, -1e9, 0.0])
            .unwrap();
        let ci = composite_index(&grid).unwrap();
        for v in ci {
            assert!((0.0..=1.0).contains(&v), "CI out of range: {v}");
        }
    }

    #[test]
    fn test_ci_nan_bt_scores_zero() {
        let grid = grid_with_bt(1, vec![f64::NAN]);
        let ci = composite_index(&grid).unwrap();
        assert_eq!(ci[0], 0.0);
    }

    #[test]
    fn test_calculate_indices_augments_copy() {
        let grid = grid_with_bt(3, vec![290.0, 270.0, 250.0]);
        let out = calculate_indices(&grid).unwrap();
        assert!(out.has(var::RCR));
        assert!(out.has(var::CI));
        // Input grid untouched
        assert!(!grid.has(var::RCR));
        assert!(!grid.has(var::CI));
    }

    #[test]
    fn test_calculate_indices_keeps_existing_rcr() {
        // A pre-augmented grid keeps its RCR instead of recomputing
        let mut grid = grid_with_bt(2, vec![290.0, 290.0]);
        grid.insert(var::RCR, vec![7.0, 7.0]).unwrap();
        let out = calculate_indices(&grid).unwrap();
        assert_eq!(out.field(var::RCR).unwrap(), &[7.0, 7.0]);
    }
}
