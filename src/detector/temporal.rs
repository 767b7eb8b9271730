//! Temporal consistency filter: suppress flags that have not persisted.

use super::RiskField;

/// Zero out flags that have not held for `min_duration` consecutive
/// timesteps ending at the current one.
///
/// Per cell, a running counter tracks consecutive non-zero raw flags and
/// resets on any zero. The filtered value at `t` is the raw flag when the
/// counter has reached `min_duration`, else 0. Once the threshold is met the
/// flag keeps reporting every step it holds — there is no re-latching delay.
/// The first `min_duration - 1` timesteps therefore always filter to 0.
///
/// Cells are independent; only the scan along each cell's own timeline is
/// order-sensitive. `min_duration = 1` returns the raw flags unchanged.
pub fn filter_transients(flags: &RiskField, min_duration: usize) -> RiskField {
    let shape = flags.shape();
    let cells = shape.cells();
    let raw = flags.data();

    let mut out = vec![0u8; raw.len()];
    // One counter per cell, advanced timestep by timestep. Keeping the time
    // loop outermost preserves the per-cell scan order while touching memory
    // sequentially.
    let mut run = vec![0u32; cells];
    for t in 0..shape.nt {
        let base = t * cells;
        for c in 0..cells {
            let v = raw[base + c];
            if v == 0 {
                run[c] = 0;
            } else {
                run[c] += 1;
                if run[c] as usize >= min_duration {
                    out[base + c] = v;
                }
            }
        }
    }

    RiskField::new(out, shape)
}

// ============================================================================
// Tests
// ============================================================================
