//! Logarithmic mean weight used by the LMDI effects.
//!
//! `L(a, b) = (a - b) / (ln a - ln b)` with `L(a, a) = a`. The function is
//! symmetric and lies between the geometric and arithmetic means of its
//! arguments.

use agri_core::constants::LMDI_EPSILON;
use agri_core::types::finite;

/// Replace a zero, missing or non-finite level by [`LMDI_EPSILON`].
///
/// Negative levels pass through unchanged and yield a NaN weight, which the
/// engine reports as an undefined effect.
fn positive_or_epsilon(value: Option<f64>) -> f64 {
    match finite(value) {
        Some(v) if v != 0.0 => v,
        _ => LMDI_EPSILON,
    }
}

/// Logarithmic mean of a quantity in the current (`v_t`) and base (`v_0`)
/// period.
///
/// - Equal inputs return the value itself, avoiding the `0/0` form.
/// - Zero or missing inputs are replaced by [`LMDI_EPSILON`] before the
///   formula is applied, so a sector that starts from (or drops to) nothing
///   gets a small finite weight instead of failing.
/// - The result does not depend on argument order, and stays finite for
///   positive inputs however close they are.
pub fn log_mean_weight(v_t: Option<f64>, v_0: Option<f64>) -> f64 {
    if let (Some(a), Some(b)) = (v_t, v_0) {
        if a == b {
            return a;
        }
    }

    let a = positive_or_epsilon(v_t);
    let b = positive_or_epsilon(v_0);
    // Both sides may collapse to epsilon.
    if a == b {
        return a;
    }

    let (hi, lo) = if a > b { (a, b) } else { (b, a) };
    if lo < 0.0 {
        return f64::NAN;
    }
    // ln(hi) - ln(lo) as ln_1p of the relative gap keeps full precision when
    // the inputs are adjacent doubles, where the plain difference rounds to 0.
    let gap = hi - lo;
    gap / (gap / lo).ln_1p()
}
