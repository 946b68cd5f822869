//! `T0` grid generation.
//!
//! The linearised Super-Arrhenius fit is linear in `(ln A, E_a)` once `T0` is
//! fixed, so `T0` is found by a deterministic grid search over the physically
//! allowed range `[0, min(T) - margin]`.

use crate::error::{FitError, Result};
use crate::prior::T_ZERO_MARGIN;

/// Candidates evaluated by the initial Super-Arrhenius fit.
pub const T_ZERO_STEPS: usize = 400;

/// Generate `steps` evenly spaced points between `min` and `max` (inclusive).
pub fn linear_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>> {
    if !(min.is_finite() && max.is_finite() && max > min) {
        return Err(FitError::invalid_input(format!(
            "invalid grid range: min={min}, max={max} (must be finite with max > min)"
        )));
    }
    if steps < 2 {
        return Err(FitError::invalid_input("grid steps must be >= 2"));
    }

    let step = (max - min) / (steps as f64 - 1.0);
    let mut out: Vec<f64> = (0..steps).map(|i| min + step * i as f64).collect();
    out[steps - 1] = max;
    Ok(out)
}

/// `T0` candidates strictly below the lowest observed temperature.
pub fn t_zero_grid(min_temperature: f64, steps: usize) -> Result<Vec<f64>> {
    let upper = min_temperature - T_ZERO_MARGIN;
    if !(upper > 0.0) {
        return Err(FitError::invalid_input(format!(
            "Super-Arrhenius needs min(temperature) > {T_ZERO_MARGIN} (got {min_temperature})"
        )));
    }
    linear_space(0.0, upper, steps)
}
