//! Gaussian likelihood with heteroscedastic uncertainties.
//!
//! ```text
//! ln L = -1/2 Σ [ (y_i - m_i)^2 / s_i^2 + ln(2π s_i^2) ]
//! s_i^2 = dy_i^2 + m_i^2 exp(2 u)      (u = unaccounted uncertainty, optional)
//! ```
//!
//! Non-finite model values (singular temperatures, overflow) make the result
//! `-inf` so samplers treat them as rejected proposals.

use std::f64::consts::PI;

use crate::domain::{ModelKind, Observations};
use crate::models::evaluate;
use crate::prior::Uniform;

/// Normalised Gaussian log-likelihood of `model` against `y ± dy`.
pub fn gaussian_ln_likelihood(model: &[f64], y: &[f64], dy: &[f64], ln_unaccounted: Option<f64>) -> f64 {
    let mut total = 0.0;
    for ((&m, &yi), &dyi) in model.iter().zip(y).zip(dy) {
        let mut s2 = dyi * dyi;
        if let Some(u) = ln_unaccounted {
            s2 += m * m * (2.0 * u).exp();
        }
        let r = yi - m;
        total += r * r / s2 + (2.0 * PI * s2).ln();
    }
    let ln_l = -0.5 * total;
    if ln_l.is_nan() { f64::NEG_INFINITY } else { ln_l }
}

/// Log-likelihood of a rate-law parameter vector against the observations.
///
/// When `unaccounted_uncertainty` is set, the last entry of `params` is the
/// log noise scale `u`.
pub fn model_ln_likelihood(
    kind: ModelKind,
    observations: &Observations,
    unaccounted_uncertainty: bool,
    params: &[f64],
) -> f64 {
    let ln_unaccounted = if unaccounted_uncertainty { params.last().copied() } else { None };
    let model = evaluate(kind, observations.temperature(), params);
    gaussian_ln_likelihood(
        &model,
        observations.diffusion(),
        observations.diffusion_error(),
        ln_unaccounted,
    )
}

/// Sum of prior log densities; `-inf` as soon as one parameter leaves its support.
pub fn ln_prior(priors: &[Uniform], params: &[f64]) -> f64 {
    let mut total = 0.0;
    for (prior, &x) in priors.iter().zip(params) {
        let lp = prior.ln_pdf(x);
        if !lp.is_finite() {
            return f64::NEG_INFINITY;
        }
        total += lp;
    }
    total
}
