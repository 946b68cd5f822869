//! Initial weighted least-squares fit for a single model kind.
//!
//! Given temperatures `T_i`, diffusion coefficients `D_i` and their errors `σ_i`:
//!
//! 1. Linearise `ln D = ln A - E_a / (R (T - T0))` and solve a weighted OLS
//!    problem with weights `(D_i / σ_i)^2` for every `T0` candidate (only
//!    `T0 = 0` for the standard form). The lowest SSE wins.
//! 2. Refine `(E_a, A[, T0])` with Levenberg–Marquardt on `(D - f) / σ`.
//! 3. With an unaccounted-uncertainty term, pick the `u` that maximises the
//!    likelihood at the refined parameters.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::debug;

use crate::domain::{ModelKind, Observations};
use crate::error::{ErrorKind, FitError, Result};
use crate::fit::t_zero_grid::{T_ZERO_STEPS, t_zero_grid};
use crate::inference::likelihood::model_ln_likelihood;
use crate::math::{LmFit, LmOptions, golden_section_max, levenberg_marquardt, second_derivative, weighted_least_squares};
use crate::models::{fill_design_row, predict};
use crate::prior::UNACCOUNTED_PRIOR;

/// Point estimates with symmetric one-sigma uncertainties, in
/// `ModelKind::parameter_specs` order.
#[derive(Debug, Clone)]
pub struct InitialFit {
    pub values: Vec<f64>,
    pub uncertainties: Vec<f64>,
    /// `Σ ((D - f) / σ)^2` at `values`.
    pub chi2: f64,
}

#[derive(Debug, Clone)]
struct Candidate {
    idx: usize,
    t_zero: f64,
    ln_prefactor: f64,
    activation_energy: f64,
    covariance: Option<DMatrix<f64>>,
    sse: f64,
}

/// Fit `kind` to the observations from scratch.
pub fn initial_fit(kind: ModelKind, observations: &Observations, unaccounted_uncertainty: bool) -> Result<InitialFit> {
    validate(kind, observations)?;

    let best = linearised_fit(kind, observations)?;
    let mut values = vec![best.activation_energy, best.ln_prefactor.exp()];
    if kind == ModelKind::SuperArrhenius {
        values.push(best.t_zero);
    }
    let linear_uncertainties = linearised_uncertainties(kind, &best, values[1]);

    let (values, uncertainties, chi2) = match direct_fit(kind, observations, &values) {
        Some(fit) => {
            let uncertainties = fit
                .covariance
                .as_ref()
                .map(diagonal_sqrt)
                .unwrap_or_else(|| linear_uncertainties.clone());
            (fit.params, uncertainties, fit.chi2)
        }
        None => {
            debug!(model = kind.display_name(), "direct refinement failed; keeping linearised estimate");
            let chi2 = chi_square(kind, observations, &values);
            (values, linear_uncertainties, chi2)
        }
    };

    let fit = with_unaccounted(kind, observations, unaccounted_uncertainty, values, uncertainties, chi2);
    debug!(
        model = kind.display_name(),
        values = ?fit.values,
        uncertainties = ?fit.uncertainties,
        chi2 = fit.chi2,
        "initial fit"
    );
    Ok(fit)
}

/// Re-run the direct-space refinement starting from `start`.
///
/// Any trailing unaccounted-uncertainty entry in `start` is ignored and
/// re-estimated.
pub fn refine(
    kind: ModelKind,
    observations: &Observations,
    unaccounted_uncertainty: bool,
    start: &[f64],
) -> Result<InitialFit> {
    validate(kind, observations)?;
    let n_model = kind.model_param_count();
    if start.len() < n_model {
        return Err(FitError::invalid_input(format!(
            "expected at least {n_model} starting values, got {}",
            start.len()
        )));
    }

    let fit = direct_fit(kind, observations, &start[..n_model]).ok_or_else(|| {
        FitError::new(
            ErrorKind::Numerical,
            format!("{} refinement did not converge from {:?}", kind.display_name(), &start[..n_model]),
        )
    })?;
    let uncertainties = fit
        .covariance
        .as_ref()
        .map(diagonal_sqrt)
        .unwrap_or_else(|| vec![f64::NAN; n_model]);
    Ok(with_unaccounted(kind, observations, unaccounted_uncertainty, fit.params, uncertainties, fit.chi2))
}

fn validate(kind: ModelKind, observations: &Observations) -> Result<()> {
    let needed = kind.model_param_count();
    if observations.len() < needed {
        return Err(FitError::invalid_input(format!(
            "{} needs at least {needed} observations, got {}",
            kind.display_name(),
            observations.len()
        )));
    }
    let rows = observations
        .temperature()
        .iter()
        .zip(observations.diffusion())
        .zip(observations.diffusion_error());
    for (i, ((&t, &d), &s)) in rows.enumerate() {
        if !(t.is_finite() && d.is_finite() && d > 0.0 && s.is_finite() && s > 0.0) {
            return Err(FitError::new(
                ErrorKind::Numerical,
                format!("observation {i} cannot be fitted (T={t}, D={d}, error={s}); need finite T and D, error > 0"),
            ));
        }
    }
    Ok(())
}

fn linearised_fit(kind: ModelKind, observations: &Observations) -> Result<Candidate> {
    let grid = match kind {
        ModelKind::StandardArrhenius => vec![0.0],
        ModelKind::SuperArrhenius => t_zero_grid(observations.min_temperature(), T_ZERO_STEPS)?,
    };

    let temperature = observations.temperature();
    let y = DVector::from_iterator(observations.len(), observations.diffusion().iter().map(|d| d.ln()));
    let w: Vec<f64> = observations
        .diffusion()
        .iter()
        .zip(observations.diffusion_error())
        .map(|(d, s)| (d / s).powi(2))
        .collect();

    // Evaluate each T0 candidate independently (parallel).
    let candidates: Vec<Candidate> = grid
        .par_iter()
        .enumerate()
        .filter_map(|(idx, &t_zero)| {
            let mut x = DMatrix::<f64>::zeros(temperature.len(), 2);
            let mut row = [0.0; 2];
            for (i, &t) in temperature.iter().enumerate() {
                fill_design_row(t, t_zero, &mut row);
                x[(i, 0)] = row[0];
                x[(i, 1)] = row[1];
            }
            let fit = weighted_least_squares(&x, &y, &w)?;
            Some(Candidate {
                idx,
                t_zero,
                ln_prefactor: fit.beta[0],
                activation_energy: fit.beta[1],
                covariance: fit.covariance,
                sse: fit.sse,
            })
        })
        .collect();

    // Deterministic selection: pick the minimum SSE; break ties by grid index.
    let Some(mut best) = candidates.first() else {
        return Err(FitError::new(
            ErrorKind::Numerical,
            format!("no solvable linearised fit for {}", kind.display_name()),
        ));
    };
    for c in &candidates[1..] {
        if c.sse < best.sse || (c.sse == best.sse && c.idx < best.idx) {
            best = c;
        }
    }
    Ok(best.clone())
}

fn linearised_uncertainties(kind: ModelKind, best: &Candidate, prefactor: f64) -> Vec<f64> {
    let (ea, a) = match &best.covariance {
        // A = exp(β0), so σ_A ≈ A σ_β0.
        Some(cov) => (cov[(1, 1)].sqrt(), prefactor * cov[(0, 0)].sqrt()),
        None => (f64::NAN, f64::NAN),
    };
    let mut out = vec![ea, a];
    if kind == ModelKind::SuperArrhenius {
        out.push(f64::NAN);
    }
    out
}

fn direct_fit(kind: ModelKind, observations: &Observations, start: &[f64]) -> Option<LmFit> {
    let residuals = |p: &[f64]| weighted_residuals(kind, observations, p);
    let fit = levenberg_marquardt(residuals, start, &LmOptions::default())?;

    if fit.params.iter().any(|v| !v.is_finite()) {
        return None;
    }
    if kind == ModelKind::SuperArrhenius && fit.params[2] >= observations.min_temperature() {
        return None;
    }
    Some(fit)
}

fn weighted_residuals(kind: ModelKind, observations: &Observations, params: &[f64]) -> Vec<f64> {
    observations
        .temperature()
        .iter()
        .zip(observations.diffusion())
        .zip(observations.diffusion_error())
        .map(|((&t, &d), &s)| (d - predict(kind, t, params)) / s)
        .collect()
}

fn chi_square(kind: ModelKind, observations: &Observations, params: &[f64]) -> f64 {
    weighted_residuals(kind, observations, params).iter().map(|r| r * r).sum()
}

fn diagonal_sqrt(cov: &DMatrix<f64>) -> Vec<f64> {
    (0..cov.nrows())
        .map(|k| {
            let v = cov[(k, k)];
            if v >= 0.0 { v.sqrt() } else { f64::NAN }
        })
        .collect()
}

fn with_unaccounted(
    kind: ModelKind,
    observations: &Observations,
    unaccounted_uncertainty: bool,
    mut values: Vec<f64>,
    mut uncertainties: Vec<f64>,
    chi2: f64,
) -> InitialFit {
    if unaccounted_uncertainty {
        let (lo, hi) = (UNACCOUNTED_PRIOR.0, UNACCOUNTED_PRIOR.0 + UNACCOUNTED_PRIOR.1);
        let profile = |u: f64| {
            let mut p = values.clone();
            p.push(u);
            model_ln_likelihood(kind, observations, true, &p)
        };
        let u = golden_section_max(&profile, lo, hi, 1e-8);
        let curvature = second_derivative(&profile, u);
        let sigma = if curvature < 0.0 { (-curvature).sqrt().recip() } else { f64::NAN };
        values.push(u);
        uncertainties.push(sigma);
    }
    InitialFit {
        values,
        uncertainties,
        chi2,
    }
}
