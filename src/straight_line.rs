//! Straight-line inference: `y = gradient * x + intercept`.
//!
//! A small end-to-end use of the inference pieces. Walkers are scattered
//! uniformly around each initial guess, the Gaussian likelihood is sampled
//! with the ensemble sampler and the retained `(gradient, intercept)` pairs
//! are returned as a matrix.

use nalgebra::DMatrix;
use rand::Rng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Uniform};

use crate::domain::Measurement;
use crate::error::{FitError, Result};
use crate::inference::config::seeded_rng;
use crate::inference::{EnsembleSampler, gaussian_ln_likelihood};

/// Walkers used by [`run_sampling`].
pub const WALKERS: usize = 100;

/// Window walkers are scattered over: `[guess - 100, guess + 100]`.
pub fn prior_bounds(initial_guess: f64) -> (f64, f64) {
    (initial_guess - 100.0, initial_guess + 100.0)
}

/// `size` uniform draws from [`prior_bounds`] of `initial_guess`.
pub fn prior<R: Rng + ?Sized>(initial_guess: f64, size: usize, rng: &mut R) -> Result<Vec<f64>> {
    if !initial_guess.is_finite() {
        return Err(FitError::invalid_input(format!("initial guess must be finite (got {initial_guess})")));
    }
    let (low, high) = prior_bounds(initial_guess);
    if !(low < high) {
        return Err(FitError::invalid_input(format!("initial guess {initial_guess} is too large to window")));
    }
    let window = Uniform::new(low, high);
    Ok((0..size).map(|_| window.sample(rng)).collect())
}

/// Gaussian log-likelihood of the line `params = (gradient, intercept)`.
///
/// Any other parameter count is `-inf`.
pub fn comparison(params: &[f64], y_data: &[f64], dy_data: &[f64], x_data: &[f64]) -> f64 {
    let &[gradient, intercept] = params else {
        return f64::NEG_INFINITY;
    };
    let model: Vec<f64> = x_data.iter().map(|x| gradient * x + intercept).collect();
    gaussian_ln_likelihood(&model, y_data, dy_data, None)
}

/// Sample the line posterior, returning `(WALKERS * n_samples, 2)` draws.
///
/// Only the nominal value of each initial guess is used.
pub fn run_sampling(
    init_guesses: &[Measurement; 2],
    y_data: &[f64],
    dy_data: &[f64],
    x_data: &[f64],
    n_samples: usize,
    n_burn: usize,
    progress: bool,
) -> Result<DMatrix<f64>> {
    let mut rng: StdRng = seeded_rng(None);
    run_sampling_with_rng(init_guesses, y_data, dy_data, x_data, n_samples, n_burn, progress, &mut rng)
}

/// [`run_sampling`] with a caller-supplied RNG.
#[allow(clippy::too_many_arguments)]
pub fn run_sampling_with_rng<R: Rng>(
    init_guesses: &[Measurement; 2],
    y_data: &[f64],
    dy_data: &[f64],
    x_data: &[f64],
    n_samples: usize,
    n_burn: usize,
    progress: bool,
    rng: &mut R,
) -> Result<DMatrix<f64>> {
    if y_data.len() != x_data.len() || dy_data.len() != x_data.len() {
        return Err(FitError::invalid_input(format!(
            "x, y and dy must have equal lengths (got {}, {}, {})",
            x_data.len(),
            y_data.len(),
            dy_data.len()
        )));
    }
    if n_samples == 0 {
        return Err(FitError::invalid_config("n_samples must be >= 1"));
    }

    let columns = init_guesses
        .iter()
        .map(|g| prior(g.nominal, WALKERS, rng))
        .collect::<Result<Vec<_>>>()?;
    let initial: Vec<Vec<f64>> = (0..WALKERS).map(|w| vec![columns[0][w], columns[1][w]]).collect();

    let log_prob = |p: &[f64]| comparison(p, y_data, dy_data, x_data);
    let chain = EnsembleSampler::new(2, log_prob).run(&initial, n_burn, n_samples, progress, rng)?;
    Ok(chain.flat_samples())
}
