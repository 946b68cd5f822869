//! Mean squared displacement series and its bootstrap.
//!
//! Each time step contributes one matrix of squared displacements (rows are
//! independent trajectories, columns are particles). Construction computes a
//! mean and a counting-statistics error per step; [`Msd::resample`] replaces
//! both with bootstrap estimates.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{FitError, Result};
use crate::math::stats;

/// Bootstrap settings for [`Msd::resample`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    /// Bootstrap replicates per time step.
    pub n_resamples: usize,
    /// Draws per replicate; `None` uses every observation of the step.
    pub sample_size: Option<usize>,
    /// Lower and upper percentiles of the stored interval.
    pub confidence_interval: [f64; 2],
    pub parallel: bool,
    pub seed: Option<u64>,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            n_resamples: 1000,
            sample_size: None,
            confidence_interval: [2.5, 97.5],
            parallel: true,
            seed: None,
        }
    }
}

impl ResampleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_resamples < 2 {
            return Err(FitError::invalid_config("n_resamples must be >= 2"));
        }
        if self.sample_size == Some(0) {
            return Err(FitError::invalid_config("sample_size must be >= 1"));
        }
        let [lo, hi] = self.confidence_interval;
        if !(0.0..=100.0).contains(&lo) || !(0.0..=100.0).contains(&hi) || lo >= hi {
            return Err(FitError::invalid_config(format!(
                "confidence_interval must satisfy 0 <= lower < upper <= 100 (got [{lo}, {hi}])"
            )));
        }
        Ok(())
    }
}

/// Counter-based seed derivation (SplitMix64) so every time step gets an
/// independent, reproducible stream regardless of scheduling.
fn counter_rng_seed(base_seed: u64, counter: u64) -> u64 {
    let mut z = base_seed.wrapping_add(counter.wrapping_mul(0x9e3779b97f4a7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Msd {
    sq_displacements: Vec<DMatrix<f64>>,
    dt: Vec<f64>,
    mean: Vec<f64>,
    err: Vec<f64>,
    confidence_intervals: Option<Vec<(f64, f64)>>,
    resampled: bool,
}

impl Msd {
    /// Build a series from one matrix per time step, keeping every
    /// `step_freq`-th step.
    pub fn new(sq_displacements: Vec<DMatrix<f64>>, dt: Vec<f64>, step_freq: usize) -> Result<Self> {
        if sq_displacements.len() != dt.len() {
            return Err(FitError::invalid_input(format!(
                "got {} displacement matrices but {} time steps",
                sq_displacements.len(),
                dt.len()
            )));
        }
        if step_freq == 0 {
            return Err(FitError::invalid_input("step_freq must be >= 1"));
        }
        if let Some(i) = sq_displacements.iter().position(|m| m.is_empty()) {
            return Err(FitError::invalid_input(format!("displacement matrix {i} is empty")));
        }

        let sq_displacements: Vec<DMatrix<f64>> = sq_displacements.into_iter().step_by(step_freq).collect();
        let dt: Vec<f64> = dt.into_iter().step_by(step_freq).collect();

        let mean: Vec<f64> = sq_displacements.iter().map(|m| m.mean()).collect();
        let err = sq_displacements
            .iter()
            .zip(&mean)
            .map(|(m, &mu)| mu * (6.0 / (m.nrows() * m.ncols()) as f64).sqrt())
            .collect();

        Ok(Self {
            sq_displacements,
            dt,
            mean,
            err,
            confidence_intervals: None,
            resampled: false,
        })
    }

    pub fn sq_displacements(&self) -> &[DMatrix<f64>] {
        &self.sq_displacements
    }

    pub fn dt(&self) -> &[f64] {
        &self.dt
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn err(&self) -> &[f64] {
        &self.err
    }

    /// Bootstrap intervals from the last [`Msd::resample`], one per time step.
    pub fn confidence_intervals(&self) -> Option<&[(f64, f64)]> {
        self.confidence_intervals.as_deref()
    }

    pub fn resampled(&self) -> bool {
        self.resampled
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Replace `mean`/`err` with bootstrap estimates of the mean squared
    /// displacement at every time step.
    pub fn resample(&mut self, config: &ResampleConfig) -> Result<()> {
        config.validate()?;
        let base_seed = config.seed.unwrap_or_else(rand::random::<u64>);

        let run = |(i, m): (usize, &DMatrix<f64>)| {
            let mut rng = StdRng::seed_from_u64(counter_rng_seed(base_seed, i as u64));
            bootstrap_step(m.as_slice(), config, &mut rng)
        };
        let steps: Vec<StepEstimate> = if config.parallel {
            self.sq_displacements.par_iter().enumerate().map(run).collect()
        } else {
            self.sq_displacements.iter().enumerate().map(run).collect()
        };

        self.mean = steps.iter().map(|s| s.mean).collect();
        self.err = steps.iter().map(|s| s.err).collect();
        self.confidence_intervals = Some(steps.iter().map(|s| s.interval).collect());
        self.resampled = true;
        info!(
            steps = self.len(),
            n_resamples = config.n_resamples,
            "resampled mean squared displacement"
        );
        Ok(())
    }
}

struct StepEstimate {
    mean: f64,
    err: f64,
    interval: (f64, f64),
}

fn bootstrap_step(data: &[f64], config: &ResampleConfig, rng: &mut StdRng) -> StepEstimate {
    let n = data.len();
    let size = config.sample_size.unwrap_or(n);

    let mut means: Vec<f64> = (0..config.n_resamples)
        .map(|_| {
            let total: f64 = (0..size).map(|_| data[rng.gen_range(0..n)]).sum();
            total / size as f64
        })
        .collect();
    means.sort_by(|a, b| a.total_cmp(b));

    let [lo, hi] = config.confidence_interval;
    let estimate = StepEstimate {
        mean: stats::mean(&means),
        err: stats::std_dev(&means),
        interval: (stats::percentile_sorted(&means, lo), stats::percentile_sorted(&means, hi)),
    };
    debug!(observations = n, mean = estimate.mean, err = estimate.err, "bootstrapped time step");
    estimate
}
