//! Static nested sampling.
//!
//! Live points live in the unit cube and are mapped onto parameter space with
//! each prior's inverse CDF. At iteration `i` the worst live point (likelihood
//! `L*`) is retired with prior-volume weight
//!
//! ```text
//! w_i = X_i (1 - e^{-1/n}),   X_i = e^{-i/n}
//! ```
//!
//! and replaced by a constrained random walk started from another live point.
//! The run stops once the largest possible remaining contribution
//! `max(L_live) X_i` would change `ln Z` by less than `dlogz`.

use rand::Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ErrorKind, FitError, Result};
use crate::inference::config::NestedConfig;
use crate::prior::Uniform;

/// Output of a nested-sampling run.
///
/// `samples` holds every retired point followed by the final live set, with
/// their log importance weights (`ln w_i + ln L_i`) in `ln_weights`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestedResult {
    pub ln_evidence: f64,
    pub ln_evidence_err: f64,
    /// Kullback–Leibler divergence from prior to posterior (nats).
    pub information: f64,
    pub iterations: usize,
    pub samples: Vec<Vec<f64>>,
    pub ln_weights: Vec<f64>,
    pub ln_likelihoods: Vec<f64>,
}

impl NestedResult {
    /// Normalised posterior weights.
    pub fn weights(&self) -> Vec<f64> {
        self.ln_weights
            .iter()
            .map(|lw| (lw - self.ln_evidence).exp())
            .collect()
    }

    /// Equal-weight posterior draws by systematic resampling.
    ///
    /// Returns as many points as there are weighted samples.
    pub fn resample_equal<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Vec<f64>> {
        let weights = self.weights();
        let total: f64 = weights.iter().sum();
        let n = weights.len();
        if n == 0 || !(total > 0.0) {
            return Vec::new();
        }

        let offset: f64 = rng.gen_range(0.0..1.0);
        let mut out = Vec::with_capacity(n);
        let mut cumulative = 0.0;
        let mut j = 0;
        for k in 0..n {
            let target = (k as f64 + offset) / n as f64;
            while j + 1 < n && cumulative + weights[j] / total < target {
                cumulative += weights[j] / total;
                j += 1;
            }
            out.push(self.samples[j].clone());
        }
        out
    }
}

struct LivePoint {
    unit: Vec<f64>,
    params: Vec<f64>,
    ln_l: f64,
}

pub struct NestedSampler<'a, F> {
    priors: &'a [Uniform],
    ln_likelihood: F,
}

impl<'a, F> NestedSampler<'a, F>
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    pub fn new(priors: &'a [Uniform], ln_likelihood: F) -> Self {
        Self { priors, ln_likelihood }
    }

    fn transform(&self, unit: &[f64]) -> Vec<f64> {
        self.priors.iter().zip(unit).map(|(p, &u)| p.ppf(u)).collect()
    }

    fn ln_l(&self, params: &[f64]) -> f64 {
        let v = (self.ln_likelihood)(params);
        if v.is_nan() { f64::NEG_INFINITY } else { v }
    }

    pub fn run<R: Rng>(&self, config: &NestedConfig, rng: &mut R) -> Result<NestedResult> {
        config.validate()?;
        let n_dim = self.priors.len();
        if n_dim == 0 {
            return Err(FitError::invalid_input("nested sampling needs at least one parameter"));
        }
        let n_live = config.live_points;

        let units: Vec<Vec<f64>> = (0..n_live)
            .map(|_| (0..n_dim).map(|_| rng.gen_range(0.0..1.0)).collect())
            .collect();
        let mut live: Vec<LivePoint> = units
            .into_par_iter()
            .map(|unit| {
                let params = self.transform(&unit);
                let ln_l = self.ln_l(&params);
                LivePoint { unit, params, ln_l }
            })
            .collect();

        if live.iter().all(|p| p.ln_l == f64::NEG_INFINITY) {
            return Err(FitError::new(
                ErrorKind::Sampling,
                "no initial live point has a finite likelihood",
            ));
        }

        let ln_shrink = ln_one_minus_exp(-1.0 / n_live as f64);
        let mut ln_z = f64::NEG_INFINITY;
        let mut h = 0.0;
        let mut samples = Vec::new();
        let mut ln_weights = Vec::new();
        let mut ln_likelihoods = Vec::new();
        let mut scale = 1.0;
        let mut iteration = 0;

        loop {
            let worst = argmin_ln_l(&live);
            let ln_l_star = live[worst].ln_l;
            let ln_x = -(iteration as f64) / n_live as f64;
            let ln_wt = ln_x + ln_shrink + ln_l_star;

            (ln_z, h) = accumulate(ln_z, h, ln_wt, ln_l_star);
            samples.push(live[worst].params.clone());
            ln_weights.push(ln_wt);
            ln_likelihoods.push(ln_l_star);
            iteration += 1;

            let start = pick_other(worst, n_live, rng);
            let (replacement, new_scale) = self.random_walk(&live, start, ln_l_star, scale, config.walks, rng);
            scale = new_scale;
            live[worst] = replacement;

            let ln_x_next = -(iteration as f64) / n_live as f64;
            let ln_l_max = live.iter().map(|p| p.ln_l).fold(f64::NEG_INFINITY, f64::max);
            let remaining = logaddexp(ln_z, ln_l_max + ln_x_next) - ln_z;

            if config.progress && iteration % n_live == 0 {
                info!(iteration, ln_z, dlogz = remaining, "nested sampling progress");
            }
            if remaining < config.dlogz {
                break;
            }
            if config.max_iterations.is_some_and(|cap| iteration >= cap) {
                debug!(iteration, "nested sampling hit the iteration cap");
                break;
            }
        }

        // The surviving live points share the remaining volume equally.
        let ln_x_final = -(iteration as f64) / n_live as f64 - (n_live as f64).ln();
        for point in live {
            let ln_wt = ln_x_final + point.ln_l;
            (ln_z, h) = accumulate(ln_z, h, ln_wt, point.ln_l);
            samples.push(point.params);
            ln_weights.push(ln_wt);
            ln_likelihoods.push(point.ln_l);
        }

        let information = h.max(0.0);
        let ln_evidence_err = (information / n_live as f64).sqrt();
        info!(iterations = iteration, ln_z, ln_z_err = ln_evidence_err, "nested sampling finished");

        Ok(NestedResult {
            ln_evidence: ln_z,
            ln_evidence_err,
            information,
            iterations: iteration,
            samples,
            ln_weights,
            ln_likelihoods,
        })
    }

    /// Random walk from live point `start` under the constraint `ln L > ln_l_star`.
    ///
    /// Steps are Gaussian per axis, sized by the live set's spread in the unit
    /// cube times `scale`. Returns the new point and the adapted scale.
    fn random_walk<R: Rng>(
        &self,
        live: &[LivePoint],
        start: usize,
        ln_l_star: f64,
        scale: f64,
        walks: usize,
        rng: &mut R,
    ) -> (LivePoint, f64) {
        let spread = unit_spread(live);
        let mut unit = live[start].unit.clone();
        let mut params = live[start].params.clone();
        let mut ln_l = live[start].ln_l;
        let (mut accept, mut reject) = (0usize, 0usize);

        for _ in 0..walks {
            let proposal: Vec<f64> = unit
                .iter()
                .zip(&spread)
                .map(|(&u, &s)| {
                    let z: f64 = rng.sample(StandardNormal);
                    u + scale * s * z
                })
                .collect();
            if proposal.iter().any(|u| !(0.0..=1.0).contains(u)) {
                reject += 1;
                continue;
            }
            let candidate = self.transform(&proposal);
            let candidate_ln_l = self.ln_l(&candidate);
            if candidate_ln_l > ln_l_star {
                unit = proposal;
                params = candidate;
                ln_l = candidate_ln_l;
                accept += 1;
            } else {
                reject += 1;
            }
        }

        let mut scale = scale;
        if accept > reject {
            scale *= (1.0 / accept as f64).exp();
        } else if accept < reject {
            scale /= (1.0 / reject as f64).exp();
        }
        (LivePoint { unit, params, ln_l }, scale)
    }
}

/// Fold one weighted point into `(ln Z, H)` (Skilling's running update).
fn accumulate(ln_z: f64, h: f64, ln_wt: f64, ln_l: f64) -> (f64, f64) {
    let ln_z_new = logaddexp(ln_z, ln_wt);
    if ln_z_new == f64::NEG_INFINITY {
        return (ln_z_new, h);
    }
    let mut h_new = -ln_z_new;
    if ln_wt > f64::NEG_INFINITY {
        h_new += (ln_wt - ln_z_new).exp() * ln_l;
    }
    if ln_z > f64::NEG_INFINITY {
        h_new += (ln_z - ln_z_new).exp() * (h + ln_z);
    }
    (ln_z_new, h_new)
}

fn logaddexp(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let m = a.max(b);
    m + ((a - m).exp() + (b - m).exp()).ln()
}

/// `ln(1 - e^x)` for `x < 0`.
fn ln_one_minus_exp(x: f64) -> f64 {
    (-x.exp_m1()).ln()
}

fn argmin_ln_l(live: &[LivePoint]) -> usize {
    let mut best = 0;
    for (i, p) in live.iter().enumerate().skip(1) {
        if p.ln_l < live[best].ln_l {
            best = i;
        }
    }
    best
}

fn pick_other<R: Rng>(exclude: usize, n: usize, rng: &mut R) -> usize {
    let k = rng.gen_range(0..n - 1);
    if k >= exclude { k + 1 } else { k }
}

/// Per-axis standard deviation of live points in the unit cube.
fn unit_spread(live: &[LivePoint]) -> Vec<f64> {
    let n_dim = live[0].unit.len();
    (0..n_dim)
        .map(|d| {
            let column: Vec<f64> = live.iter().map(|p| p.unit[d]).collect();
            crate::math::stats::std_dev(&column).max(1e-6)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn unit_gaussian(p: &[f64]) -> f64 {
        -0.5 * p[0] * p[0] - 0.5 * (2.0 * PI).ln()
    }

    #[test]
    fn logaddexp_handles_neg_inf() {
        assert_eq!(logaddexp(f64::NEG_INFINITY, 1.5), 1.5);
        assert!((logaddexp(0.0, 0.0) - 2.0_f64.ln()).abs() < 1e-15);
    }

    #[test]
    fn recovers_evidence_of_normalised_gaussian() {
        // Z = ∫ U(-5, 5) N(0, 1) ≈ 1/10.
        let priors = [Uniform::new(-5.0, 10.0).unwrap()];
        let config = NestedConfig {
            live_points: 200,
            dlogz: 0.05,
            seed: Some(11),
            ..NestedConfig::default()
        };
        let mut rng = config.rng();
        let result = NestedSampler::new(&priors, unit_gaussian).run(&config, &mut rng).unwrap();

        let expected = (0.1_f64).ln();
        assert!(
            (result.ln_evidence - expected).abs() < 0.3,
            "ln Z = {} ± {}",
            result.ln_evidence,
            result.ln_evidence_err
        );
        assert!(result.ln_evidence_err > 0.0 && result.ln_evidence_err < 0.2);
        assert_eq!(result.samples.len(), result.iterations + 200);

        let draws: Vec<f64> = result.resample_equal(&mut rng).into_iter().map(|p| p[0]).collect();
        let mean = crate::math::stats::mean(&draws);
        let sd = crate::math::stats::std_dev(&draws);
        assert!(mean.abs() < 0.2, "posterior mean = {mean}");
        assert!((sd - 1.0).abs() < 0.2, "posterior sd = {sd}");
    }

    #[test]
    fn respects_iteration_cap() {
        let priors = [Uniform::new(-5.0, 10.0).unwrap()];
        let config = NestedConfig {
            live_points: 20,
            max_iterations: Some(15),
            dlogz: 1e-9,
            seed: Some(1),
            ..NestedConfig::default()
        };
        let result = NestedSampler::new(&priors, unit_gaussian)
            .run(&config, &mut config.rng())
            .unwrap();
        assert_eq!(result.iterations, 15);
        assert_eq!(result.samples.len(), 35);
    }

    #[test]
    fn impossible_likelihood_is_a_sampling_error() {
        let priors = [Uniform::new(0.0, 1.0).unwrap()];
        let config = NestedConfig {
            live_points: 10,
            seed: Some(0),
            ..NestedConfig::default()
        };
        let err = NestedSampler::new(&priors, |_: &[f64]| f64::NEG_INFINITY)
            .run(&config, &mut config.rng())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Sampling);
    }
}
