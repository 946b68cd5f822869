//! Shared inference engine.
//!
//! A [`Relationship`] owns one set of observations and the current estimate of
//! every model parameter. Construction runs the deterministic initial fit; the
//! samplers then replace each parameter's point estimate with posterior samples
//! while the name/unit metadata stays untouched.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::distribution::Distribution;
use crate::domain::{Measurement, ModelKind, Observations, ParameterSpec, RelationshipOptions};
use crate::error::{ErrorKind, FitError, Result};
use crate::fit::{InitialFit, initial_fit, refine};
use crate::inference::likelihood::{ln_prior, model_ln_likelihood};
use crate::inference::{EnsembleSampler, McmcConfig, NestedConfig, NestedSampler};
use crate::prior::{PriorStrategy, Uniform};

/// Relative spread of the Gaussian ball walkers start in.
const WALKER_BALL: f64 = 1e-4;

/// A named parameter and its current estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub spec: ParameterSpec,
    pub distribution: Distribution,
}

impl Parameter {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn unit(&self) -> &str {
        &self.spec.unit
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    kind: ModelKind,
    observations: Observations,
    options: RelationshipOptions,
    parameters: Vec<Parameter>,
    ln_evidence: Option<Measurement>,
}

impl Relationship {
    /// Bundle observations with a model and run the initial fit.
    pub fn new(kind: ModelKind, observations: Observations, options: RelationshipOptions) -> Result<Self> {
        let fit = initial_fit(kind, &observations, options.unaccounted_uncertainty)?;
        let parameters = point_parameters(kind, options.unaccounted_uncertainty, &fit);
        Ok(Self {
            kind,
            observations,
            options,
            parameters,
            ln_evidence: None,
        })
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn observations(&self) -> &Observations {
        &self.observations
    }

    pub fn options(&self) -> &RelationshipOptions {
        &self.options
    }

    pub fn unaccounted_uncertainty(&self) -> bool {
        self.options.unaccounted_uncertainty
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Bayesian evidence from the last nested-sampling run.
    pub fn ln_evidence(&self) -> Option<Measurement> {
        self.ln_evidence
    }

    /// Median of every parameter, in parameter order.
    pub fn variable_medians(&self) -> Vec<f64> {
        self.parameters.iter().map(|p| p.distribution.median()).collect()
    }

    pub fn ln_likelihood(&self, params: &[f64]) -> f64 {
        model_ln_likelihood(self.kind, &self.observations, self.unaccounted_uncertainty(), params)
    }

    /// Unnormalised log posterior under `priors`.
    pub fn ln_probability(&self, priors: &[Uniform], params: &[f64]) -> f64 {
        let lp = ln_prior(priors, params);
        if lp == f64::NEG_INFINITY {
            return lp;
        }
        lp + self.ln_likelihood(params)
    }

    /// Refine the point estimates from the current medians.
    pub fn max_likelihood(&mut self) -> Result<()> {
        let fit = refine(
            self.kind,
            &self.observations,
            self.unaccounted_uncertainty(),
            &self.variable_medians(),
        )?;
        self.parameters = point_parameters(self.kind, self.unaccounted_uncertainty(), &fit);
        Ok(())
    }

    /// Ensemble MCMC under the priors produced by `prior`.
    pub fn mcmc(&mut self, prior: &dyn PriorStrategy, config: &McmcConfig) -> Result<()> {
        let n_dim = self.parameters.len();
        config.validate(n_dim)?;
        let mut medians = self.variable_medians();
        let priors = self.build_priors(prior, &mut medians)?;
        let mut rng = config.rng();

        let initial = self.initial_walkers(&medians, &priors, config.walkers, &mut rng);
        info!(
            model = self.kind.display_name(),
            walkers = config.walkers,
            n_burn = config.n_burn,
            n_samples = config.n_samples,
            "starting ensemble MCMC"
        );

        let chain = {
            let log_prob = |p: &[f64]| self.ln_probability(&priors, p);
            EnsembleSampler::new(n_dim, log_prob)
                .with_stretch(config.stretch)?
                .parallel(config.parallel)
                .run(&initial, config.n_burn, config.n_samples, config.progress, &mut rng)?
        };
        info!(acceptance = chain.mean_acceptance(), "ensemble MCMC finished");

        for (d, parameter) in self.parameters.iter_mut().enumerate() {
            parameter.distribution = Distribution::from_samples(chain.column(d));
        }
        Ok(())
    }

    /// Nested sampling under the priors produced by `prior`.
    ///
    /// Stores the evidence and replaces each parameter with equally weighted
    /// posterior draws.
    pub fn nested_sampling(&mut self, prior: &dyn PriorStrategy, config: &NestedConfig) -> Result<()> {
        config.validate()?;
        let mut medians = self.variable_medians();
        let priors = self.build_priors(prior, &mut medians)?;
        let mut rng = config.rng();

        info!(
            model = self.kind.display_name(),
            live_points = config.live_points,
            dlogz = config.dlogz,
            "starting nested sampling"
        );
        let result = {
            let ln_l = |p: &[f64]| self.ln_likelihood(p);
            NestedSampler::new(&priors, ln_l).run(config, &mut rng)?
        };

        let draws = result.resample_equal(&mut rng);
        if draws.is_empty() {
            return Err(FitError::new(ErrorKind::Sampling, "nested sampling produced no posterior weight"));
        }
        for (d, parameter) in self.parameters.iter_mut().enumerate() {
            parameter.distribution = Distribution::from_samples(draws.iter().map(|p| p[d]).collect());
        }
        self.ln_evidence = Some(Measurement::new(result.ln_evidence, result.ln_evidence_err));
        Ok(())
    }

    fn build_priors(&self, prior: &dyn PriorStrategy, medians: &mut [f64]) -> Result<Vec<Uniform>> {
        let priors = prior.priors(medians)?;
        if priors.len() != self.parameters.len() {
            return Err(FitError::new(
                ErrorKind::Prior,
                format!(
                    "prior strategy returned {} distributions for {} parameters",
                    priors.len(),
                    self.parameters.len()
                ),
            ));
        }
        Ok(priors)
    }

    /// Gaussian ball around the medians; a coordinate whose median sits outside
    /// its prior is drawn from the prior instead.
    fn initial_walkers<R: Rng>(&self, medians: &[f64], priors: &[Uniform], walkers: usize, rng: &mut R) -> Vec<Vec<f64>> {
        for (d, (&m, prior)) in medians.iter().zip(priors).enumerate() {
            if !prior.contains(m) {
                warn!(
                    parameter = self.parameters[d].name(),
                    estimate = m,
                    low = prior.low(),
                    high = prior.high(),
                    "initial estimate outside prior support; drawing walkers from the prior"
                );
            }
        }

        (0..walkers)
            .map(|_| {
                medians
                    .iter()
                    .zip(priors)
                    .map(|(&m, prior)| {
                        if !prior.contains(m) {
                            return prior.sample(rng);
                        }
                        let z: f64 = rng.sample(StandardNormal);
                        let width = if m == 0.0 { 1.0 } else { m.abs() };
                        let x = m + WALKER_BALL * width * z;
                        if prior.contains(x) { x } else { m }
                    })
                    .collect()
            })
            .collect()
    }
}

fn point_parameters(kind: ModelKind, unaccounted_uncertainty: bool, fit: &InitialFit) -> Vec<Parameter> {
    kind.parameter_specs(unaccounted_uncertainty)
        .into_iter()
        .zip(fit.values.iter().zip(&fit.uncertainties))
        .map(|(spec, (&value, &uncertainty))| Parameter {
            spec,
            distribution: Distribution::point(value, uncertainty),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::arrhenius;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn noisy_arrhenius() -> Observations {
        let t: Vec<f64> = (0..8).map(|i| 300.0 + 50.0 * i as f64).collect();
        let mut d = arrhenius(&t, 5.0e4, 1.0e-2);
        let wiggle = [1.02, 0.99, 1.01, 0.98, 1.0, 1.015, 0.985, 1.005];
        for (v, w) in d.iter_mut().zip(wiggle) {
            *v *= w;
        }
        let err = d.iter().map(|v| v * 0.02).collect();
        Observations::new(t, d, err).unwrap()
    }

    fn box_prior(medians: &mut [f64]) -> Result<Vec<Uniform>> {
        medians.iter().map(|&m| Uniform::new(0.5 * m, m)).collect()
    }

    #[test]
    fn construction_runs_initial_fit() {
        let rel = Relationship::new(ModelKind::StandardArrhenius, noisy_arrhenius(), RelationshipOptions::default())
            .unwrap();
        let medians = rel.variable_medians();
        assert_eq!(medians.len(), 2);
        assert!((medians[0] - 5.0e4).abs() / 5.0e4 < 0.05);
        assert_eq!(rel.parameters()[0].name(), "$E_a$");
        assert!(!rel.parameters()[0].distribution.is_sampled());
        assert!(rel.ln_evidence().is_none());
    }

    #[test]
    fn ln_probability_is_neg_inf_outside_prior() {
        let rel = Relationship::new(ModelKind::StandardArrhenius, noisy_arrhenius(), RelationshipOptions::default())
            .unwrap();
        let priors = [Uniform::new(0.0, 1.0).unwrap(), Uniform::new(0.0, 1.0).unwrap()];
        assert_eq!(rel.ln_probability(&priors, &[5.0e4, 1e-2]), f64::NEG_INFINITY);
    }

    #[test]
    fn mcmc_replaces_points_with_samples() {
        let mut rel =
            Relationship::new(ModelKind::StandardArrhenius, noisy_arrhenius(), RelationshipOptions::default())
                .unwrap();
        let config = McmcConfig {
            walkers: 8,
            n_burn: 20,
            n_samples: 30,
            seed: Some(5),
            ..McmcConfig::default()
        };
        rel.mcmc(&box_prior, &config).unwrap();
        for p in rel.parameters() {
            assert_eq!(p.distribution.len(), 240);
        }
        assert_eq!(rel.parameters()[1].unit(), "dimensionless");
    }

    #[test]
    fn prior_length_mismatch_is_prior_error() {
        let mut rel =
            Relationship::new(ModelKind::StandardArrhenius, noisy_arrhenius(), RelationshipOptions::default())
                .unwrap();
        let short = |_: &mut [f64]| -> Result<Vec<Uniform>> { Ok(vec![Uniform::new(0.0, 1.0)?]) };
        let err = rel.mcmc(&short, &McmcConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Prior);
    }

    #[test]
    fn walkers_outside_prior_are_drawn_from_it() {
        let rel = Relationship::new(ModelKind::StandardArrhenius, noisy_arrhenius(), RelationshipOptions::default())
            .unwrap();
        let priors = [Uniform::new(1.0, 2.0).unwrap(), Uniform::new(0.0, 1.0).unwrap()];
        let mut rng = StdRng::seed_from_u64(2);
        let walkers = rel.initial_walkers(&[5.0e4, 0.5], &priors, 10, &mut rng);
        for w in &walkers {
            assert!(priors[0].contains(w[0]));
            assert!((w[1] - 0.5).abs() < 1e-3);
        }
    }

    #[test]
    fn max_likelihood_restores_point_estimates() {
        let mut rel =
            Relationship::new(ModelKind::StandardArrhenius, noisy_arrhenius(), RelationshipOptions::default())
                .unwrap();
        let before = rel.variable_medians();
        rel.max_likelihood().unwrap();
        let after = rel.variable_medians();
        assert!((before[0] - after[0]).abs() / before[0] < 1e-6);
    }
}
