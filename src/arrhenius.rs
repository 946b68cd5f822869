//! Arrhenius and Super-Arrhenius (VTF) relationships.
//!
//! Both variants are a [`Relationship`] tagged with a [`ModelKind`]. This
//! module adds the variant-facing surface: constructors from raw arrays, the
//! all-positive prior each variant samples under, and named accessors for the
//! fitted parameters.

use crate::distribution::Distribution;
use crate::domain::{ModelKind, Observations, RelationshipOptions};
use crate::error::Result;
use crate::inference::{McmcConfig, NestedConfig};
use crate::prior::AllPositivePrior;
use crate::relationship::Relationship;

impl Relationship {
    /// `D = A exp(-E_a / (R T))` fitted to the given measurements.
    pub fn standard_arrhenius(
        temperature: Vec<f64>,
        diffusion: Vec<f64>,
        diffusion_error: Vec<f64>,
        options: RelationshipOptions,
    ) -> Result<Self> {
        let observations = Observations::new(temperature, diffusion, diffusion_error)?;
        Relationship::new(ModelKind::StandardArrhenius, observations, options)
    }

    /// `D = A exp(-E_a / (R (T - T0)))` fitted to the given measurements.
    pub fn super_arrhenius(
        temperature: Vec<f64>,
        diffusion: Vec<f64>,
        diffusion_error: Vec<f64>,
        options: RelationshipOptions,
    ) -> Result<Self> {
        let observations = Observations::new(temperature, diffusion, diffusion_error)?;
        Relationship::new(ModelKind::SuperArrhenius, observations, options)
    }

    /// The prior strategy this relationship samples under.
    pub fn all_positive_prior(&self) -> AllPositivePrior {
        AllPositivePrior::new(
            self.kind(),
            self.unaccounted_uncertainty(),
            self.observations().min_temperature(),
        )
    }

    /// MCMC under [`Relationship::all_positive_prior`].
    pub fn sample(&mut self, config: &McmcConfig) -> Result<()> {
        let prior = self.all_positive_prior();
        self.mcmc(&prior, config)
    }

    /// Nested sampling under [`Relationship::all_positive_prior`].
    pub fn nested(&mut self, config: &NestedConfig) -> Result<()> {
        let prior = self.all_positive_prior();
        self.nested_sampling(&prior, config)
    }

    pub fn activation_energy(&self) -> &Distribution {
        &self.parameters()[0].distribution
    }

    pub fn prefactor(&self) -> &Distribution {
        &self.parameters()[1].distribution
    }

    /// `T0`; `None` for the standard form.
    pub fn t_zero(&self) -> Option<&Distribution> {
        match self.kind() {
            ModelKind::StandardArrhenius => None,
            ModelKind::SuperArrhenius => Some(&self.parameters()[2].distribution),
        }
    }

    /// The unaccounted-uncertainty parameter, when enabled.
    pub fn unaccounted(&self) -> Option<&Distribution> {
        self.unaccounted_uncertainty()
            .then(|| self.parameters().last().map(|p| &p.distribution))
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{arrhenius, super_arrhenius};
    use crate::prior::{PriorStrategy, Uniform};

    fn vtf_data() -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let t: Vec<f64> = (0..10).map(|i| 280.0 + 30.0 * i as f64).collect();
        let mut d = super_arrhenius(&t, 1.5e4, 2.0e-3, 120.0);
        for (i, v) in d.iter_mut().enumerate() {
            *v *= 1.0 + 0.01 * ((i as f64) * 1.7).sin();
        }
        let err = d.iter().map(|v| v * 0.02).collect();
        (t, d, err)
    }

    fn options(unaccounted_uncertainty: bool) -> RelationshipOptions {
        RelationshipOptions {
            unaccounted_uncertainty,
            ..RelationshipOptions::default()
        }
    }

    #[test]
    fn super_prior_bounds_t_zero_by_lowest_temperature() {
        let (t, d, e) = vtf_data();
        let rel = Relationship::super_arrhenius(t, d, e, options(false)).unwrap();
        let mut medians = rel.variable_medians();
        let priors = rel.all_positive_prior().priors(&mut medians).unwrap();
        assert_eq!(priors.len(), 3);
        assert_eq!(priors[2].high(), 280.0 - 0.1);
    }

    #[test]
    fn super_prior_with_unaccounted_uncertainty_slots() {
        let (t, d, e) = vtf_data();
        let rel = Relationship::super_arrhenius(t, d, e, options(true)).unwrap();
        let mut medians = rel.variable_medians();
        assert_eq!(medians.len(), 4);
        let priors = rel.all_positive_prior().priors(&mut medians).unwrap();
        assert_eq!(priors[3], Uniform::new(-10.0, 11.0).unwrap());
        assert_eq!(priors[2].high(), 280.0 - 0.1);
        assert!(rel.unaccounted().is_some());
    }

    #[test]
    fn standard_sample_keeps_metadata_and_stores_samples() {
        let t: Vec<f64> = (0..8).map(|i| 300.0 + 40.0 * i as f64).collect();
        let d = arrhenius(&t, 3.0e4, 5.0e-3);
        let e = d.iter().map(|v| v * 0.05).collect();
        let mut rel = Relationship::standard_arrhenius(t, d, e, options(false)).unwrap();
        assert!(rel.t_zero().is_none());

        let config = McmcConfig {
            walkers: 10,
            n_burn: 50,
            n_samples: 40,
            seed: Some(21),
            ..McmcConfig::default()
        };
        rel.sample(&config).unwrap();
        assert_eq!(rel.activation_energy().len(), 400);
        assert!(rel.prefactor().is_sampled());
        assert_eq!(rel.parameters()[0].name(), "$E_a$");
        assert_eq!(rel.parameters()[0].unit(), "J/mol");
        let (lo, hi) = rel.activation_energy().con_int_95();
        assert!(lo < 3.0e4 * 1.1 && hi > 3.0e4 * 0.9, "95 % interval ({lo}, {hi})");
    }

    #[test]
    fn nested_records_evidence() {
        let t: Vec<f64> = (0..8).map(|i| 300.0 + 40.0 * i as f64).collect();
        let d = arrhenius(&t, 3.0e4, 5.0e-3);
        let e = d.iter().map(|v| v * 0.05).collect();
        let mut rel = Relationship::standard_arrhenius(t, d, e, options(false)).unwrap();

        let config = NestedConfig {
            live_points: 50,
            seed: Some(4),
            ..NestedConfig::default()
        };
        rel.nested(&config).unwrap();
        let ln_z = rel.ln_evidence().unwrap();
        assert!(ln_z.nominal.is_finite());
        assert!(ln_z.std_dev > 0.0);
        assert!(rel.activation_energy().is_sampled());
    }

    #[test]
    fn mismatched_arrays_are_rejected() {
        let err = Relationship::standard_arrhenius(vec![300.0, 400.0], vec![1e-5], vec![1e-6, 1e-6], options(false))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
