//! Sampler configuration.
//!
//! Every option a sampler understands is a named field with a default, so a
//! caller can build a config in code or load a partial JSON/TOML document
//! (`#[serde(default)]` fills the rest). Validation happens once, at the
//! boundary, before any work starts.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};

/// Affine-invariant ensemble MCMC settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McmcConfig {
    /// Number of walkers in the ensemble. Must be at least `2 * n_dim`.
    pub walkers: usize,
    /// Retained steps per walker.
    pub n_samples: usize,
    /// Discarded steps per walker before retention starts.
    pub n_burn: usize,
    /// Stretch-move scale `a` (> 1).
    pub stretch: f64,
    /// Evaluate walker proposals on the rayon pool.
    pub parallel: bool,
    /// Emit progress events every 10 % of the run.
    pub progress: bool,
    /// Fixed seed for reproducible runs; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for McmcConfig {
    fn default() -> Self {
        Self {
            walkers: 50,
            n_samples: 500,
            n_burn: 500,
            stretch: 2.0,
            parallel: true,
            progress: false,
            seed: None,
        }
    }
}

impl McmcConfig {
    pub fn validate(&self, n_dim: usize) -> Result<()> {
        if self.walkers < 2 * n_dim.max(1) {
            return Err(FitError::invalid_config(format!(
                "walkers ({}) must be at least twice the number of parameters ({n_dim})",
                self.walkers
            )));
        }
        if self.n_samples == 0 {
            return Err(FitError::invalid_config("n_samples must be >= 1"));
        }
        if !(self.stretch.is_finite() && self.stretch > 1.0) {
            return Err(FitError::invalid_config(format!(
                "stretch scale must be > 1 (got {})",
                self.stretch
            )));
        }
        Ok(())
    }

    pub fn rng(&self) -> StdRng {
        seeded_rng(self.seed)
    }
}

/// Static nested-sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestedConfig {
    /// Number of live points.
    pub live_points: usize,
    /// Stop once the estimated remaining evidence contribution `Δ ln Z` drops below this.
    pub dlogz: f64,
    /// Random-walk steps used to draw each replacement point.
    pub walks: usize,
    /// Hard cap on iterations; `None` runs until `dlogz` is met.
    pub max_iterations: Option<usize>,
    pub progress: bool,
    pub seed: Option<u64>,
}

impl Default for NestedConfig {
    fn default() -> Self {
        Self {
            live_points: 500,
            dlogz: 0.5,
            walks: 25,
            max_iterations: None,
            progress: false,
            seed: None,
        }
    }
}

impl NestedConfig {
    pub fn validate(&self) -> Result<()> {
        if self.live_points < 2 {
            return Err(FitError::invalid_config("live_points must be >= 2"));
        }
        if self.walks == 0 {
            return Err(FitError::invalid_config("walks must be >= 1"));
        }
        if !(self.dlogz.is_finite() && self.dlogz > 0.0) {
            return Err(FitError::invalid_config(format!("dlogz must be > 0 (got {})", self.dlogz)));
        }
        Ok(())
    }

    pub fn rng(&self) -> StdRng {
        seeded_rng(self.seed)
    }
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mcmc_defaults_validate_for_small_models() {
        assert!(McmcConfig::default().validate(4).is_ok());
    }

    #[test]
    fn mcmc_rejects_too_few_walkers() {
        let cfg = McmcConfig {
            walkers: 5,
            ..McmcConfig::default()
        };
        let err = cfg.validate(3).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidConfig);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: McmcConfig = serde_json::from_str(r#"{"n_samples": 20, "seed": 3}"#).unwrap();
        assert_eq!(cfg.n_samples, 20);
        assert_eq!(cfg.seed, Some(3));
        assert_eq!(cfg.walkers, 50);
        assert_eq!(cfg.n_burn, 500);

        let nested: NestedConfig = serde_json::from_str(r#"{"live_points": 1}"#).unwrap();
        assert!(nested.validate().is_err());
    }
}
