//! Posterior exploration: likelihood, sampler configuration, ensemble MCMC and
//! nested sampling.

pub mod config;
pub mod ensemble;
pub mod likelihood;
pub mod nested;

pub use config::{McmcConfig, NestedConfig};
pub use ensemble::{Chain, EnsembleSampler};
pub use likelihood::{gaussian_ln_likelihood, ln_prior, model_ln_likelihood};
pub use nested::{NestedResult, NestedSampler};
