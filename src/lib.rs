//! `diffusion-fit` library crate.
//!
//! Fits Arrhenius and Super-Arrhenius (VTF) laws to temperature-dependent
//! diffusion coefficients and quantifies parameter uncertainty by MCMC or
//! nested sampling. Also provides the mean-squared-displacement bootstrap and
//! a minimal straight-line inference utility.
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod arrhenius;
pub mod distribution;
pub mod domain;
pub mod error;
pub mod fit;
pub mod inference;
pub mod math;
pub mod models;
pub mod msd;
pub mod prior;
pub mod relationship;
pub mod report;
pub mod straight_line;

pub use distribution::Distribution;
pub use domain::{Measurement, ModelKind, Observations, RelationshipOptions};
pub use error::{ErrorKind, FitError, Result};
pub use inference::{McmcConfig, NestedConfig};
pub use msd::{Msd, ResampleConfig};
pub use relationship::{Parameter, Relationship};
