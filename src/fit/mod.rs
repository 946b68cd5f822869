//! Deterministic initial fit.
//!
//! Responsibilities:
//!
//! - generate the `T0` grid for Super-Arrhenius
//! - evaluate each linearised candidate (parallel) and pick the best
//! - refine in direct space and derive symmetric uncertainties

pub mod fitter;
pub mod t_zero_grid;

pub use fitter::*;
pub use t_zero_grid::*;
