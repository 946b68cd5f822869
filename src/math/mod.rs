//! Mathematical utilities: weighted least squares, nonlinear refinement and
//! summary statistics.

pub mod ols;
pub mod optimize;
pub mod stats;

pub use ols::*;
pub use optimize::*;
