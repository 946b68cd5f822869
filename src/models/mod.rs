//! Diffusion rate laws.
//!
//! Models are implemented as small, pure functions so that fitting and sampling
//! code can stay generic.

pub mod model;

pub use model::*;
