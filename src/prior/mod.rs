//! Priors: the bounded uniform family and the strategies that build them.

pub mod strategy;
pub mod uniform;

pub use strategy::*;
pub use uniform::*;
