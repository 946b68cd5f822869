//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - observation triples (`Observations`)
//! - model kinds and their parameter metadata (`ModelKind`, `ParameterSpec`)
//! - uncertain scalar values (`Measurement`)
//! - relationship construction options (`RelationshipOptions`)

pub mod types;

pub use types::*;
