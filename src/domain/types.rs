//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and sampling
//! - exported alongside results
//! - loaded from caller-side configuration files

use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};

/// Name used for the extra noise-scale parameter.
pub const UNACCOUNTED_UNCERTAINTY_NAME: &str = "unaccounted uncertainty";

/// Temperature-dependent diffusion measurements.
///
/// One entry per independent measurement; the three arrays always have the
/// same length. Ordering by temperature is not required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawObservations")]
pub struct Observations {
    temperature: Vec<f64>,
    diffusion: Vec<f64>,
    diffusion_error: Vec<f64>,
}

impl Observations {
    /// Bundle the three measurement arrays.
    ///
    /// Only the shape is checked here. Values are taken as-is: zero temperatures
    /// or negative errors flow through to the numerics untouched.
    pub fn new(temperature: Vec<f64>, diffusion: Vec<f64>, diffusion_error: Vec<f64>) -> Result<Self> {
        if temperature.len() != diffusion.len() || temperature.len() != diffusion_error.len() {
            return Err(FitError::invalid_input(format!(
                "temperature, diffusion and diffusion_error must have equal lengths (got {}, {}, {})",
                temperature.len(),
                diffusion.len(),
                diffusion_error.len()
            )));
        }
        if temperature.is_empty() {
            return Err(FitError::invalid_input("at least one observation is required"));
        }
        Ok(Self {
            temperature,
            diffusion,
            diffusion_error,
        })
    }

    pub fn temperature(&self) -> &[f64] {
        &self.temperature
    }

    pub fn diffusion(&self) -> &[f64] {
        &self.diffusion
    }

    pub fn diffusion_error(&self) -> &[f64] {
        &self.diffusion_error
    }

    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }

    /// Lowest observed temperature (NaN entries are ignored).
    pub fn min_temperature(&self) -> f64 {
        self.temperature
            .iter()
            .copied()
            .filter(|t| !t.is_nan())
            .fold(f64::INFINITY, f64::min)
    }
}

/// Unchecked wire form; deserialisation goes through [`Observations::new`].
#[derive(Deserialize)]
struct RawObservations {
    temperature: Vec<f64>,
    diffusion: Vec<f64>,
    diffusion_error: Vec<f64>,
}

impl TryFrom<RawObservations> for Observations {
    type Error = FitError;

    fn try_from(raw: RawObservations) -> Result<Self> {
        Observations::new(raw.temperature, raw.diffusion, raw.diffusion_error)
    }
}

/// A nominal value with a symmetric standard uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub nominal: f64,
    pub std_dev: f64,
}

impl Measurement {
    pub fn new(nominal: f64, std_dev: f64) -> Self {
        Self { nominal, std_dev }
    }
}

impl std::fmt::Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6e} +/- {:.2e}", self.nominal, self.std_dev)
    }
}

/// Name and unit of a fitted parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub unit: String,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
        }
    }
}

/// Which diffusion-rate law a relationship fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// `D = A exp(-E_a / (R T))`
    StandardArrhenius,
    /// `D = A exp(-E_a / (R (T - T0)))`
    SuperArrhenius,
}

impl ModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::StandardArrhenius => "Arrhenius",
            ModelKind::SuperArrhenius => "Super-Arrhenius (VTF)",
        }
    }

    /// Number of physical parameters (excluding the unaccounted uncertainty).
    pub fn model_param_count(self) -> usize {
        match self {
            ModelKind::StandardArrhenius => 2,
            ModelKind::SuperArrhenius => 3,
        }
    }

    /// Parameter names and units in the order they appear in parameter vectors.
    pub fn parameter_specs(self, unaccounted_uncertainty: bool) -> Vec<ParameterSpec> {
        let mut specs = vec![
            ParameterSpec::new("$E_a$", "J/mol"),
            ParameterSpec::new("$A$", "dimensionless"),
        ];
        if self == ModelKind::SuperArrhenius {
            specs.push(ParameterSpec::new("$T_0$", "K"));
        }
        if unaccounted_uncertainty {
            specs.push(ParameterSpec::new(UNACCOUNTED_UNCERTAINTY_NAME, "dimensionless"));
        }
        specs
    }
}

/// Construction-time options for a relationship.
///
/// Units and names are reporting metadata only; they are never used numerically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipOptions {
    pub temperature_unit: String,
    pub diffusion_unit: String,
    pub temperature_name: String,
    pub diffusion_name: String,
    /// Append a free noise-scale parameter to the model.
    pub unaccounted_uncertainty: bool,
}

impl Default for RelationshipOptions {
    fn default() -> Self {
        Self {
            temperature_unit: "K".to_string(),
            diffusion_unit: "cm^2/s".to_string(),
            temperature_name: "$T$".to_string(),
            diffusion_name: "$D$".to_string(),
            unaccounted_uncertainty: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observations_reject_length_mismatch() {
        let err = Observations::new(vec![300.0, 400.0], vec![1.0], vec![0.1, 0.1]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidInput);
    }

    #[test]
    fn deserialising_observations_checks_lengths() {
        let ok: Observations =
            serde_json::from_str(r#"{"temperature": [300, 400], "diffusion": [1, 2], "diffusion_error": [0.1, 0.1]}"#)
                .unwrap();
        assert_eq!(ok.len(), 2);
        let bad = serde_json::from_str::<Observations>(
            r#"{"temperature": [300, 400], "diffusion": [1], "diffusion_error": [0.1, 0.1]}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn min_temperature_ignores_order() {
        let obs = Observations::new(vec![500.0, 300.0, 400.0], vec![1.0; 3], vec![0.1; 3]).unwrap();
        assert_eq!(obs.min_temperature(), 300.0);
    }

    #[test]
    fn parameter_specs_append_unaccounted_last() {
        let specs = ModelKind::SuperArrhenius.parameter_specs(true);
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["$E_a$", "$A$", "$T_0$", UNACCOUNTED_UNCERTAINTY_NAME]);
        assert_eq!(specs[2].unit, "K");
    }

    #[test]
    fn options_fill_missing_fields_with_defaults() {
        let opts: RelationshipOptions = serde_json::from_str(r#"{"unaccounted_uncertainty": true}"#).unwrap();
        assert!(opts.unaccounted_uncertainty);
        assert_eq!(opts.temperature_unit, "K");
        assert_eq!(opts.diffusion_name, "$D$");
    }
}
