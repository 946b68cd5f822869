//! Prior construction.
//!
//! A prior strategy turns the current point estimates into one bounded
//! distribution per parameter. The sampling engine only sees the
//! [`PriorStrategy`] capability; each model kind supplies its own
//! [`AllPositivePrior`] configuration.

use tracing::debug;

use crate::domain::ModelKind;
use crate::error::{ErrorKind, FitError, Result};
use crate::prior::Uniform;

/// Smallest positive normal float; the lower bound of every positive prior.
pub const POSITIVE_FLOOR: f64 = f64::MIN_POSITIVE;

/// Bounds of the unaccounted-uncertainty prior as `(loc, scale)`.
pub const UNACCOUNTED_PRIOR: (f64, f64) = (-10.0, 11.0);

/// Clearance kept between `T0` and the lowest observed temperature.
pub const T_ZERO_MARGIN: f64 = 0.1;

/// Given the current parameter point estimates, return one bounded
/// distribution per parameter.
///
/// Implementations may adjust `medians` in place (for example to move an
/// estimate off a degenerate zero anchor); the engine uses the adjusted values
/// to initialise the sampler.
pub trait PriorStrategy {
    fn priors(&self, medians: &mut [f64]) -> Result<Vec<Uniform>>;
}

impl<F> PriorStrategy for F
where
    F: Fn(&mut [f64]) -> Result<Vec<Uniform>>,
{
    fn priors(&self, medians: &mut [f64]) -> Result<Vec<Uniform>> {
        self(medians)
    }
}

/// Positive, data-anchored uniform priors.
///
/// - Arrhenius: every parameter `v` gets `U(ε, v + 2|v|)`.
/// - Super-Arrhenius: `E_a` and `A` get `U(ε, v + 4|v|)`; `T0` gets
///   `U(ε, min(T) - 0.1)` so the singularity stays below the data.
/// - The unaccounted uncertainty (always the last slot) gets `U(loc=-10, scale=11)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllPositivePrior {
    pub kind: ModelKind,
    pub unaccounted_uncertainty: bool,
    pub min_temperature: f64,
}

impl AllPositivePrior {
    pub fn new(kind: ModelKind, unaccounted_uncertainty: bool, min_temperature: f64) -> Self {
        Self {
            kind,
            unaccounted_uncertainty,
            min_temperature,
        }
    }

    fn width_factor(&self) -> f64 {
        match self.kind {
            ModelKind::StandardArrhenius => 2.0,
            ModelKind::SuperArrhenius => 4.0,
        }
    }

    fn expected_len(&self) -> usize {
        self.kind.model_param_count() + usize::from(self.unaccounted_uncertainty)
    }

    fn positive(&self, index: usize, value: f64) -> Result<Uniform> {
        let high = value + value.abs() * self.width_factor();
        Uniform::new(POSITIVE_FLOOR, high - POSITIVE_FLOOR).map_err(|e| {
            FitError::new(
                ErrorKind::Prior,
                format!("positive prior for parameter {index} (estimate {value}): {}", e.message()),
            )
        })
    }
}

impl PriorStrategy for AllPositivePrior {
    fn priors(&self, medians: &mut [f64]) -> Result<Vec<Uniform>> {
        let n = self.expected_len();
        if medians.len() != n {
            return Err(FitError::new(
                ErrorKind::Prior,
                format!("expected {n} parameter estimates, got {}", medians.len()),
            ));
        }

        let unaccounted_slot = self.unaccounted_uncertainty.then(|| n - 1);
        let t_zero_slot = match self.kind {
            ModelKind::StandardArrhenius => None,
            ModelKind::SuperArrhenius => Some(if self.unaccounted_uncertainty { n - 2 } else { n - 1 }),
        };

        if let Some(slot) = t_zero_slot {
            if medians[slot] == 0.0 {
                medians[slot] = 1.0;
            }
        }

        let mut priors = Vec::with_capacity(n);
        for (i, &value) in medians.iter().enumerate() {
            let prior = if Some(i) == unaccounted_slot {
                Uniform::new(UNACCOUNTED_PRIOR.0, UNACCOUNTED_PRIOR.1)?
            } else if Some(i) == t_zero_slot {
                Uniform::new(POSITIVE_FLOOR, self.min_temperature - T_ZERO_MARGIN).map_err(|e| {
                    FitError::new(
                        ErrorKind::Prior,
                        format!(
                            "T0 prior needs min(temperature) > {T_ZERO_MARGIN} (got {}): {}",
                            self.min_temperature,
                            e.message()
                        ),
                    )
                })?
            } else {
                self.positive(i, value)?
            };
            priors.push(prior);
        }

        debug!(
            model = self.kind.display_name(),
            bounds = ?priors.iter().map(|p| (p.low(), p.high())).collect::<Vec<_>>(),
            "built all-positive prior"
        );
        Ok(priors)
    }
}
