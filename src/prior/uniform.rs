//! Bounded uniform distribution.
//!
//! Parameterised by `loc` and `scale`, covering `[loc, loc + scale]`. This is the
//! only prior family the models need: every prior is a box that encodes a
//! physical constraint (positivity, `T0` below the data) without shaping the
//! posterior inside it.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, FitError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Uniform {
    loc: f64,
    scale: f64,
}

impl Uniform {
    /// Uniform on `[loc, loc + scale]`.
    ///
    /// Fails with [`ErrorKind::Prior`] if the support is empty, negative or
    /// non-finite.
    pub fn new(loc: f64, scale: f64) -> Result<Self> {
        if !(loc.is_finite() && scale.is_finite()) {
            return Err(FitError::new(
                ErrorKind::Prior,
                format!("uniform support must be finite (loc={loc}, scale={scale})"),
            ));
        }
        if scale <= 0.0 {
            return Err(FitError::new(
                ErrorKind::Prior,
                format!("uniform support has non-positive width (loc={loc}, scale={scale})"),
            ));
        }
        Ok(Self { loc, scale })
    }

    pub fn loc(&self) -> f64 {
        self.loc
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn low(&self) -> f64 {
        self.loc
    }

    pub fn high(&self) -> f64 {
        self.loc + self.scale
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.low() && x <= self.high()
    }

    /// Log density; `-inf` outside the support.
    pub fn ln_pdf(&self, x: f64) -> f64 {
        if self.contains(x) {
            -self.scale.ln()
        } else {
            f64::NEG_INFINITY
        }
    }

    /// Inverse CDF, mapping the unit interval onto the support.
    pub fn ppf(&self, u: f64) -> f64 {
        self.loc + u * self.scale
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.ppf(rng.gen_range(0.0..1.0))
    }
}
