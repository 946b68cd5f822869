//! "Value with uncertainty" representation for fitted parameters.
//!
//! After the least-squares fit a parameter is a point estimate with a symmetric
//! standard error. After MCMC or nested sampling it is replaced by the empirical
//! posterior samples. Both answer the same questions (median, spread, interval).

use serde::{Deserialize, Serialize};

use crate::math::stats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    Point { value: f64, uncertainty: f64 },
    Samples(Vec<f64>),
}

impl Distribution {
    pub fn point(value: f64, uncertainty: f64) -> Self {
        Distribution::Point { value, uncertainty }
    }

    pub fn from_samples(samples: Vec<f64>) -> Self {
        Distribution::Samples(samples)
    }

    pub fn median(&self) -> f64 {
        match self {
            Distribution::Point { value, .. } => *value,
            Distribution::Samples(s) => stats::median(s),
        }
    }

    pub fn mean(&self) -> f64 {
        match self {
            Distribution::Point { value, .. } => *value,
            Distribution::Samples(s) => stats::mean(s),
        }
    }

    pub fn std_dev(&self) -> f64 {
        match self {
            Distribution::Point { uncertainty, .. } => *uncertainty,
            Distribution::Samples(s) => stats::std_dev(s),
        }
    }

    /// Interval between the `lower` and `upper` percentiles.
    ///
    /// Point estimates are treated as normal, so the interval is
    /// `value ± z σ` with `z` matching the requested percentiles.
    pub fn con_int(&self, lower: f64, upper: f64) -> (f64, f64) {
        match self {
            Distribution::Point { value, uncertainty } => (
                value + normal_quantile(lower / 100.0) * uncertainty,
                value + normal_quantile(upper / 100.0) * uncertainty,
            ),
            Distribution::Samples(s) => {
                let mut sorted = s.clone();
                sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                (stats::percentile_sorted(&sorted, lower), stats::percentile_sorted(&sorted, upper))
            }
        }
    }

    /// 95 % interval.
    pub fn con_int_95(&self) -> (f64, f64) {
        self.con_int(2.5, 97.5)
    }

    /// Number of samples backing the distribution (1 for a point estimate).
    pub fn len(&self) -> usize {
        match self {
            Distribution::Point { .. } => 1,
            Distribution::Samples(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_sampled(&self) -> bool {
        matches!(self, Distribution::Samples(_))
    }

    pub fn samples(&self) -> Option<&[f64]> {
        match self {
            Distribution::Point { .. } => None,
            Distribution::Samples(s) => Some(s),
        }
    }
}

/// Standard normal quantile (Acklam's rational approximation, |err| < 1.2e-9).
fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e1,
        2.209460984245205e2,
        -2.759285104469687e2,
        1.383577518672690e2,
        -3.066479806614716e1,
        2.506628277459239,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e1,
        1.615858368580409e2,
        -1.556989798598866e2,
        6.680131188771972e1,
        -1.328068155288572e1,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-3,
        -3.223964580411365e-1,
        -2.400758277161838,
        -2.549732539343734,
        4.374664141464968,
        2.938163982698783,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-3,
        3.224671290700398e-1,
        2.445134137142996,
        3.754408661907416,
    ];

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    let p_low = 0.02425;
    if p < p_low {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - p_low {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -normal_quantile(1.0 - p)
    }
}
