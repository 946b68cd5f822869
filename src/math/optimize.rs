//! Small nonlinear optimisers used by the initial fit.
//!
//! - [`levenberg_marquardt`] refines model parameters on weighted residuals.
//! - [`golden_section_max`] maximises a unimodal scalar function on an interval.
//!
//! Both are deterministic; no RNG is involved.

use nalgebra::{DMatrix, DVector};

/// Stopping rules for [`levenberg_marquardt`].
#[derive(Debug, Clone, Copy)]
pub struct LmOptions {
    pub max_iterations: usize,
    /// Relative chi-square decrease below which we stop.
    pub tolerance: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-12,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LmFit {
    pub params: Vec<f64>,
    /// Sum of squared residuals at `params`.
    pub chi2: f64,
    /// `(J^T J)^{-1}` at the solution; `None` when singular.
    pub covariance: Option<DMatrix<f64>>,
    pub iterations: usize,
}

const MAX_LAMBDA: f64 = 1e12;

/// Minimise `Σ r_i(p)^2` starting from `initial`.
///
/// Residuals are expected to be already weighted (`(y - f) / σ`). The normal
/// equations are solved in column-scaled form so parameters that differ by many
/// orders of magnitude (activation energies vs. prefactors) stay well conditioned.
///
/// Returns `None` if the starting point produces non-finite residuals.
pub fn levenberg_marquardt<F>(residuals: F, initial: &[f64], opts: &LmOptions) -> Option<LmFit>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let m = initial.len();
    let mut params = initial.to_vec();
    let mut r = residuals(&params);
    let mut chi2 = sum_sq(&r);
    if !chi2.is_finite() {
        return None;
    }

    let mut lambda = 1e-3;
    let mut iterations = 0;

    while iterations < opts.max_iterations {
        iterations += 1;
        let j = jacobian(&residuals, &params, &r);
        let jtj = j.transpose() * &j;
        let jtr = j.transpose() * DVector::from_column_slice(&r);
        let scale = column_scale(&jtj);

        let mut improved = false;
        while lambda <= MAX_LAMBDA {
            let mut a = DMatrix::<f64>::zeros(m, m);
            for row in 0..m {
                for col in 0..m {
                    a[(row, col)] = jtj[(row, col)] / (scale[row] * scale[col]);
                }
                a[(row, row)] += lambda;
            }
            let g = DVector::from_fn(m, |k, _| -jtr[k] / scale[k]);

            let Some(step) = a.lu().solve(&g) else {
                lambda *= 10.0;
                continue;
            };
            let trial: Vec<f64> = (0..m).map(|k| params[k] + step[k] / scale[k]).collect();
            let r_trial = residuals(&trial);
            let chi2_trial = sum_sq(&r_trial);

            if chi2_trial.is_finite() && chi2_trial < chi2 {
                let decrease = chi2 - chi2_trial;
                params = trial;
                r = r_trial;
                let previous = chi2;
                chi2 = chi2_trial;
                lambda = (lambda / 10.0).max(1e-12);
                improved = decrease > opts.tolerance * previous.max(f64::MIN_POSITIVE);
                break;
            }
            lambda *= 10.0;
        }

        if !improved {
            break;
        }
    }

    let j = jacobian(&residuals, &params, &r);
    let covariance = scaled_inverse(&(j.transpose() * &j));

    Some(LmFit {
        params,
        chi2,
        covariance,
        iterations,
    })
}

/// Maximise `f` on `[lo, hi]` by golden-section search.
pub fn golden_section_max<F>(f: F, lo: f64, hi: f64, tolerance: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    let inv_phi = (5.0_f64.sqrt() - 1.0) / 2.0;
    let (mut a, mut b) = (lo, hi);
    let mut c = b - inv_phi * (b - a);
    let mut d = a + inv_phi * (b - a);
    let mut fc = finite_or_neg_inf(f(c));
    let mut fd = finite_or_neg_inf(f(d));

    while (b - a).abs() > tolerance {
        if fc > fd {
            b = d;
            d = c;
            fd = fc;
            c = b - inv_phi * (b - a);
            fc = finite_or_neg_inf(f(c));
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + inv_phi * (b - a);
            fd = finite_or_neg_inf(f(d));
        }
    }
    (a + b) / 2.0
}

/// Central second derivative of `f` at `x`.
pub fn second_derivative<F>(f: F, x: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    let h = 1e-4 * x.abs().max(1.0);
    (f(x + h) - 2.0 * f(x) + f(x - h)) / (h * h)
}

fn jacobian<F>(residuals: &F, params: &[f64], r0: &[f64]) -> DMatrix<f64>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let n = r0.len();
    let m = params.len();
    let mut j = DMatrix::<f64>::zeros(n, m);
    let mut shifted = params.to_vec();
    for k in 0..m {
        let h = f64::EPSILON.sqrt() * params[k].abs().max(1.0);
        shifted[k] = params[k] + h;
        let r1 = residuals(&shifted);
        for i in 0..n {
            let d = (r1[i] - r0[i]) / h;
            j[(i, k)] = if d.is_finite() { d } else { 0.0 };
        }
        shifted[k] = params[k];
    }
    j
}

fn column_scale(jtj: &DMatrix<f64>) -> Vec<f64> {
    (0..jtj.nrows())
        .map(|k| {
            let s = jtj[(k, k)].sqrt();
            if s.is_finite() && s > 0.0 { s } else { 1.0 }
        })
        .collect()
}

fn scaled_inverse(jtj: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let m = jtj.nrows();
    let scale = column_scale(jtj);
    let scaled = DMatrix::from_fn(m, m, |r, c| jtj[(r, c)] / (scale[r] * scale[c]));
    let inv = scaled.try_inverse()?;
    let cov = DMatrix::from_fn(m, m, |r, c| inv[(r, c)] / (scale[r] * scale[c]));
    if cov.iter().all(|v| v.is_finite()) { Some(cov) } else { None }
}

fn sum_sq(r: &[f64]) -> f64 {
    r.iter().map(|v| v * v).sum()
}

fn finite_or_neg_inf(v: f64) -> f64 {
    if v.is_finite() { v } else { f64::NEG_INFINITY }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lm_fits_exponential_decay() {
        let x: Vec<f64> = (0..10).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = x.iter().map(|&xi| 3.0 * (-0.7 * xi).exp()).collect();
        let resid = |p: &[f64]| -> Vec<f64> {
            x.iter()
                .zip(&y)
                .map(|(&xi, &yi)| (yi - p[0] * (-p[1] * xi).exp()) / 0.01)
                .collect()
        };

        let fit = levenberg_marquardt(resid, &[1.0, 0.3], &LmOptions::default()).unwrap();
        assert!((fit.params[0] - 3.0).abs() < 1e-6, "amplitude {}", fit.params[0]);
        assert!((fit.params[1] - 0.7).abs() < 1e-6, "rate {}", fit.params[1]);
        assert!(fit.covariance.is_some());
    }

    #[test]
    fn lm_rejects_non_finite_start() {
        let resid = |_: &[f64]| vec![f64::NAN];
        assert!(levenberg_marquardt(resid, &[0.0], &LmOptions::default()).is_none());
    }

    #[test]
    fn golden_section_finds_parabola_peak() {
        let x = golden_section_max(|x| -(x - 0.3) * (x - 0.3), -10.0, 1.0, 1e-9);
        assert!((x - 0.3).abs() < 1e-6);
    }

    #[test]
    fn second_derivative_of_quadratic() {
        let d2 = second_derivative(|x| -2.0 * x * x, 1.5);
        assert!((d2 + 4.0).abs() < 1e-4);
    }
}
