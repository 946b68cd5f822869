//! Weighted least squares solver.
//!
//! The initial Arrhenius fit repeatedly solves small linear regression problems of
//! the form:
//!
//! ```text
//! minimize Σ w_i (y_i - x_i^T β)^2
//! ```
//!
//! The linearised model `ln D = ln A - E_a / (R (T - T0))` is linear in β given a
//! fixed `T0`, so we solve β once per `T0` candidate during the grid search.
//!
//! Implementation choices:
//! - We scale rows by `sqrt(w_i)` and solve an ordinary least squares problem.
//! - SVD keeps the solve robust for tall design matrices (more rows than columns).
//! - The parameter covariance `(X_w^T X_w)^{-1}` is returned alongside β so the
//!   caller can report symmetric uncertainties.

use nalgebra::{DMatrix, DVector};

/// Result of a weighted linear fit.
#[derive(Debug, Clone)]
pub struct WeightedFit {
    pub beta: DVector<f64>,
    /// Weighted sum of squared residuals.
    pub sse: f64,
    /// `(X_w^T X_w)^{-1}`; `None` when the normal matrix is singular.
    pub covariance: Option<DMatrix<f64>>,
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve `minimize Σ w_i (y_i - x_i^T β)^2`.
///
/// Rows with a non-finite or non-positive weight make the problem ill-posed and
/// yield `None`.
pub fn weighted_least_squares(x: &DMatrix<f64>, y: &DVector<f64>, w: &[f64]) -> Option<WeightedFit> {
    let (n, p) = x.shape();
    if n != y.len() || n != w.len() || n == 0 {
        return None;
    }
    if w.iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return None;
    }

    let mut xw = DMatrix::<f64>::zeros(n, p);
    let mut yw = DVector::<f64>::zeros(n);
    for i in 0..n {
        let sw = w[i].sqrt();
        for j in 0..p {
            xw[(i, j)] = x[(i, j)] * sw;
        }
        yw[i] = y[i] * sw;
    }

    let beta = solve_least_squares(&xw, &yw)?;
    let residuals = &yw - &xw * &beta;
    let sse = residuals.norm_squared();
    if !sse.is_finite() {
        return None;
    }
    let covariance = (xw.transpose() * &xw).try_inverse();

    Some(WeightedFit { beta, sse, covariance })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn weighted_fit_recovers_line_and_covariance() {
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let y = DVector::from_row_slice(&[1.0, 3.0, 5.0, 7.0]);
        let w = [4.0, 4.0, 4.0, 4.0];

        let fit = weighted_least_squares(&x, &y, &w).unwrap();
        assert!((fit.beta[0] - 1.0).abs() < 1e-10);
        assert!((fit.beta[1] - 2.0).abs() < 1e-10);
        assert!(fit.sse < 1e-18);

        // Slope variance for x = 0..3 with sigma = 0.5: sigma^2 / Sxx = 0.25 / 5.
        let cov = fit.covariance.unwrap();
        assert!((cov[(1, 1)] - 0.05).abs() < 1e-12);
    }

    #[test]
    fn weighted_fit_rejects_non_positive_weights() {
        let x = DMatrix::from_row_slice(2, 1, &[1.0, 1.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0]);
        assert!(weighted_least_squares(&x, &y, &[1.0, 0.0]).is_none());
    }
}
