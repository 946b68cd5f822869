//! Model evaluation for the Arrhenius family.
//!
//! The fitter relies on two primitive operations:
//! - build a linearised design row for a given temperature (for weighted OLS)
//! - predict `D(T)` given the parameter vector (for residuals and likelihoods)
//!
//! Singular inputs (`T = 0`, `T = T0`) are not guarded: the division produces
//! `inf`/`NaN`, which the likelihood turns into a rejected proposal.

use crate::domain::ModelKind;

/// Molar gas constant in J mol⁻¹ K⁻¹ (CODATA 2018, exact).
pub const GAS_CONSTANT: f64 = 8.314_462_618;

/// `D = A exp(-E_a / (R T))`, evaluated elementwise over `temperature`.
pub fn arrhenius(temperature: &[f64], activation_energy: f64, prefactor: f64) -> Vec<f64> {
    temperature
        .iter()
        .map(|&t| prefactor * (-activation_energy / (GAS_CONSTANT * t)).exp())
        .collect()
}

/// `D = A exp(-E_a / (R (T - T0)))`, evaluated elementwise over `temperature`.
pub fn super_arrhenius(temperature: &[f64], activation_energy: f64, prefactor: f64, t_zero: f64) -> Vec<f64> {
    temperature
        .iter()
        .map(|&t| prefactor * (-activation_energy / (GAS_CONSTANT * (t - t_zero))).exp())
        .collect()
}

/// Predict `D(T)` for a single temperature.
///
/// `params` holds the model parameters in `ModelKind::parameter_specs` order;
/// any trailing entries (the unaccounted uncertainty) are ignored.
///
/// # Panics
/// Panics if `params` is shorter than `model.model_param_count()`.
pub fn predict(model: ModelKind, temperature: f64, params: &[f64]) -> f64 {
    match model {
        ModelKind::StandardArrhenius => params[1] * (-params[0] / (GAS_CONSTANT * temperature)).exp(),
        ModelKind::SuperArrhenius => {
            params[1] * (-params[0] / (GAS_CONSTANT * (temperature - params[2]))).exp()
        }
    }
}

/// Predict `D(T)` for every temperature.
pub fn evaluate(model: ModelKind, temperature: &[f64], params: &[f64]) -> Vec<f64> {
    match model {
        ModelKind::StandardArrhenius => arrhenius(temperature, params[0], params[1]),
        ModelKind::SuperArrhenius => super_arrhenius(temperature, params[0], params[1], params[2]),
    }
}

/// Fill a design row for the linearised model `ln D = ln A - E_a / (R (T - T0))`.
///
/// Columns are `[1, -1 / (R (T - T0))]`, so β = `[ln A, E_a]`. For the standard
/// Arrhenius form pass `t_zero = 0`.
pub fn fill_design_row(temperature: f64, t_zero: f64, out: &mut [f64; 2]) {
    out[0] = 1.0;
    out[1] = -1.0 / (GAS_CONSTANT * (temperature - t_zero));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrhenius_is_elementwise() {
        let t = [300.0, 400.0, 500.0, 600.0];
        let d = arrhenius(&t, 20_000.0, 1e-3);
        assert_eq!(d.len(), t.len());
        for (&ti, &di) in t.iter().zip(&d) {
            let expected = 1e-3 * (-20_000.0 / (GAS_CONSTANT * ti)).exp();
            assert!((di - expected).abs() < 1e-18);
        }
    }

    #[test]
    fn super_arrhenius_reduces_to_arrhenius_at_zero_t0() {
        let t = [300.0, 450.0];
        assert_eq!(super_arrhenius(&t, 1e4, 2.0, 0.0), arrhenius(&t, 1e4, 2.0));
    }

    #[test]
    fn singular_temperatures_propagate_non_finite_values() {
        // exp(-inf) collapses to 0 for positive E_a; a negative E_a blows up.
        assert_eq!(arrhenius(&[0.0], 1e4, 1.0)[0], 0.0);
        assert!(arrhenius(&[0.0], -1e4, 1.0)[0].is_infinite());
        assert!(super_arrhenius(&[250.0], 0.0, 1.0, 250.0)[0].is_nan());
    }

    #[test]
    fn predict_matches_vectorised_form() {
        let params = [3.0e4, 5e-2, 120.0];
        let t = [300.0, 350.0];
        let v = evaluate(ModelKind::SuperArrhenius, &t, &params);
        assert_eq!(v[1], predict(ModelKind::SuperArrhenius, 350.0, &params));
    }
}
