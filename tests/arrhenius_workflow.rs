//! End-to-end workflow: construct, inspect the prior, sample, report.

use diffusion_fit::models::{arrhenius, super_arrhenius};
use diffusion_fit::prior::PriorStrategy;
use diffusion_fit::report::format_summary;
use diffusion_fit::{McmcConfig, NestedConfig, Relationship, RelationshipOptions};

fn scatter(d: &mut [f64]) {
    for (i, v) in d.iter_mut().enumerate() {
        *v *= 1.0 + 0.015 * ((i as f64) * 2.3).sin();
    }
}

#[test]
fn arrhenius_mcmc_then_nested() {
    let t: Vec<f64> = (0..10).map(|i| 400.0 + 40.0 * i as f64).collect();
    let mut d = arrhenius(&t, 6.0e4, 3.0e-2);
    scatter(&mut d);
    let e: Vec<f64> = d.iter().map(|v| v * 0.03).collect();

    let mut rel = Relationship::standard_arrhenius(t, d, e, RelationshipOptions::default()).unwrap();
    let start = rel.activation_energy().median();
    assert!((start - 6.0e4).abs() / 6.0e4 < 0.05);

    let mcmc = McmcConfig {
        walkers: 16,
        n_burn: 200,
        n_samples: 100,
        seed: Some(123),
        ..McmcConfig::default()
    };
    rel.sample(&mcmc).unwrap();
    assert_eq!(rel.activation_energy().len(), 1600);
    let (lo, hi) = rel.activation_energy().con_int_95();
    assert!(lo < hi);
    assert!(lo > 0.0, "prior keeps E_a positive");

    let nested = NestedConfig {
        live_points: 100,
        seed: Some(7),
        ..NestedConfig::default()
    };
    rel.nested(&nested).unwrap();
    assert!(rel.ln_evidence().is_some());

    let text = format_summary(&rel);
    assert!(text.contains("ln Z"));
    assert!(text.contains("samples"));
}

#[test]
fn super_arrhenius_with_unaccounted_uncertainty() {
    let t: Vec<f64> = (0..12).map(|i| 260.0 + 25.0 * i as f64).collect();
    let mut d = super_arrhenius(&t, 1.2e4, 5.0e-3, 100.0);
    scatter(&mut d);
    let e: Vec<f64> = d.iter().map(|v| v * 0.01).collect();
    let options = RelationshipOptions {
        unaccounted_uncertainty: true,
        ..RelationshipOptions::default()
    };

    let mut rel = Relationship::super_arrhenius(t, d, e, options).unwrap();
    assert_eq!(rel.parameters().len(), 4);
    assert_eq!(rel.parameters()[3].name(), "unaccounted uncertainty");

    let mut medians = rel.variable_medians();
    let priors = rel.all_positive_prior().priors(&mut medians).unwrap();
    assert_eq!(priors[2].high(), 260.0 - 0.1);
    assert_eq!((priors[3].low(), priors[3].high()), (-10.0, 1.0));

    let mcmc = McmcConfig {
        walkers: 16,
        n_burn: 100,
        n_samples: 50,
        seed: Some(99),
        ..McmcConfig::default()
    };
    rel.sample(&mcmc).unwrap();
    let t_zero = rel.t_zero().unwrap();
    assert!(t_zero.samples().unwrap().iter().all(|v| *v > 0.0 && *v < 259.9));
    assert!(rel.unaccounted().unwrap().samples().unwrap().iter().all(|u| (-10.0..=1.0).contains(u)));
}
