//! Formatted terminal output.
//!
//! Formatting lives here so the fitting and sampling code never builds strings.

use crate::relationship::{Parameter, Relationship};

/// Format a relationship summary: model, data range and every parameter with
/// its median and 95 % interval.
pub fn format_summary(relationship: &Relationship) -> String {
    let obs = relationship.observations();
    let opts = relationship.options();
    let mut out = String::new();

    out.push_str(&format!("=== {} ===\n", relationship.kind().display_name()));
    out.push_str(&format!(
        "Data: {} points, {} from {:.2} to {:.2} {}\n",
        obs.len(),
        opts.temperature_name,
        obs.min_temperature(),
        obs.temperature().iter().copied().fold(f64::NEG_INFINITY, f64::max),
        opts.temperature_unit
    ));
    out.push_str(&format!("{} in {}\n", opts.diffusion_name, opts.diffusion_unit));
    out.push('\n');

    for p in relationship.parameters() {
        out.push_str(&format_parameter(p));
        out.push('\n');
    }

    if let Some(ln_z) = relationship.ln_evidence() {
        out.push_str(&format!("\nln Z = {:.3} +/- {:.3}\n", ln_z.nominal, ln_z.std_dev));
    }
    out
}

fn format_parameter(p: &Parameter) -> String {
    let d = &p.distribution;
    let (lo, hi) = d.con_int_95();
    let source = if d.is_sampled() {
        format!("{} samples", d.len())
    } else {
        "point estimate".to_string()
    };
    format!(
        "{:<24} {:>13.6e} [{:.6e}, {:.6e}] {} ({})",
        p.name(),
        d.median(),
        lo,
        hi,
        p.unit(),
        source
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RelationshipOptions;
    use crate::models::arrhenius;

    #[test]
    fn summary_lists_every_parameter() {
        let t: Vec<f64> = (0..6).map(|i| 300.0 + 60.0 * i as f64).collect();
        let d = arrhenius(&t, 4.0e4, 2.0e-3);
        let e = d.iter().map(|v| v * 0.03).collect();
        let rel = Relationship::standard_arrhenius(t, d, e, RelationshipOptions::default()).unwrap();

        let text = format_summary(&rel);
        assert!(text.starts_with("=== Arrhenius ==="));
        assert!(text.contains("6 points"));
        assert!(text.contains("$E_a$"));
        assert!(text.contains("J/mol"));
        assert!(text.contains("point estimate"));
        assert!(!text.contains("ln Z"));
    }
}
