use std::f64::consts::PI;

use crate::engine::evaluation::{guarded_div, Domain, Rule, RuleSet};
use crate::engine::model::{ModelDefinition, OutputSpec, ParameterSpec, SeriesSpec, Suite};

/// Half-width of the observed screen region, mm.
const SCREEN_HALF_WIDTH_MM: f64 = 10.0;

pub(super) fn models() -> Vec<ModelDefinition> {
    vec![double_slit()]
}

fn double_slit() -> ModelDefinition {
    ModelDefinition::new("double_slit", "Young's Double Slit", Suite::Optics)
        .summary("Two-slit interference fringes on a distant screen.")
        .formula("beta = lambda D / d, I(x) = cos^2(pi d x / (lambda D))")
        .parameter(ParameterSpec::number("wavelength_nm", "Wavelength", 400.0, 700.0, 550.0).with_unit("nm"))
        .parameter(ParameterSpec::number("slit_separation_mm", "Slit separation", 0.1, 5.0, 0.5).with_unit("mm"))
        .parameter(ParameterSpec::number("screen_distance_cm", "Screen distance", 10.0, 100.0, 50.0).with_unit("cm"))
        .output(
            OutputSpec::scalar("fringe_width_mm", "Fringe width", |p, _| {
                let wavelength = p.number("wavelength_nm")? * 1e-9;
                let separation = p.number("slit_separation_mm")? * 1e-3;
                let distance = p.number("screen_distance_cm")? / 100.0;
                Ok(guarded_div("fringe_width_mm", wavelength * distance, separation)? * 1e3)
            })
            .with_unit("mm"),
        )
        .output(OutputSpec::scalar("fringes_in_view", "Bright fringes in view", |_, s| {
            let span = 2.0 * SCREEN_HALF_WIDTH_MM;
            Ok(guarded_div("fringes_in_view", span, s.get("fringe_width_mm")?)?.floor())
        }))
        .output(OutputSpec::series(
            "intensity",
            "Relative intensity I(x)",
            SeriesSpec {
                x_label: "Screen position",
                x_unit: Some("mm"),
                resolution: 1000,
                domain: |_, _| Ok(Domain::new(-SCREEN_HALF_WIDTH_MM, SCREEN_HALF_WIDTH_MM)),
                curve: |_, s, x| {
                    // Bright fringes sit at integer multiples of the fringe width.
                    let phase = guarded_div("intensity", PI * x, s.get("fringe_width_mm")?)?;
                    Ok(phase.cos().powi(2))
                },
            },
        ))
        .classify(
            "visibility",
            "fringe_width_mm",
            RuleSet::new(vec![
                Rule::at_least(1.0, "Resolvable by eye"),
                Rule::at_least(0.1, "Needs a travelling microscope"),
                Rule::otherwise("Too fine to resolve"),
            ]),
        )
}
