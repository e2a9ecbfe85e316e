use crate::engine::evaluation::{guarded_div, ComputationError, Domain, ParameterSet, Rule, RuleSet};
use crate::engine::model::{ModelDefinition, OutputSpec, ParameterSpec, SeriesSpec, Suite};

use super::unknown_choice;

pub(super) fn models() -> Vec<ModelDefinition> {
    vec![
        brick_compression(),
        water_absorption(),
        flow_table(),
        slump_test(),
        sand_bulking(),
    ]
}

/// IS 1077 grade bands, N/mm².
fn brick_grades() -> RuleSet {
    RuleSet::new(vec![
        Rule::at_least(35.0, "Grade A"),
        Rule::half_open(25.0, 35.0, "Grade B"),
        Rule::half_open(12.0, 25.0, "Grade C"),
        Rule::otherwise("Below standard"),
    ])
}

fn brick_compression() -> ModelDefinition {
    ModelDefinition::new("brick_compression", "Brick Compression Test", Suite::Civil)
        .summary("Compressive strength of a brick from the failure load and loaded area.")
        .formula("strength = max load (N) / (length x width) (mm^2)")
        .parameter(ParameterSpec::number("max_load_kn", "Maximum load", 1.0, 2_000.0, 100.0).with_unit("kN"))
        .parameter(ParameterSpec::number("length_mm", "Brick length", 100.0, 400.0, 190.0).with_unit("mm"))
        .parameter(ParameterSpec::number("width_mm", "Brick width", 50.0, 200.0, 90.0).with_unit("mm"))
        .output(
            OutputSpec::scalar("loaded_area", "Loaded area", |p, _| {
                Ok(p.number("length_mm")? * p.number("width_mm")?)
            })
            .with_unit("mm^2"),
        )
        .output(
            OutputSpec::scalar("strength", "Compressive strength", |p, s| {
                guarded_div("strength", p.number("max_load_kn")? * 1e3, s.get("loaded_area")?)
            })
            .with_unit("N/mm^2"),
        )
        .classify("grade", "strength", brick_grades())
        .interpret(|_, s| match s.get("strength") {
            Ok(strength) if strength >= 25.0 => {
                vec!["Suitable for load-bearing and high-rise construction.".to_string()]
            }
            Ok(strength) if strength >= 12.0 => vec!["Suitable for general building works.".to_string()],
            Ok(_) => vec!["Not recommended for structural work.".to_string()],
            Err(_) => Vec::new(),
        })
}

fn water_absorption() -> ModelDefinition {
    ModelDefinition::new("water_absorption", "Water Absorption Checker", Suite::Civil)
        .summary("Water absorbed by a brick or aggregate sample after 24 h immersion.")
        .formula("absorption % = (W2 - W1) / W1 x 100")
        .parameter(ParameterSpec::number("dry_weight", "Dry weight W1", 100.0, 10_000.0, 1_500.0).with_unit("g"))
        .parameter(ParameterSpec::number("wet_weight", "Wet weight W2", 100.0, 12_000.0, 1_620.0).with_unit("g"))
        .constraint(
            "wet_weight must be greater than dry_weight",
            &["dry_weight", "wet_weight"],
            |p| match (p.number("dry_weight"), p.number("wet_weight")) {
                (Ok(dry), Ok(wet)) => wet > dry,
                _ => false,
            },
        )
        .output(
            OutputSpec::scalar("absorption", "Water absorption", |p, _| {
                let dry = p.number("dry_weight")?;
                Ok(guarded_div("absorption", p.number("wet_weight")? - dry, dry)? * 100.0)
            })
            .with_unit("%"),
        )
        .classify(
            "suitability",
            "absorption",
            RuleSet::new(vec![
                Rule::at_most(20.0, "Within acceptable limits"),
                Rule::otherwise("Excessive absorption"),
            ]),
        )
}

fn flow_table() -> ModelDefinition {
    ModelDefinition::new("flow_table", "Flow Table Test", Suite::Civil)
        .summary("Spread of fresh mortar or concrete after 25 drops of the flow table.")
        .formula("flow % = (final diameter - initial diameter) / initial diameter x 100")
        .parameter(ParameterSpec::number("initial_diameter", "Initial diameter", 5.0, 50.0, 10.0).with_unit("cm"))
        .parameter(ParameterSpec::number("final_diameter", "Final diameter", 5.0, 60.0, 14.0).with_unit("cm"))
        .constraint(
            "final_diameter must not be smaller than initial_diameter",
            &["initial_diameter", "final_diameter"],
            |p| match (p.number("initial_diameter"), p.number("final_diameter")) {
                (Ok(initial), Ok(last)) => last >= initial,
                _ => false,
            },
        )
        .output(
            OutputSpec::scalar("flow", "Flow", |p, _| {
                let initial = p.number("initial_diameter")?;
                let spread = p.number("final_diameter")? - initial;
                Ok(guarded_div("flow", spread, initial)? * 100.0)
            })
            .with_unit("%"),
        )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MixType {
    Dry,
    Plastic,
    Flowing,
}

impl MixType {
    fn parse(value: &str) -> Result<Self, ComputationError> {
        match value {
            "dry" => Ok(Self::Dry),
            "plastic" => Ok(Self::Plastic),
            "flowing" => Ok(Self::Flowing),
            other => Err(unknown_choice("mix", other)),
        }
    }

    /// Slump gained per 0.01 of w/c above 0.3, mm.
    fn coefficient(self) -> f64 {
        match self {
            Self::Dry => 2.5,
            Self::Plastic => 4.2,
            Self::Flowing => 6.5,
        }
    }
}

fn slump_at(params: &ParameterSet, water_cement: f64) -> Result<f64, ComputationError> {
    let mix = MixType::parse(params.choice("mix")?)?;
    Ok((mix.coefficient() * (water_cement - 0.3) * 100.0).clamp(0.0, 250.0))
}

fn slump_test() -> ModelDefinition {
    ModelDefinition::new("slump_test", "Slump Test", Suite::Civil)
        .summary("Empirical slump of fresh concrete from mix type and water/cement ratio.")
        .formula("slump = clamp(k (w/c - 0.3) x 100, 0, 250)")
        .parameter(ParameterSpec::choice("mix", "Concrete mix", &["dry", "plastic", "flowing"], "dry"))
        .parameter(ParameterSpec::number("water_cement", "Water/cement ratio", 0.3, 0.7, 0.5))
        .output(
            OutputSpec::scalar("slump", "Slump", |p, _| slump_at(p, p.number("water_cement")?))
                .with_unit("mm"),
        )
        .output(
            OutputSpec::series(
                "slump_curve",
                "Slump vs water/cement ratio",
                SeriesSpec {
                    x_label: "Water/cement ratio",
                    x_unit: None,
                    resolution: 100,
                    domain: |_, _| Ok(Domain::new(0.3, 0.7)),
                    curve: |p, _, ratio| slump_at(p, ratio),
                },
            )
            .with_unit("mm"),
        )
        .classify(
            "workability",
            "slump",
            RuleSet::new(vec![
                Rule::below(25.0, "Very low workability"),
                Rule::at_most(75.0, "Low workability"),
                Rule::at_most(150.0, "Medium workability"),
                Rule::otherwise("High workability"),
            ]),
        )
}

fn bulking_factor(moisture: f64) -> f64 {
    1.0 + 0.2 * moisture * (-0.3 * moisture).exp()
}

fn sand_bulking() -> ModelDefinition {
    ModelDefinition::new("sand_bulking", "Sand Bulking Analyzer", Suite::Civil)
        .summary("Volume increase of sand caused by surface moisture films.")
        .formula("factor = 1 + 0.2 m e^(-0.3 m)")
        .parameter(ParameterSpec::number("moisture", "Moisture content", 0.0, 20.0, 5.0).with_unit("%"))
        .output(OutputSpec::scalar("bulking_factor", "Bulking factor", |p, _| {
            Ok(bulking_factor(p.number("moisture")?))
        }))
        .output(
            OutputSpec::scalar("bulking_percent", "Volume increase", |_, s| {
                Ok((s.get("bulking_factor")? - 1.0) * 100.0)
            })
            .with_unit("%"),
        )
        .output(
            OutputSpec::scalar("peak_moisture", "Moisture at peak bulking", |_, _| {
                guarded_div("peak_moisture", 1.0, 0.3)
            })
            .with_unit("%"),
        )
        .output(OutputSpec::series(
            "bulking_curve",
            "Bulking factor vs moisture",
            SeriesSpec {
                x_label: "Moisture content",
                x_unit: Some("%"),
                resolution: 100,
                domain: |_, _| Ok(Domain::new(0.0, 20.0)),
                curve: |_, _, moisture| Ok(bulking_factor(moisture)),
            },
        ))
        .classify(
            "batching",
            "bulking_percent",
            RuleSet::new(vec![
                Rule::at_least(15.0, "Adjust sand volume for bulking"),
                Rule::otherwise("Bulking negligible"),
            ]),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_mix_has_a_coefficient() {
        for (name, coefficient) in [("dry", 2.5), ("plastic", 4.2), ("flowing", 6.5)] {
            let mix = MixType::parse(name).expect("listed mix parses");
            assert_eq!(mix.coefficient(), coefficient);
        }
    }

    #[test]
    fn unlisted_mix_is_rejected() {
        let error = MixType::parse("self-compacting").expect_err("no coefficient");
        assert!(matches!(
            error,
            ComputationError::Undefined { ref quantity, .. } if quantity == "mix"
        ));
    }
}
