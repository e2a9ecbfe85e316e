use crate::engine::evaluation::{guarded_div, ComputationError, Domain, ParameterSet, Rule, RuleSet};
use crate::engine::model::{ModelDefinition, OutputSpec, ParameterSpec, SeriesSpec, Suite};

use super::unknown_choice;

pub(super) fn models() -> Vec<ModelDefinition> {
    vec![rc_circuit(), ohms_law()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RcMode {
    Charging,
    Discharging,
}

impl RcMode {
    fn parse(value: &str) -> Result<Self, ComputationError> {
        match value {
            "charging" => Ok(Self::Charging),
            "discharging" => Ok(Self::Discharging),
            other => Err(unknown_choice("mode", other)),
        }
    }
}

fn capacitor_voltage(params: &ParameterSet, tau_ms: f64, t_ms: f64) -> Result<f64, ComputationError> {
    let supply = params.number("supply_voltage")?;
    let decay = (-guarded_div("capacitor_voltage", t_ms, tau_ms)?).exp();
    Ok(match RcMode::parse(params.choice("mode")?)? {
        RcMode::Charging => supply * (1.0 - decay),
        RcMode::Discharging => supply * decay,
    })
}

fn rc_circuit() -> ModelDefinition {
    ModelDefinition::new("rc_circuit", "RC Circuit Simulator", Suite::Electronics)
        .summary("Capacitor voltage while charging from or discharging into a resistor.")
        .formula("charging: V0 (1 - e^(-t/RC)), discharging: V0 e^(-t/RC)")
        .parameter(ParameterSpec::choice("mode", "Mode", &["charging", "discharging"], "charging"))
        .parameter(ParameterSpec::number("supply_voltage", "Supply voltage", 1.0, 50.0, 10.0).with_unit("V"))
        .parameter(ParameterSpec::number("resistance_kohm", "Resistance", 1.0, 100.0, 10.0).with_unit("kOhm"))
        .parameter(ParameterSpec::number("capacitance_uf", "Capacitance", 1.0, 1_000.0, 100.0).with_unit("uF"))
        .parameter(ParameterSpec::number("duration_ms", "Duration", 10.0, 5_000.0, 1_000.0).with_unit("ms"))
        .output(
            OutputSpec::scalar("tau", "Time constant RC", |p, _| {
                Ok(p.number("resistance_kohm")? * 1e3 * p.number("capacitance_uf")? * 1e-6)
            })
            .with_unit("s"),
        )
        .output(OutputSpec::scalar("time_constants", "Duration in time constants", |p, s| {
            guarded_div("time_constants", p.number("duration_ms")?, s.get("tau")? * 1e3)
        }))
        .output(
            OutputSpec::scalar("final_voltage", "Voltage at end", |p, s| {
                capacitor_voltage(p, s.get("tau")? * 1e3, p.number("duration_ms")?)
            })
            .with_unit("V"),
        )
        .output(
            OutputSpec::series(
                "voltage",
                "Capacitor voltage V(t)",
                SeriesSpec {
                    x_label: "Time",
                    x_unit: Some("ms"),
                    resolution: 500,
                    domain: |p, _| Ok(Domain::new(0.0, p.number("duration_ms")?)),
                    curve: |p, s, t| capacitor_voltage(p, s.get("tau")? * 1e3, t),
                },
            )
            .with_unit("V"),
        )
        .classify(
            "settling",
            "time_constants",
            RuleSet::new(vec![
                Rule::at_least(5.0, "Settled (5 tau or more)"),
                Rule::otherwise("Still in transient"),
            ]),
        )
}

fn ohms_law() -> ModelDefinition {
    ModelDefinition::new("ohms_law", "Ohm's Law Calculator", Suite::Electronics)
        .summary("Current and dissipated power for a resistor across a voltage.")
        .formula("I = V / R, P = V I")
        .parameter(ParameterSpec::number("voltage", "Voltage", 0.1, 1_000.0, 12.0).with_unit("V"))
        .parameter(ParameterSpec::number("resistance", "Resistance", 0.1, 1e6, 100.0).with_unit("Ohm"))
        .output(
            OutputSpec::scalar("current", "Current", |p, _| {
                guarded_div("current", p.number("voltage")?, p.number("resistance")?)
            })
            .with_unit("A"),
        )
        .output(
            OutputSpec::scalar("power", "Power dissipated", |p, s| {
                Ok(p.number("voltage")? * s.get("current")?)
            })
            .with_unit("W"),
        )
        .output(
            OutputSpec::series(
                "iv_curve",
                "Current vs voltage",
                SeriesSpec {
                    x_label: "Voltage",
                    x_unit: Some("V"),
                    resolution: 100,
                    domain: |p, _| Ok(Domain::new(0.0, 2.0 * p.number("voltage")?)),
                    curve: |p, _, v| guarded_div("iv_curve", v, p.number("resistance")?),
                },
            )
            .with_unit("A"),
        )
        .classify(
            "resistor_rating",
            "power",
            RuleSet::new(vec![
                Rule::at_most(0.25, "1/4 W resistor"),
                Rule::at_most(0.5, "1/2 W resistor"),
                Rule::at_most(1.0, "1 W resistor"),
                Rule::otherwise("Power resistor required"),
            ]),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::evaluation::ResolvedParameter;
    use crate::engine::model::ParamValue;

    fn inputs(mode: &str) -> ParameterSet {
        ParameterSet::new(vec![
            ResolvedParameter {
                name: "mode".to_string(),
                value: ParamValue::Text(mode.to_string()),
                defaulted: false,
            },
            ResolvedParameter {
                name: "supply_voltage".to_string(),
                value: ParamValue::Number(10.0),
                defaulted: false,
            },
        ])
    }

    #[test]
    fn charging_and_discharging_mirror_each_other() {
        let charged = capacitor_voltage(&inputs("charging"), 1.0, 1.0).expect("charging");
        let discharged = capacitor_voltage(&inputs("discharging"), 1.0, 1.0).expect("discharging");
        assert!((charged + discharged - 10.0).abs() < 1e-12);
        assert!((discharged - 10.0 * (-1.0_f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn unlisted_mode_has_no_curve() {
        let error = capacitor_voltage(&inputs("bogus"), 1.0, 1.0).expect_err("no formula for bogus");
        assert!(matches!(
            error,
            ComputationError::Undefined { ref quantity, .. } if quantity == "mode"
        ));
    }
}
