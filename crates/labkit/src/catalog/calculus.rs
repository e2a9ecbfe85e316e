use std::f64::consts::{LN_2, PI};

use crate::engine::evaluation::{
    guarded_div, guarded_ln, guarded_sqrt, ComputationError, Domain, ParameterSet, Rule, RuleSet,
    ScalarOutputs,
};
use crate::engine::model::{ModelDefinition, OutputSpec, ParameterSpec, SeriesSpec, Suite};

use super::unknown_choice;

const GRAVITY: f64 = 9.81;

pub(super) fn models() -> Vec<ModelDefinition> {
    vec![
        population_growth(),
        cost_minimizer(),
        concrete_cooling(),
        beam_deflection(),
        rocket_trajectory(),
        drug_dosage(),
        tank_filling(),
    ]
}

fn population_at(params: &ParameterSet, t: f64) -> Result<f64, ComputationError> {
    let r = params.number("r")?;
    let k = params.number("K")?;
    let p0 = params.number("P0")?;
    let spread = guarded_div("population", k - p0, p0)?;
    guarded_div("population", k, 1.0 + spread * (-r * t).exp())
}

fn population_growth() -> ModelDefinition {
    ModelDefinition::new("population_growth", "Population Growth", Suite::Calculus)
        .summary("Logistic growth of a population towards its carrying capacity.")
        .formula("P(t) = K / (1 + ((K - P0) / P0) e^(-r t))")
        .parameter(ParameterSpec::number("r", "Growth rate", 0.1, 2.0, 0.5).with_unit("1/time"))
        .parameter(ParameterSpec::number("K", "Carrying capacity", 500.0, 10_000.0, 5_000.0))
        .parameter(ParameterSpec::number("P0", "Initial population", 10.0, 1_000.0, 100.0))
        .parameter(ParameterSpec::number("T", "Time horizon", 10.0, 200.0, 100.0))
        .output(OutputSpec::scalar("final_population", "Population at T", |p, _| {
            population_at(p, p.number("T")?)
        }))
        .output(
            OutputSpec::scalar("half_capacity_time", "Time to reach K/2", |p, _| {
                let r = p.number("r")?;
                let k = p.number("K")?;
                let p0 = p.number("P0")?;
                if p0 >= k / 2.0 {
                    return Ok(0.0);
                }
                let ratio = guarded_div("half_capacity_time", k - p0, p0)?;
                Ok(guarded_ln("half_capacity_time", ratio)? / r)
            })
            .with_unit("time"),
        )
        .output(OutputSpec::series(
            "population",
            "Population P(t)",
            SeriesSpec {
                x_label: "Time",
                x_unit: None,
                resolution: 1000,
                domain: |p, _| Ok(Domain::new(0.0, p.number("T")?)),
                curve: |p, _, t| population_at(p, t),
            },
        ))
        .interpret(|p, s| {
            let k = p.number("K").unwrap_or_default();
            let r = p.number("r").unwrap_or_default();
            let mut notes = vec![format!(
                "Growth is exponential at first, then slows as the population approaches K = {k} (r = {r})."
            )];
            if let Ok(midpoint) = s.get("half_capacity_time") {
                if midpoint > 0.0 {
                    notes.push(format!("Growth is fastest around t = {midpoint:.2}, where P = K/2."));
                }
            }
            notes
        })
}

fn cost_minimizer() -> ModelDefinition {
    ModelDefinition::new("cost_minimizer", "Cost Minimizer", Suite::Calculus)
        .summary("Production quantity that minimises fixed, variable and setup cost.")
        .formula("C(q) = F + a q + b / q, q* = sqrt(b / a)")
        .parameter(ParameterSpec::number("F", "Fixed cost", 1_000.0, 100_000.0, 20_000.0))
        .parameter(ParameterSpec::number("a", "Variable cost per item", 0.0, 1_000.0, 100.0))
        .parameter(ParameterSpec::number("b", "Setup cost component", 100.0, 100_000.0, 50_000.0))
        .output(
            OutputSpec::scalar("optimal_quantity", "Optimal quantity q*", |p, _| {
                let ratio = guarded_div("optimal_quantity", p.number("b")?, p.number("a")?)?;
                guarded_sqrt("optimal_quantity", ratio)
            })
            .with_unit("units"),
        )
        .output(OutputSpec::scalar("min_cost", "Minimum total cost", |p, s| {
            let q = s.get("optimal_quantity")?;
            let setup = guarded_div("min_cost", p.number("b")?, q)?;
            Ok(p.number("F")? + p.number("a")? * q + setup)
        }))
        .output(OutputSpec::series(
            "total_cost",
            "Total cost C(q)",
            SeriesSpec {
                x_label: "Quantity",
                x_unit: Some("units"),
                resolution: 500,
                domain: |_, s| {
                    let q = s.get("optimal_quantity")?;
                    Ok(Domain::new((q - 50.0).max(1.0), q + 100.0))
                },
                curve: |p, _, q| {
                    let setup = guarded_div("total_cost", p.number("b")?, q)?;
                    Ok(p.number("F")? + p.number("a")? * q + setup)
                },
            },
        ))
}

fn cooling_temperature(params: &ParameterSet, t: f64) -> Result<f64, ComputationError> {
    let initial = params.number("T0")?;
    let ambient = params.number("T_env")?;
    let k = params.number("k")?;
    Ok(ambient + (initial - ambient) * (-k * t).exp())
}

fn concrete_cooling() -> ModelDefinition {
    ModelDefinition::new("concrete_cooling", "Concrete Cooling", Suite::Calculus)
        .summary("Newtonian cooling of freshly poured concrete towards ambient temperature.")
        .formula("T(t) = T_env + (T0 - T_env) e^(-k t)")
        .parameter(ParameterSpec::number("T0", "Initial concrete temperature", 40.0, 100.0, 70.0).with_unit("°C"))
        .parameter(ParameterSpec::number("T_env", "Ambient temperature", 10.0, 50.0, 30.0).with_unit("°C"))
        .parameter(ParameterSpec::number("k", "Cooling constant", 0.01, 1.0, 0.1).with_unit("1/h"))
        .parameter(ParameterSpec::number("hours", "Duration", 1.0, 72.0, 24.0).with_unit("h"))
        .output(
            OutputSpec::scalar("final_temperature", "Temperature at end", |p, _| {
                cooling_temperature(p, p.number("hours")?)
            })
            .with_unit("°C"),
        )
        .output(
            OutputSpec::scalar("temperature_drop", "Temperature drop", |p, s| {
                Ok(p.number("T0")? - s.get("final_temperature")?)
            })
            .with_unit("°C"),
        )
        .output(
            OutputSpec::scalar("cooling_half_life", "Half-difference time", |p, _| {
                guarded_div("cooling_half_life", LN_2, p.number("k")?)
            })
            .with_unit("h"),
        )
        .output(
            OutputSpec::series(
                "temperature",
                "Concrete temperature T(t)",
                SeriesSpec {
                    x_label: "Time",
                    x_unit: Some("h"),
                    resolution: 500,
                    domain: |p, _| Ok(Domain::new(0.0, p.number("hours")?)),
                    curve: |p, _, t| cooling_temperature(p, t),
                },
            )
            .with_unit("°C"),
        )
        .classify(
            "crack_risk",
            "temperature_drop",
            RuleSet::new(vec![
                Rule::at_least(20.0, "High thermal crack risk"),
                Rule::at_least(10.0, "Moderate thermal crack risk"),
                Rule::otherwise("Low thermal crack risk"),
            ]),
        )
}

/// Simply supported beam loading cases.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Loading {
    /// Point load at midspan, newtons.
    Point(f64),
    /// Uniformly distributed load, newtons per metre.
    Uniform(f64),
}

struct Beam {
    span: f64,
    rigidity: f64,
    loading: Loading,
}

impl Beam {
    fn from_params(params: &ParameterSet) -> Result<Self, ComputationError> {
        let span = params.number("L")?;
        let rigidity = params.number("E_gpa")? * 1e9 * params.number("I_cm4")? * 1e-8;
        let loading = match params.choice("load_type")? {
            "point_load" => Loading::Point(params.number("P_kn")? * 1e3),
            "udl" => Loading::Uniform(params.number("w_kn_m")? * 1e3),
            other => return Err(unknown_choice("load_type", other)),
        };
        Ok(Self {
            span,
            rigidity,
            loading,
        })
    }

    /// Downward deflection in metres at `x` from the left support.
    fn deflection(&self, x: f64) -> Result<f64, ComputationError> {
        let l = self.span;
        let numerator = match self.loading {
            Loading::Point(load) => {
                let x = x.min(l - x);
                load * x * (3.0 * l * l - 4.0 * x * x) / 48.0
            }
            Loading::Uniform(load) => load * x * (l.powi(3) - 2.0 * l * x * x + x.powi(3)) / 24.0,
        };
        guarded_div("deflection", numerator, self.rigidity)
    }

    fn max_deflection(&self) -> Result<f64, ComputationError> {
        let l = self.span;
        let numerator = match self.loading {
            Loading::Point(load) => load * l.powi(3) / 48.0,
            Loading::Uniform(load) => 5.0 * load * l.powi(4) / 384.0,
        };
        guarded_div("max_deflection", numerator, self.rigidity)
    }
}

fn beam_deflection() -> ModelDefinition {
    ModelDefinition::new("beam_deflection", "Beam Deflection", Suite::Calculus)
        .summary("Elastic deflection of a simply supported beam under a point load or UDL.")
        .formula("EI y'' = M(x); point: PL^3/48EI, UDL: 5wL^4/384EI")
        .parameter(ParameterSpec::number("L", "Beam length", 1.0, 20.0, 10.0).with_unit("m"))
        .parameter(ParameterSpec::number("E_gpa", "Modulus of elasticity", 1.0, 300.0, 200.0).with_unit("GPa"))
        .parameter(ParameterSpec::number("I_cm4", "Moment of inertia", 100.0, 50_000.0, 5_000.0).with_unit("cm^4"))
        .parameter(ParameterSpec::choice("load_type", "Loading type", &["point_load", "udl"], "point_load"))
        .parameter(ParameterSpec::number("P_kn", "Point load", 1.0, 100.0, 10.0).with_unit("kN"))
        .parameter(ParameterSpec::number("w_kn_m", "Uniform load", 1.0, 100.0, 10.0).with_unit("kN/m"))
        .output(
            OutputSpec::scalar("max_deflection_mm", "Maximum deflection", |p, _| {
                Ok(Beam::from_params(p)?.max_deflection()? * 1e3)
            })
            .with_unit("mm"),
        )
        .output(OutputSpec::scalar("span_ratio", "Span / deflection", |p, s| {
            let deflection_m = s.get("max_deflection_mm")? / 1e3;
            guarded_div("span_ratio", p.number("L")?, deflection_m)
        }))
        .output(
            OutputSpec::series(
                "deflection",
                "Deflection y(x)",
                SeriesSpec {
                    x_label: "Position along beam",
                    x_unit: Some("m"),
                    resolution: 1000,
                    domain: |p, _| Ok(Domain::new(0.0, p.number("L")?)),
                    curve: |p, _, x| Ok(Beam::from_params(p)?.deflection(x)? * 1e3),
                },
            )
            .with_unit("mm"),
        )
        .classify(
            "serviceability",
            "span_ratio",
            RuleSet::new(vec![
                Rule::at_least(360.0, "Within L/360 limit"),
                Rule::at_least(240.0, "Within L/240 limit"),
                Rule::otherwise("Exceeds L/240 limit"),
            ]),
        )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Grounded,
    Powered,
    Coasting,
    Landed,
}

/// Vertical launch: constant net thrust until burnout, then ballistic flight.
struct Flight {
    acceleration: f64,
    burn_time: f64,
}

impl Flight {
    fn from_params(params: &ParameterSet) -> Result<Self, ComputationError> {
        let thrust = params.number("thrust")?;
        let mass = params.number("mass")?;
        Ok(Self {
            acceleration: guarded_div("acceleration", thrust, mass)? - GRAVITY,
            burn_time: params.number("burn_time")?,
        })
    }

    fn lifts_off(&self) -> bool {
        self.acceleration > 0.0
    }

    fn burnout_velocity(&self) -> f64 {
        if self.lifts_off() {
            self.acceleration * self.burn_time
        } else {
            0.0
        }
    }

    fn burnout_altitude(&self) -> f64 {
        if self.lifts_off() {
            0.5 * self.acceleration * self.burn_time * self.burn_time
        } else {
            0.0
        }
    }

    fn apex_time(&self) -> f64 {
        if self.lifts_off() {
            self.burn_time + self.burnout_velocity() / GRAVITY
        } else {
            0.0
        }
    }

    fn max_height(&self) -> f64 {
        let velocity = self.burnout_velocity();
        self.burnout_altitude() + velocity * velocity / (2.0 * GRAVITY)
    }

    fn touchdown_time(&self) -> f64 {
        if self.lifts_off() {
            self.apex_time() + (2.0 * self.max_height() / GRAVITY).sqrt()
        } else {
            0.0
        }
    }

    /// Phase, height and velocity at time `t`.
    fn state(&self, t: f64) -> (Phase, f64, f64) {
        if !self.lifts_off() {
            return (Phase::Grounded, 0.0, 0.0);
        }
        if t <= self.burn_time {
            return (
                Phase::Powered,
                0.5 * self.acceleration * t * t,
                self.acceleration * t,
            );
        }
        if t >= self.touchdown_time() {
            return (Phase::Landed, 0.0, 0.0);
        }

        let coast = t - self.burn_time;
        let height = self.burnout_altitude() + self.burnout_velocity() * coast
            - 0.5 * GRAVITY * coast * coast;
        let velocity = self.burnout_velocity() - GRAVITY * coast;
        (Phase::Coasting, height.max(0.0), velocity)
    }
}

fn rocket_trajectory() -> ModelDefinition {
    ModelDefinition::new("rocket_trajectory", "Rocket Trajectory", Suite::Calculus)
        .summary("Vertical launch under constant thrust followed by free flight under gravity.")
        .formula("a = (F - m g) / m while burning, a = -g after burnout")
        .parameter(ParameterSpec::number("mass", "Rocket mass", 100.0, 5_000.0, 1_000.0).with_unit("kg"))
        .parameter(ParameterSpec::number("thrust", "Thrust force", 1_000.0, 100_000.0, 30_000.0).with_unit("N"))
        .parameter(ParameterSpec::number("burn_time", "Engine burn time", 1.0, 120.0, 30.0).with_unit("s"))
        .parameter(ParameterSpec::number("total_time", "Simulation time", 6.0, 200.0, 60.0).with_unit("s"))
        .constraint(
            "total_time must exceed burn_time by at least 5 s",
            &["burn_time", "total_time"],
            |p| match (p.number("burn_time"), p.number("total_time")) {
                (Ok(burn), Ok(total)) => total >= burn + 5.0,
                _ => false,
            },
        )
        .output(
            OutputSpec::scalar("burnout_velocity", "Velocity at engine cutoff", |p, _| {
                Ok(Flight::from_params(p)?.burnout_velocity())
            })
            .with_unit("m/s"),
        )
        .output(
            OutputSpec::scalar("burnout_altitude", "Altitude at engine cutoff", |p, _| {
                Ok(Flight::from_params(p)?.burnout_altitude())
            })
            .with_unit("m"),
        )
        .output(
            OutputSpec::scalar("max_height", "Maximum height", |p, _| {
                Ok(Flight::from_params(p)?.max_height())
            })
            .with_unit("m"),
        )
        .output(
            OutputSpec::scalar("apex_time", "Time of apex", |p, _| {
                Ok(Flight::from_params(p)?.apex_time())
            })
            .with_unit("s"),
        )
        .output(
            OutputSpec::scalar("flight_time", "Time of touchdown", |p, _| {
                Ok(Flight::from_params(p)?.touchdown_time())
            })
            .with_unit("s"),
        )
        .output(
            OutputSpec::series(
                "height",
                "Height s(t)",
                SeriesSpec {
                    x_label: "Time",
                    x_unit: Some("s"),
                    resolution: 1000,
                    domain: |p, _| Ok(Domain::new(0.0, p.number("total_time")?)),
                    curve: |p, _, t| Ok(Flight::from_params(p)?.state(t).1),
                },
            )
            .with_unit("m"),
        )
        .output(
            OutputSpec::series(
                "velocity",
                "Velocity v(t)",
                SeriesSpec {
                    x_label: "Time",
                    x_unit: Some("s"),
                    resolution: 1000,
                    domain: |p, _| Ok(Domain::new(0.0, p.number("total_time")?)),
                    curve: |p, _, t| Ok(Flight::from_params(p)?.state(t).2),
                },
            )
            .with_unit("m/s"),
        )
        .interpret(|p, s| {
            let Ok(flight) = Flight::from_params(p) else {
                return Vec::new();
            };
            let total = p.number("total_time").unwrap_or_default();
            match flight.state(total).0 {
                Phase::Grounded => vec![
                    "Thrust does not exceed weight; the rocket never leaves the pad.".to_string(),
                ],
                phase => {
                    let apex = s.get("apex_time").unwrap_or_default();
                    let mut notes = vec![format!(
                        "Gravity takes over after engine cutoff; the apex is reached at t = {apex:.1} s."
                    )];
                    match phase {
                        Phase::Landed => notes.push("The rocket lands within the simulated window.".to_string()),
                        Phase::Powered => notes.push("The engine is still burning at the end of the window.".to_string()),
                        Phase::Grounded | Phase::Coasting => {}
                    }
                    notes
                }
            }
        })
}

/// Fixed-interval repeated dosing with first-order elimination.
struct Regimen {
    dose: f64,
    elimination: f64,
    interval: f64,
    doses: usize,
}

impl Regimen {
    fn from_params(params: &ParameterSet) -> Result<Self, ComputationError> {
        let duration = params.number("duration_h")?;
        let interval = params.number("dose_interval_h")?;
        let doses = guarded_div("dose_count", duration, interval)?.ceil().max(1.0) as usize;
        Ok(Self {
            dose: params.number("dose_mg")?,
            elimination: params.number("elimination_rate")?,
            interval,
            doses,
        })
    }

    /// Concentration at `t` counting only the first `given` doses.
    fn level(&self, t: f64, given: usize) -> f64 {
        (0..given.min(self.doses))
            .map(|index| {
                let elapsed = t - index as f64 * self.interval;
                self.dose * (-self.elimination * elapsed).exp()
            })
            .sum()
    }

    fn concentration(&self, t: f64) -> f64 {
        let given = (t / self.interval).floor() as usize + 1;
        self.level(t, given)
    }

    fn peak(&self) -> f64 {
        self.concentration((self.doses - 1) as f64 * self.interval)
    }

    /// Lowest level over `[0, end]`: just before each repeat dose, or at the end.
    fn trough(&self, end: f64) -> f64 {
        (1..self.doses)
            .map(|index| self.level(index as f64 * self.interval, index))
            .fold(self.concentration(end), f64::min)
    }
}

fn drug_dosage() -> ModelDefinition {
    ModelDefinition::new("drug_dosage", "Drug Dosage Optimizer", Suite::Calculus)
        .summary("Blood concentration under repeated dosing with exponential elimination.")
        .formula("C(t) = sum over doses of C0 e^(-k (t - t_dose))")
        .parameter(ParameterSpec::number("dose_mg", "Dose per administration", 50.0, 1_000.0, 300.0).with_unit("mg"))
        .parameter(ParameterSpec::number("elimination_rate", "Elimination rate constant", 0.01, 1.0, 0.15).with_unit("1/h"))
        .parameter(ParameterSpec::number("duration_h", "Duration", 6.0, 72.0, 24.0).with_unit("h"))
        .parameter(ParameterSpec::number("dose_interval_h", "Dose interval", 2.0, 24.0, 8.0).with_unit("h"))
        .parameter(ParameterSpec::number("therapeutic_min", "Minimum therapeutic level", 0.0, 1_000.0, 50.0).with_unit("mg"))
        .parameter(ParameterSpec::number("therapeutic_max", "Maximum safe level", 1.0, 5_000.0, 500.0).with_unit("mg"))
        .constraint(
            "therapeutic_min must be below therapeutic_max",
            &["therapeutic_min", "therapeutic_max"],
            |p| match (p.number("therapeutic_min"), p.number("therapeutic_max")) {
                (Ok(low), Ok(high)) => low < high,
                _ => false,
            },
        )
        .output(OutputSpec::scalar("dose_count", "Doses administered", |p, _| {
            Ok(Regimen::from_params(p)?.doses as f64)
        }))
        .output(
            OutputSpec::scalar("peak_concentration", "Peak concentration", |p, _| {
                Ok(Regimen::from_params(p)?.peak())
            })
            .with_unit("mg"),
        )
        .output(
            OutputSpec::scalar("trough_concentration", "Lowest concentration", |p, _| {
                Ok(Regimen::from_params(p)?.trough(p.number("duration_h")?))
            })
            .with_unit("mg"),
        )
        .output(
            OutputSpec::scalar("window_margin", "Margin inside therapeutic window", |p, s| {
                let low = s.get("trough_concentration")? - p.number("therapeutic_min")?;
                let high = p.number("therapeutic_max")? - s.get("peak_concentration")?;
                Ok(low.min(high))
            })
            .with_unit("mg"),
        )
        .output(
            OutputSpec::series(
                "concentration",
                "Drug concentration C(t)",
                SeriesSpec {
                    x_label: "Time",
                    x_unit: Some("h"),
                    resolution: 1000,
                    domain: |p, _| Ok(Domain::new(0.0, p.number("duration_h")?)),
                    curve: |p, _, t| Ok(Regimen::from_params(p)?.concentration(t)),
                },
            )
            .with_unit("mg"),
        )
        .classify(
            "therapeutic_window",
            "window_margin",
            RuleSet::new(vec![
                Rule::at_least(0.0, "Within therapeutic window"),
                Rule::otherwise("Outside therapeutic window"),
            ]),
        )
        .interpret(|p, s| {
            let mut notes = Vec::new();
            if let (Ok(trough), Ok(low)) = (s.get("trough_concentration"), p.number("therapeutic_min")) {
                if trough < low {
                    notes.push("Level falls below the therapeutic minimum; shorten the dose interval.".to_string());
                }
            }
            if let (Ok(peak), Ok(high)) = (s.get("peak_concentration"), p.number("therapeutic_max")) {
                if peak > high {
                    notes.push("Level exceeds the safe maximum; lower the dose.".to_string());
                }
            }
            notes
        })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum InflowPattern {
    Constant,
    Increasing,
    Fluctuating,
    Sinusoidal {
        base: f64,
        amplitude: f64,
        frequency: f64,
        duration: f64,
    },
}

impl InflowPattern {
    fn from_params(params: &ParameterSet) -> Result<Self, ComputationError> {
        Ok(match params.choice("pattern")? {
            "constant" => Self::Constant,
            "increasing" => Self::Increasing,
            "fluctuating" => Self::Fluctuating,
            "sinusoidal" => Self::Sinusoidal {
                base: params.number("base_rate")?,
                amplitude: params.number("amplitude")?,
                frequency: params.number("frequency")?,
                duration: params.number("duration_h")?,
            },
            other => return Err(unknown_choice("pattern", other)),
        })
    }

    /// Inflow rate Q(t), m^3/h.
    fn rate(&self, t: f64) -> f64 {
        match *self {
            Self::Constant => 10.0,
            Self::Increasing => 2.0 + 0.8 * t,
            Self::Fluctuating => 10.0 + 3.0 * (2.0 * PI * t / 6.0).sin(),
            Self::Sinusoidal {
                base,
                amplitude,
                frequency,
                duration,
            } => base + amplitude * (2.0 * PI * frequency * t / duration).sin(),
        }
    }

    /// Closed-form integral of the rate from 0 to `t`.
    fn volume(&self, t: f64) -> f64 {
        match *self {
            Self::Constant => 10.0 * t,
            Self::Increasing => 2.0 * t + 0.4 * t * t,
            Self::Fluctuating => {
                let omega = 2.0 * PI / 6.0;
                10.0 * t + 3.0 / omega * (1.0 - (omega * t).cos())
            }
            Self::Sinusoidal {
                base,
                amplitude,
                frequency,
                duration,
            } => {
                let omega = 2.0 * PI * frequency / duration;
                base * t + amplitude / omega * (1.0 - (omega * t).cos())
            }
        }
    }
}

fn tank_filling() -> ModelDefinition {
    ModelDefinition::new("tank_filling", "Water Tank Filling", Suite::Calculus)
        .summary("Water level in a prismatic tank fed by a time-varying inflow.")
        .formula("V(t) = integral of Q(t) dt, h(t) = V(t) / A")
        .parameter(ParameterSpec::number("area_m2", "Tank area", 1.0, 200.0, 50.0).with_unit("m^2"))
        .parameter(ParameterSpec::number("duration_h", "Duration", 1.0, 48.0, 12.0).with_unit("h"))
        .parameter(ParameterSpec::choice(
            "pattern",
            "Inflow pattern",
            &["constant", "increasing", "fluctuating", "sinusoidal"],
            "constant",
        ))
        .parameter(ParameterSpec::number("amplitude", "Sinusoidal amplitude", 0.0, 20.0, 5.0).with_unit("m^3/h"))
        .parameter(ParameterSpec::number("base_rate", "Sinusoidal base rate", 0.0, 50.0, 15.0).with_unit("m^3/h"))
        .parameter(ParameterSpec::number("frequency", "Cycles over the duration", 1.0, 10.0, 2.0))
        .output(
            OutputSpec::scalar("final_volume", "Volume accumulated", |p, _| {
                Ok(InflowPattern::from_params(p)?.volume(p.number("duration_h")?))
            })
            .with_unit("m^3"),
        )
        .output(
            OutputSpec::scalar("final_level", "Final water level", |p, s| {
                guarded_div("final_level", s.get("final_volume")?, p.number("area_m2")?)
            })
            .with_unit("m"),
        )
        .output(
            OutputSpec::scalar("mean_inflow", "Mean inflow rate", |p, s| {
                guarded_div("mean_inflow", s.get("final_volume")?, p.number("duration_h")?)
            })
            .with_unit("m^3/h"),
        )
        .output(
            OutputSpec::series(
                "inflow",
                "Inflow rate Q(t)",
                SeriesSpec {
                    x_label: "Time",
                    x_unit: Some("h"),
                    resolution: 500,
                    domain: |p, _| Ok(Domain::new(0.0, p.number("duration_h")?)),
                    curve: |p, _, t| Ok(InflowPattern::from_params(p)?.rate(t)),
                },
            )
            .with_unit("m^3/h"),
        )
        .output(
            OutputSpec::series(
                "level",
                "Water height h(t)",
                SeriesSpec {
                    x_label: "Time",
                    x_unit: Some("h"),
                    resolution: 500,
                    domain: |p, _| Ok(Domain::new(0.0, p.number("duration_h")?)),
                    curve: |p, _, t| {
                        let volume = InflowPattern::from_params(p)?.volume(t);
                        guarded_div("level", volume, p.number("area_m2")?)
                    },
                },
            )
            .with_unit("m"),
        )
}
