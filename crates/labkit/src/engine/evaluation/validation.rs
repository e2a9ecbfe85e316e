use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::super::model::{ModelDefinition, ParamKind, ParamValue, ParameterBag, ParameterSpec};
use super::{ParameterSet, ResolvedParameter};

/// Why a supplied value was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    OutOfRange { value: f64, min: f64, max: f64 },
    NotFinite,
    WrongKind { expected: String, found: String },
    NotAllowed { value: String, allowed: Vec<String> },
    Constraint { description: String },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::OutOfRange { value, min, max } => {
                write!(f, "{value} is outside [{min}, {max}]")
            }
            ViolationKind::NotFinite => f.write_str("value must be a finite number"),
            ViolationKind::WrongKind { expected, found } => {
                write!(f, "expected a {expected}, found a {found}")
            }
            ViolationKind::NotAllowed { value, allowed } => {
                write!(f, "'{value}' is not one of: {}", allowed.join(", "))
            }
            ViolationKind::Constraint { description } => f.write_str(description),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterViolation {
    pub parameter: String,
    pub problem: ViolationKind,
}

impl fmt::Display for ParameterViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.parameter, self.problem)
    }
}

/// Every problem found in one parameter bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("invalid parameters for '{module}': {}", join_violations(.violations))]
pub struct ValidationError {
    pub module: String,
    pub violations: Vec<ParameterViolation>,
}

impl ValidationError {
    pub fn involves(&self, parameter: &str) -> bool {
        self.violations
            .iter()
            .any(|violation| violation.parameter.split(',').any(|name| name == parameter))
    }
}

fn join_violations(violations: &[ParameterViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check one value against its declared kind. Never clamps.
pub(crate) fn check_value(spec: &ParameterSpec, value: &ParamValue) -> Result<ParamValue, ViolationKind> {
    match (&spec.kind, value) {
        (ParamKind::Number { min, max }, ParamValue::Number(number)) => {
            if !number.is_finite() {
                Err(ViolationKind::NotFinite)
            } else if number < min || number > max {
                Err(ViolationKind::OutOfRange {
                    value: *number,
                    min: *min,
                    max: *max,
                })
            } else {
                Ok(value.clone())
            }
        }
        (ParamKind::Choice { allowed }, ParamValue::Text(text)) => {
            if allowed.iter().any(|option| *option == text.as_str()) {
                Ok(value.clone())
            } else {
                Err(ViolationKind::NotAllowed {
                    value: text.clone(),
                    allowed: allowed.iter().map(|option| option.to_string()).collect(),
                })
            }
        }
        (ParamKind::Flag, ParamValue::Flag(_)) => Ok(value.clone()),
        (kind, other) => Err(ViolationKind::WrongKind {
            expected: kind.label().to_string(),
            found: other.kind_label().to_string(),
        }),
    }
}

/// Resolve a raw bag against the model schema, collecting every violation.
///
/// Missing keys take the declared default; unknown keys are ignored.
pub(crate) fn resolve(model: &ModelDefinition, raw: &ParameterBag) -> Result<ParameterSet, ValidationError> {
    let mut violations = Vec::new();
    let mut rejected = BTreeSet::new();
    let mut resolved = Vec::with_capacity(model.parameters.len());

    for spec in &model.parameters {
        match raw.get(spec.name) {
            None => resolved.push(ResolvedParameter {
                name: spec.name.to_string(),
                value: spec.default.clone(),
                defaulted: true,
            }),
            Some(value) => match check_value(spec, value) {
                Ok(value) => resolved.push(ResolvedParameter {
                    name: spec.name.to_string(),
                    value,
                    defaulted: false,
                }),
                Err(problem) => {
                    rejected.insert(spec.name);
                    violations.push(ParameterViolation {
                        parameter: spec.name.to_string(),
                        problem,
                    });
                    // Keep the set complete so independent constraints can still run.
                    resolved.push(ResolvedParameter {
                        name: spec.name.to_string(),
                        value: spec.default.clone(),
                        defaulted: true,
                    });
                }
            },
        }
    }

    let parameters = ParameterSet::new(resolved);

    for check in &model.constraints {
        if check.involves.iter().any(|name| rejected.contains(name)) {
            continue;
        }
        if !(check.holds)(&parameters) {
            violations.push(ParameterViolation {
                parameter: check.involves.join(","),
                problem: ViolationKind::Constraint {
                    description: check.description.to_string(),
                },
            });
        }
    }

    if violations.is_empty() {
        Ok(parameters)
    } else {
        Err(ValidationError {
            module: model.name.to_string(),
            violations,
        })
    }
}
