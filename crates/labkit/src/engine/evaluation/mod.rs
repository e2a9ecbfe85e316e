mod numeric;
pub mod rules;
mod validation;

pub use numeric::{guarded_div, guarded_ln, guarded_sqrt, linspace, Domain};
pub use rules::{classify, Predicate, Rule, RuleSet, RuleSetProblem};
pub use validation::{ParameterViolation, ValidationError, ViolationKind};

pub(crate) use validation::check_value;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::model::{ModelDefinition, OutputKind, OutputSpec, ParamValue, ParameterBag, SeriesSpec};

/// A declared formula could not produce a finite result for valid inputs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComputationError {
    #[error("division by zero while computing {quantity}")]
    DivisionByZero { quantity: String },
    #[error("{output} is not a finite number")]
    NonFinite { output: String },
    #[error("{output} is not finite at x = {x}")]
    NonFiniteSample { output: String, x: f64 },
    #[error("{output} has an empty sampling domain [{start}, {end}]")]
    EmptyDomain { output: String, start: f64, end: f64 },
    #[error("{quantity} is undefined: {reason}")]
    Undefined { quantity: String, reason: String },
    #[error("input '{name}' is not available as {expected}")]
    MissingInput { name: String, expected: &'static str },
}

/// Either half of the evaluator's failure taxonomy.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Computation(#[from] ComputationError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedParameter {
    pub name: String,
    pub value: ParamValue,
    pub defaulted: bool,
}

/// Validated inputs in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: Vec<ResolvedParameter>,
}

impl ParameterSet {
    pub fn new(values: Vec<ResolvedParameter>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values
            .iter()
            .find(|parameter| parameter.name == name)
            .map(|parameter| &parameter.value)
    }

    pub fn number(&self, name: &str) -> Result<f64, ComputationError> {
        match self.get(name) {
            Some(ParamValue::Number(value)) => Ok(*value),
            _ => Err(ComputationError::MissingInput {
                name: name.to_string(),
                expected: "number",
            }),
        }
    }

    pub fn choice(&self, name: &str) -> Result<&str, ComputationError> {
        match self.get(name) {
            Some(ParamValue::Text(value)) => Ok(value.as_str()),
            _ => Err(ComputationError::MissingInput {
                name: name.to_string(),
                expected: "choice",
            }),
        }
    }

    pub fn flag(&self, name: &str) -> Result<bool, ComputationError> {
        match self.get(name) {
            Some(ParamValue::Flag(value)) => Ok(*value),
            _ => Err(ComputationError::MissingInput {
                name: name.to_string(),
                expected: "flag",
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedParameter> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarOutput {
    pub name: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub value: f64,
}

/// Scalars computed so far, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScalarOutputs {
    values: Vec<ScalarOutput>,
}

impl ScalarOutputs {
    pub fn get(&self, name: &str) -> Result<f64, ComputationError> {
        self.values
            .iter()
            .find(|scalar| scalar.name == name)
            .map(|scalar| scalar.value)
            .ok_or_else(|| ComputationError::MissingInput {
                name: name.to_string(),
                expected: "scalar output",
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScalarOutput> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn push(&mut self, scalar: ScalarOutput) {
        self.values.push(scalar);
    }
}

/// Sampled curve: `x` strictly increasing, `x.len() == y.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub label: String,
    pub x_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_unit: Option<String>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Series {
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn max(&self) -> Option<f64> {
        self.y.iter().copied().reduce(f64::max)
    }

    pub fn min(&self) -> Option<f64> {
        self.y.iter().copied().reduce(f64::min)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationLabel {
    pub name: String,
    pub source: String,
    pub value: f64,
    pub label: String,
}

/// Immutable output of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub module_name: String,
    pub inputs: ParameterSet,
    pub scalars: ScalarOutputs,
    pub series: Vec<Series>,
    pub classifications: Vec<ClassificationLabel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl EvaluationResult {
    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.scalars.get(name).ok()
    }

    pub fn series(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|series| series.name == name)
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.classifications
            .iter()
            .find(|classification| classification.name == name)
            .map(|classification| classification.label.as_str())
    }
}

/// Validate `raw` against the model schema and compute every declared output.
pub fn evaluate(model: &ModelDefinition, raw: &ParameterBag) -> Result<EvaluationResult, EvaluationError> {
    let inputs = validation::resolve(model, raw)?;

    let mut scalars = ScalarOutputs::default();
    let mut series = Vec::new();

    for output in &model.outputs {
        match &output.kind {
            OutputKind::Scalar(formula) => {
                let value = formula(&inputs, &scalars)?;
                if !value.is_finite() {
                    return Err(ComputationError::NonFinite {
                        output: output.name.to_string(),
                    }
                    .into());
                }
                scalars.push(ScalarOutput {
                    name: output.name.to_string(),
                    label: output.label.to_string(),
                    unit: output.unit.map(str::to_string),
                    value,
                });
            }
            OutputKind::Series(spec) => {
                series.push(sample(output, spec, &inputs, &scalars)?);
            }
        }
    }

    let mut classifications = Vec::with_capacity(model.classifications.len());
    for spec in &model.classifications {
        let value = scalars.get(spec.source)?;
        classifications.push(ClassificationLabel {
            name: spec.name.to_string(),
            source: spec.source.to_string(),
            value,
            label: classify(value, &spec.rules).to_string(),
        });
    }

    let notes = model
        .interpretation
        .map(|interpret| interpret(&inputs, &scalars))
        .unwrap_or_default();

    debug!(
        module = model.name,
        scalars = scalars.len(),
        series = series.len(),
        "model evaluated"
    );

    Ok(EvaluationResult {
        module_name: model.name.to_string(),
        inputs,
        scalars,
        series,
        classifications,
        notes,
        timestamp: Utc::now(),
    })
}

fn sample(
    output: &OutputSpec,
    spec: &SeriesSpec,
    inputs: &ParameterSet,
    scalars: &ScalarOutputs,
) -> Result<Series, ComputationError> {
    let domain = (spec.domain)(inputs, scalars)?;
    if !domain.is_sampleable() {
        return Err(ComputationError::EmptyDomain {
            output: output.name.to_string(),
            start: domain.start,
            end: domain.end,
        });
    }

    let x = linspace(domain, spec.resolution);
    let y = x
        .iter()
        .map(|&position| {
            let value = (spec.curve)(inputs, scalars, position)?;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(ComputationError::NonFiniteSample {
                    output: output.name.to_string(),
                    x: position,
                })
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Series {
        name: output.name.to_string(),
        label: output.label.to_string(),
        x_label: spec.x_label.to_string(),
        x_unit: spec.x_unit.map(str::to_string),
        y_unit: output.unit.map(str::to_string),
        x,
        y,
    })
}
