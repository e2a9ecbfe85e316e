use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::evaluation::rules::RuleSet;
use super::evaluation::{ComputationError, Domain, ParameterSet, ScalarOutputs};

/// Lab suite a model belongs to, used for grouping in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suite {
    Calculus,
    Civil,
    Electronics,
    Optics,
    Programming,
}

impl Suite {
    pub const ALL: [Suite; 5] = [
        Suite::Calculus,
        Suite::Civil,
        Suite::Electronics,
        Suite::Optics,
        Suite::Programming,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Suite::Calculus => "Calculus Tools",
            Suite::Civil => "Civil Lab",
            Suite::Electronics => "Electronics Lab",
            Suite::Optics => "Optics & Modern Physics",
            Suite::Programming => "Programming Tools",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "calculus" => Some(Suite::Calculus),
            "civil" => Some(Suite::Civil),
            "electronics" => Some(Suite::Electronics),
            "optics" => Some(Suite::Optics),
            "programming" => Some(Suite::Programming),
            _ => None,
        }
    }
}

/// Raw or resolved parameter value.
///
/// Deserializes untagged so JSON payloads can carry plain numbers, booleans
/// and strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl ParamValue {
    /// Interpret a loosely typed command-line token.
    pub fn parse_loose(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed {
            "true" => ParamValue::Flag(true),
            "false" => ParamValue::Flag(false),
            _ => match trimmed.parse::<f64>() {
                Ok(number) => ParamValue::Number(number),
                Err(_) => ParamValue::Text(trimmed.to_string()),
            },
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            ParamValue::Flag(_) => "flag",
            ParamValue::Number(_) => "number",
            ParamValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Flag(value) => write!(f, "{value}"),
            ParamValue::Number(value) => write!(f, "{value}"),
            ParamValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Flag(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// Untrusted name/value pairs supplied for one evaluation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterBag(BTreeMap<String, ParamValue>);

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>> FromIterator<(K, ParamValue)> for ParameterBag {
    fn from_iter<I: IntoIterator<Item = (K, ParamValue)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }
}

/// Declared kind and constraints of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamKind {
    Number { min: f64, max: f64 },
    Choice { allowed: Vec<&'static str> },
    Flag,
}

impl ParamKind {
    pub fn label(&self) -> &'static str {
        match self {
            ParamKind::Number { .. } => "number",
            ParamKind::Choice { .. } => "choice",
            ParamKind::Flag => "flag",
        }
    }
}

/// One entry of a model's parameter schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    #[serde(flatten)]
    pub kind: ParamKind,
    pub default: ParamValue,
}

impl ParameterSpec {
    pub fn number(name: &'static str, label: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self {
            name,
            label,
            unit: None,
            kind: ParamKind::Number { min, max },
            default: ParamValue::Number(default),
        }
    }

    pub fn choice(
        name: &'static str,
        label: &'static str,
        allowed: &[&'static str],
        default: &'static str,
    ) -> Self {
        Self {
            name,
            label,
            unit: None,
            kind: ParamKind::Choice {
                allowed: allowed.to_vec(),
            },
            default: ParamValue::Text(default.to_string()),
        }
    }

    pub fn flag(name: &'static str, label: &'static str, default: bool) -> Self {
        Self {
            name,
            label,
            unit: None,
            kind: ParamKind::Flag,
            default: ParamValue::Flag(default),
        }
    }

    pub fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }
}

/// Cross-parameter rule checked after every involved parameter passed its own constraints.
#[derive(Debug, Clone)]
pub struct CrossCheck {
    pub description: &'static str,
    pub involves: &'static [&'static str],
    pub holds: fn(&ParameterSet) -> bool,
}

pub type ScalarFn = fn(&ParameterSet, &ScalarOutputs) -> Result<f64, ComputationError>;
pub type DomainFn = fn(&ParameterSet, &ScalarOutputs) -> Result<Domain, ComputationError>;
pub type CurveFn = fn(&ParameterSet, &ScalarOutputs, f64) -> Result<f64, ComputationError>;
pub type InterpretFn = fn(&ParameterSet, &ScalarOutputs) -> Vec<String>;

/// Sampling recipe for a series output.
#[derive(Debug, Clone)]
pub struct SeriesSpec {
    pub x_label: &'static str,
    pub x_unit: Option<&'static str>,
    pub resolution: usize,
    pub domain: DomainFn,
    pub curve: CurveFn,
}

#[derive(Debug, Clone)]
pub enum OutputKind {
    Scalar(ScalarFn),
    Series(SeriesSpec),
}

/// Declared output; outputs are computed in declaration order and may read
/// any scalar computed before them.
#[derive(Debug, Clone)]
pub struct OutputSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub unit: Option<&'static str>,
    pub kind: OutputKind,
}

impl OutputSpec {
    pub fn scalar(name: &'static str, label: &'static str, formula: ScalarFn) -> Self {
        Self {
            name,
            label,
            unit: None,
            kind: OutputKind::Scalar(formula),
        }
    }

    pub fn series(name: &'static str, label: &'static str, spec: SeriesSpec) -> Self {
        Self {
            name,
            label,
            unit: None,
            kind: OutputKind::Series(spec),
        }
    }

    pub fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, OutputKind::Scalar(_))
    }
}

/// Ordered threshold rules applied to one scalar output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationSpec {
    pub name: &'static str,
    pub source: &'static str,
    pub rules: RuleSet,
}

/// Declarative description of a lab tool.
#[derive(Debug, Clone)]
pub struct ModelDefinition {
    pub name: &'static str,
    pub display_name: &'static str,
    pub suite: Suite,
    pub summary: &'static str,
    pub formula: &'static str,
    pub parameters: Vec<ParameterSpec>,
    pub constraints: Vec<CrossCheck>,
    pub outputs: Vec<OutputSpec>,
    pub classifications: Vec<ClassificationSpec>,
    pub interpretation: Option<InterpretFn>,
}

impl ModelDefinition {
    pub fn new(name: &'static str, display_name: &'static str, suite: Suite) -> Self {
        Self {
            name,
            display_name,
            suite,
            summary: "",
            formula: "",
            parameters: Vec::new(),
            constraints: Vec::new(),
            outputs: Vec::new(),
            classifications: Vec::new(),
            interpretation: None,
        }
    }

    pub fn summary(mut self, summary: &'static str) -> Self {
        self.summary = summary;
        self
    }

    pub fn formula(mut self, formula: &'static str) -> Self {
        self.formula = formula;
        self
    }

    pub fn parameter(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    pub fn constraint(
        mut self,
        description: &'static str,
        involves: &'static [&'static str],
        holds: fn(&ParameterSet) -> bool,
    ) -> Self {
        self.constraints.push(CrossCheck {
            description,
            involves,
            holds,
        });
        self
    }

    pub fn output(mut self, spec: OutputSpec) -> Self {
        self.outputs.push(spec);
        self
    }

    pub fn classify(mut self, name: &'static str, source: &'static str, rules: RuleSet) -> Self {
        self.classifications.push(ClassificationSpec {
            name,
            source,
            rules,
        });
        self
    }

    pub fn interpret(mut self, interpretation: InterpretFn) -> Self {
        self.interpretation = Some(interpretation);
        self
    }

    pub fn parameter_spec(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|spec| spec.name == name)
    }

    pub fn output_spec(&self, name: &str) -> Option<&OutputSpec> {
        self.outputs.iter().find(|spec| spec.name == name)
    }

    /// Defaults for every declared parameter, as a ready-to-dispatch bag.
    pub fn default_bag(&self) -> ParameterBag {
        self.parameters
            .iter()
            .map(|spec| (spec.name, spec.default.clone()))
            .collect()
    }

    pub fn summary_view(&self) -> ModuleSummary {
        ModuleSummary {
            name: self.name,
            display_name: self.display_name,
            suite: self.suite,
            suite_label: self.suite.label(),
        }
    }

    /// Serializable schema for listing and form rendering.
    pub fn view(&self) -> ModelView {
        ModelView {
            name: self.name,
            display_name: self.display_name,
            suite: self.suite,
            summary: self.summary,
            formula: self.formula,
            parameters: self.parameters.clone(),
            constraints: self
                .constraints
                .iter()
                .map(|check| check.description)
                .collect(),
            outputs: self
                .outputs
                .iter()
                .map(|output| OutputView {
                    name: output.name,
                    label: output.label,
                    unit: output.unit,
                    kind: match &output.kind {
                        OutputKind::Scalar(_) => "scalar",
                        OutputKind::Series(_) => "series",
                    },
                    x_label: match &output.kind {
                        OutputKind::Series(spec) => Some(spec.x_label),
                        OutputKind::Scalar(_) => None,
                    },
                })
                .collect(),
            classifications: self.classifications.clone(),
        }
    }
}

/// Catalog listing row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleSummary {
    pub name: &'static str,
    pub display_name: &'static str,
    pub suite: Suite,
    pub suite_label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelView {
    pub name: &'static str,
    pub display_name: &'static str,
    pub suite: Suite,
    pub summary: &'static str,
    pub formula: &'static str,
    pub parameters: Vec<ParameterSpec>,
    pub constraints: Vec<&'static str>,
    pub outputs: Vec<OutputView>,
    pub classifications: Vec<ClassificationSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputView {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_label: Option<&'static str>,
}
