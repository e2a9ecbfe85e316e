use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::evaluation::{check_value, ParameterSet, ResolvedParameter, RuleSetProblem, ViolationKind};
use super::model::{ModelDefinition, OutputKind, ParamKind, Suite};

/// Catalog-build failures. Fatal at startup, never raised during evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistrationError {
    #[error("module '{name}' is already registered")]
    DuplicateName { name: String },
    #[error("module '{model}' declares '{field}' more than once")]
    DuplicateField { model: String, field: String },
    #[error("module '{model}' parameter '{parameter}' has min {min} above max {max}")]
    InvalidBounds {
        model: String,
        parameter: String,
        min: f64,
        max: f64,
    },
    #[error("module '{model}' choice parameter '{parameter}' has no allowed values")]
    EmptyChoices { model: String, parameter: String },
    #[error("module '{model}' parameter '{parameter}' has an invalid default: {problem}")]
    InvalidDefault {
        model: String,
        parameter: String,
        problem: ViolationKind,
    },
    #[error("module '{model}' constraint '{constraint}' references unknown parameter '{parameter}'")]
    UnknownConstraintInput {
        model: String,
        constraint: String,
        parameter: String,
    },
    #[error("module '{model}' defaults violate constraint '{constraint}'")]
    InvalidDefaultConstraint { model: String, constraint: String },
    #[error("module '{model}' series '{output}' needs at least 2 samples, got {resolution}")]
    InvalidResolution {
        model: String,
        output: String,
        resolution: usize,
    },
    #[error("module '{model}' classification '{classification}' reads unknown scalar '{source_name}'")]
    UnknownClassificationSource {
        model: String,
        classification: String,
        source_name: String,
    },
    #[error("module '{model}' classification '{classification}' has no catch-all fallback rule")]
    MissingFallback { model: String, classification: String },
    #[error(
        "module '{model}' classification '{classification}' has a catch-all at position {position} shadowing later rules"
    )]
    ShadowingFallback {
        model: String,
        classification: String,
        position: usize,
    },
}

/// Lookup failure for an unregistered module name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("module '{name}' not found")]
pub struct ModuleNotFound {
    pub name: String,
    pub available: Vec<String>,
}

/// Name → definition mapping populated once from the static catalog.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    models: HashMap<&'static str, Arc<ModelDefinition>>,
    order: Vec<&'static str>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and add a definition; the stored `Arc` is returned for callers that keep a handle.
    pub fn register(&mut self, model: ModelDefinition) -> Result<Arc<ModelDefinition>, RegistrationError> {
        if self.models.contains_key(model.name) {
            return Err(RegistrationError::DuplicateName {
                name: model.name.to_string(),
            });
        }

        check_definition(&model)?;

        let name = model.name;
        let model = Arc::new(model);
        self.models.insert(name, Arc::clone(&model));
        self.order.push(name);
        Ok(model)
    }

    pub fn get(&self, name: &str) -> Result<Arc<ModelDefinition>, ModuleNotFound> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| ModuleNotFound {
                name: name.to_string(),
                available: self.order.iter().map(|name| name.to_string()).collect(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Module names in registration order.
    pub fn list(&self) -> Vec<&'static str> {
        self.order.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ModelDefinition>> {
        self.order.iter().filter_map(|name| self.models.get(name))
    }

    pub fn by_suite(&self, suite: Suite) -> Vec<Arc<ModelDefinition>> {
        self.iter()
            .filter(|model| model.suite == suite)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn check_definition(model: &ModelDefinition) -> Result<(), RegistrationError> {
    let owner = model.name.to_string();

    let mut fields = BTreeSet::new();
    for name in model
        .parameters
        .iter()
        .map(|spec| spec.name)
        .chain(model.outputs.iter().map(|spec| spec.name))
        .chain(model.classifications.iter().map(|spec| spec.name))
    {
        if !fields.insert(name) {
            return Err(RegistrationError::DuplicateField {
                model: owner,
                field: name.to_string(),
            });
        }
    }

    for spec in &model.parameters {
        match &spec.kind {
            ParamKind::Number { min, max } if !(min <= max) => {
                return Err(RegistrationError::InvalidBounds {
                    model: owner,
                    parameter: spec.name.to_string(),
                    min: *min,
                    max: *max,
                });
            }
            ParamKind::Choice { allowed } if allowed.is_empty() => {
                return Err(RegistrationError::EmptyChoices {
                    model: owner,
                    parameter: spec.name.to_string(),
                });
            }
            _ => {}
        }

        if let Err(problem) = check_value(spec, &spec.default) {
            return Err(RegistrationError::InvalidDefault {
                model: owner,
                parameter: spec.name.to_string(),
                problem,
            });
        }
    }

    for check in &model.constraints {
        if let Some(unknown) = check
            .involves
            .iter()
            .find(|name| model.parameter_spec(name).is_none())
        {
            return Err(RegistrationError::UnknownConstraintInput {
                model: owner,
                constraint: check.description.to_string(),
                parameter: unknown.to_string(),
            });
        }
    }

    let defaults = ParameterSet::new(
        model
            .parameters
            .iter()
            .map(|spec| ResolvedParameter {
                name: spec.name.to_string(),
                value: spec.default.clone(),
                defaulted: true,
            })
            .collect(),
    );
    if let Some(check) = model.constraints.iter().find(|check| !(check.holds)(&defaults)) {
        return Err(RegistrationError::InvalidDefaultConstraint {
            model: owner,
            constraint: check.description.to_string(),
        });
    }

    for output in &model.outputs {
        if let OutputKind::Series(spec) = &output.kind {
            if spec.resolution < 2 {
                return Err(RegistrationError::InvalidResolution {
                    model: owner,
                    output: output.name.to_string(),
                    resolution: spec.resolution,
                });
            }
        }
    }

    for classification in &model.classifications {
        let readable = model
            .output_spec(classification.source)
            .map(|output| output.is_scalar())
            .unwrap_or(false);
        if !readable {
            return Err(RegistrationError::UnknownClassificationSource {
                model: owner,
                classification: classification.name.to_string(),
                source_name: classification.source.to_string(),
            });
        }

        match classification.rules.check() {
            Ok(()) => {}
            Err(RuleSetProblem::MissingFallback) => {
                return Err(RegistrationError::MissingFallback {
                    model: owner,
                    classification: classification.name.to_string(),
                });
            }
            Err(RuleSetProblem::ShadowingFallback { position }) => {
                return Err(RegistrationError::ShadowingFallback {
                    model: owner,
                    classification: classification.name.to_string(),
                    position,
                });
            }
        }
    }

    Ok(())
}
