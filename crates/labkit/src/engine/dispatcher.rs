use std::sync::Arc;

use tracing::{info, warn};

use super::evaluation::{evaluate, ComputationError, EvaluationError, EvaluationResult, ValidationError};
use super::model::ParameterBag;
use super::registry::{ModuleNotFound, ModuleRegistry};

/// Failure returned to the caller of [`Dispatcher::run`]. Deterministic, so never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    #[error("module '{name}' not found")]
    UnknownModule { name: String, available: Vec<String> },
    #[error(transparent)]
    Validation(ValidationError),
    #[error("computation failed for '{module}': {source}")]
    Computation {
        module: String,
        #[source]
        source: ComputationError,
    },
}

impl From<ModuleNotFound> for DispatchError {
    fn from(value: ModuleNotFound) -> Self {
        Self::UnknownModule {
            name: value.name,
            available: value.available,
        }
    }
}

/// Resolves module names and hands parameter bags to the evaluator.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ModuleRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn run(&self, name: &str, params: &ParameterBag) -> Result<EvaluationResult, DispatchError> {
        let model = self.registry.get(name).map_err(|err| {
            warn!(module = name, "dispatch to unknown module");
            DispatchError::from(err)
        })?;

        match evaluate(&model, params) {
            Ok(result) => {
                info!(
                    module = name,
                    supplied = params.len(),
                    classifications = result.classifications.len(),
                    "module evaluated"
                );
                Ok(result)
            }
            Err(EvaluationError::Validation(err)) => {
                warn!(module = name, violations = err.violations.len(), "parameters rejected");
                Err(DispatchError::Validation(err))
            }
            Err(EvaluationError::Computation(source)) => {
                warn!(module = name, error = %source, "computation failed");
                Err(DispatchError::Computation {
                    module: name.to_string(),
                    source,
                })
            }
        }
    }

    /// Run and append the result to the caller's session history.
    pub fn run_in(
        &self,
        session: &mut Session,
        name: &str,
        params: &ParameterBag,
    ) -> Result<EvaluationResult, DispatchError> {
        let result = self.run(name, params)?;
        session.record(result.clone());
        Ok(result)
    }
}

/// Per-user history of completed runs, owned by the caller.
#[derive(Debug, Clone, Default)]
pub struct Session {
    history: Vec<EvaluationResult>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: EvaluationResult) {
        self.history.push(result);
    }

    pub fn history(&self) -> &[EvaluationResult] {
        &self.history
    }

    /// Most recent result for a module.
    pub fn latest(&self, module: &str) -> Option<&EvaluationResult> {
        self.history
            .iter()
            .rev()
            .find(|result| result.module_name == module)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
