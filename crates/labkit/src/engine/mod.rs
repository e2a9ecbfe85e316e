//! Model definitions, evaluation, dispatch, and result persistence.

pub mod dispatcher;
pub mod evaluation;
pub mod ledger;
pub mod model;
pub mod registry;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use dispatcher::{DispatchError, Dispatcher, Session};
pub use evaluation::{
    classify, evaluate, ClassificationLabel, ComputationError, Domain, EvaluationError,
    EvaluationResult, ParameterSet, ParameterViolation, Predicate, ResolvedParameter, Rule,
    RuleSet, ScalarOutput, ScalarOutputs, Series, ValidationError, ViolationKind,
};
pub use ledger::{
    record_result, CsvLedger, InMemoryLedger, LedgerEntry, LedgerError, ResultLedger, RunId,
};
pub use model::{
    ModelDefinition, ModelView, ModuleSummary, OutputSpec, ParamKind, ParamValue, ParameterBag,
    ParameterSpec, SeriesSpec, Suite,
};
pub use registry::{ModuleNotFound, ModuleRegistry, RegistrationError};
pub use router::{lab_router, RunRequest};
pub use service::{LabService, LabServiceError, RunOutcome};
