use std::sync::Arc;

use serde::Serialize;

use super::dispatcher::{DispatchError, Dispatcher};
use super::evaluation::EvaluationResult;
use super::ledger::{record_result, LedgerEntry, LedgerError, ResultLedger, RunId};
use super::model::{ModelView, ModuleSummary, ParameterBag};
use super::registry::ModuleRegistry;

/// Service composing the dispatcher with a result ledger.
pub struct LabService<L> {
    dispatcher: Dispatcher,
    ledger: Arc<L>,
}

/// A completed run, with the ledger id when it was recorded.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
    #[serde(flatten)]
    pub result: EvaluationResult,
}

impl<L> LabService<L>
where
    L: ResultLedger + 'static,
{
    pub fn new(registry: Arc<ModuleRegistry>, ledger: Arc<L>) -> Self {
        Self {
            dispatcher: Dispatcher::new(registry),
            ledger,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn modules(&self) -> Vec<ModuleSummary> {
        self.dispatcher
            .registry()
            .iter()
            .map(|model| model.summary_view())
            .collect()
    }

    pub fn describe(&self, name: &str) -> Result<ModelView, LabServiceError> {
        let model = self
            .dispatcher
            .registry()
            .get(name)
            .map_err(DispatchError::from)?;
        Ok(model.view())
    }

    /// Evaluate a module; with `record` set the result is appended to the ledger.
    pub fn run(
        &self,
        name: &str,
        params: &ParameterBag,
        record: bool,
    ) -> Result<RunOutcome, LabServiceError> {
        let result = self.dispatcher.run(name, params)?;
        let run_id = if record {
            Some(record_result(self.ledger.as_ref(), &result)?)
        } else {
            None
        };
        Ok(RunOutcome { run_id, result })
    }

    pub fn entries(&self, run_id: Option<&RunId>) -> Result<Vec<LedgerEntry>, LabServiceError> {
        Ok(self.ledger.query(run_id)?)
    }
}

/// Error raised by the lab service.
#[derive(Debug, thiserror::Error)]
pub enum LabServiceError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
