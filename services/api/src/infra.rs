use labkit::catalog;
use labkit::config::LedgerConfig;
use labkit::engine::{
    CsvLedger, InMemoryLedger, LabService, LedgerEntry, LedgerError, ParamValue, ResultLedger,
    RunId,
};
use labkit::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Ledger chosen at startup from `APP_LEDGER_PATH`.
#[derive(Debug)]
pub(crate) enum ConfiguredLedger {
    Memory(InMemoryLedger),
    Csv(CsvLedger),
}

impl ConfiguredLedger {
    pub(crate) fn open(config: &LedgerConfig) -> Result<Self, LedgerError> {
        match config {
            LedgerConfig::Memory => Ok(Self::Memory(InMemoryLedger::new())),
            LedgerConfig::Csv(path) => {
                info!(path = %path.display(), "using csv ledger");
                CsvLedger::open(path.clone()).map(Self::Csv)
            }
        }
    }

    pub(crate) fn is_persistent(&self) -> bool {
        matches!(self, Self::Csv(_))
    }
}

impl ResultLedger for ConfiguredLedger {
    fn next_run_id(&self) -> Result<RunId, LedgerError> {
        match self {
            Self::Memory(ledger) => ledger.next_run_id(),
            Self::Csv(ledger) => ledger.next_run_id(),
        }
    }

    fn append(&self, run_id: &RunId, module: &str, entries: &[(String, String)]) -> Result<(), LedgerError> {
        match self {
            Self::Memory(ledger) => ledger.append(run_id, module, entries),
            Self::Csv(ledger) => ledger.append(run_id, module, entries),
        }
    }

    fn query(&self, run_id: Option<&RunId>) -> Result<Vec<LedgerEntry>, LedgerError> {
        match self {
            Self::Memory(ledger) => ledger.query(run_id),
            Self::Csv(ledger) => ledger.query(run_id),
        }
    }
}

pub(crate) type Lab = LabService<ConfiguredLedger>;

/// Register the standard catalog and attach the configured ledger.
pub(crate) fn build_lab(config: &LedgerConfig) -> Result<Arc<Lab>, AppError> {
    let registry = Arc::new(catalog::standard_registry()?);
    let ledger = Arc::new(ConfiguredLedger::open(config)?);
    Ok(Arc::new(LabService::new(registry, ledger)))
}

/// Parse a `key=value` command-line parameter.
pub(crate) fn parse_param(raw: &str) -> Result<(String, ParamValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("parameter name missing in '{raw}'"));
    }
    Ok((key.to_string(), ParamValue::parse_loose(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_param_splits_on_the_first_equals() {
        let (key, value) = parse_param("mix=plastic").expect("parses");
        assert_eq!(key, "mix");
        assert_eq!(value, ParamValue::Text("plastic".to_string()));

        let (key, value) = parse_param(" water_cement = 0.55 ").expect("parses");
        assert_eq!(key, "water_cement");
        assert_eq!(value, ParamValue::Number(0.55));

        let (_, value) = parse_param("note=a=b").expect("parses");
        assert_eq!(value, ParamValue::Text("a=b".to_string()));
    }

    #[test]
    fn parse_param_rejects_missing_parts() {
        assert!(parse_param("weight").is_err());
        assert!(parse_param("=70").is_err());
    }

    #[test]
    fn memory_ledger_is_not_persistent() {
        let ledger = ConfiguredLedger::open(&LedgerConfig::Memory).expect("opens");
        assert!(!ledger.is_persistent());
        assert!(ledger.query(None).expect("readable").is_empty());
    }

    #[test]
    fn build_lab_registers_the_catalog() {
        let lab = build_lab(&LedgerConfig::Memory).expect("lab builds");
        assert_eq!(lab.modules().len(), catalog::models().len());
    }
}
