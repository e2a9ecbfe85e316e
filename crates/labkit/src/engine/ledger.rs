use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::evaluation::EvaluationResult;

/// Groups the ledger entries written for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("run-{sequence:06}"))
    }

    pub fn sequence(&self) -> Option<u64> {
        self.0.strip_prefix("run-")?.parse().ok()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the append-only results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub run_id: RunId,
    pub module_name: String,
    pub parameter_name: String,
    pub value: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ledger csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("ledger lock poisoned")]
    Poisoned,
}

/// Append-only store of `(run, parameter, value)` rows.
///
/// Implementations serialize concurrent appends; reads return insertion order.
pub trait ResultLedger: Send + Sync {
    fn next_run_id(&self) -> Result<RunId, LedgerError>;
    fn append(&self, run_id: &RunId, module: &str, entries: &[(String, String)]) -> Result<(), LedgerError>;
    fn query(&self, run_id: Option<&RunId>) -> Result<Vec<LedgerEntry>, LedgerError>;
}

/// Flatten a result into ledger rows under a fresh run id: inputs, scalars,
/// classification labels, then notes.
pub fn record_result<L>(ledger: &L, result: &EvaluationResult) -> Result<RunId, LedgerError>
where
    L: ResultLedger + ?Sized,
{
    let mut entries = Vec::new();
    entries.extend(
        result
            .inputs
            .iter()
            .map(|input| (input.name.clone(), input.value.to_string())),
    );
    entries.extend(
        result
            .scalars
            .iter()
            .map(|scalar| match &scalar.unit {
                Some(unit) => (scalar.name.clone(), format!("{} {unit}", scalar.value)),
                None => (scalar.name.clone(), scalar.value.to_string()),
            }),
    );
    entries.extend(
        result
            .classifications
            .iter()
            .map(|classification| (classification.name.clone(), classification.label.clone())),
    );
    if !result.notes.is_empty() {
        entries.push(("notes".to_string(), result.notes.join("; ")));
    }

    let run_id = ledger.next_run_id()?;
    ledger.append(&run_id, &result.module_name, &entries)?;
    debug!(%run_id, module = %result.module_name, rows = entries.len(), "result recorded");
    Ok(run_id)
}

fn build_entries(run_id: &RunId, module: &str, entries: &[(String, String)]) -> Vec<LedgerEntry> {
    let recorded_at = Utc::now();
    entries
        .iter()
        .map(|(name, value)| LedgerEntry {
            run_id: run_id.clone(),
            module_name: module.to_string(),
            parameter_name: name.clone(),
            value: value.clone(),
            recorded_at,
        })
        .collect()
}

fn filter_run(entries: impl IntoIterator<Item = LedgerEntry>, run_id: Option<&RunId>) -> Vec<LedgerEntry> {
    entries
        .into_iter()
        .filter(|entry| run_id.map(|id| &entry.run_id == id).unwrap_or(true))
        .collect()
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: Vec<LedgerEntry>,
    sequence: u64,
}

/// Process-lifetime ledger.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<MemoryState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, LedgerError> {
        let state = self.state.lock().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }
}

impl ResultLedger for InMemoryLedger {
    fn next_run_id(&self) -> Result<RunId, LedgerError> {
        let mut state = self.state.lock().map_err(|_| LedgerError::Poisoned)?;
        state.sequence += 1;
        Ok(RunId::from_sequence(state.sequence))
    }

    fn append(&self, run_id: &RunId, module: &str, entries: &[(String, String)]) -> Result<(), LedgerError> {
        let mut state = self.state.lock().map_err(|_| LedgerError::Poisoned)?;
        state.entries.extend(build_entries(run_id, module, entries));
        Ok(())
    }

    fn query(&self, run_id: Option<&RunId>) -> Result<Vec<LedgerEntry>, LedgerError> {
        let state = self.state.lock().map_err(|_| LedgerError::Poisoned)?;
        Ok(filter_run(state.entries.iter().cloned(), run_id))
    }
}

/// CSV-file ledger; the run sequence resumes from the highest id on disk.
#[derive(Debug)]
pub struct CsvLedger {
    path: PathBuf,
    sequence: Mutex<u64>,
}

impl CsvLedger {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let sequence = read_entries(&path)?
            .iter()
            .filter_map(|entry| entry.run_id.sequence())
            .max()
            .unwrap_or(0);

        debug!(path = %path.display(), sequence, "csv ledger opened");
        Ok(Self {
            path,
            sequence: Mutex::new(sequence),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultLedger for CsvLedger {
    fn next_run_id(&self) -> Result<RunId, LedgerError> {
        let mut sequence = self.sequence.lock().map_err(|_| LedgerError::Poisoned)?;
        *sequence += 1;
        Ok(RunId::from_sequence(*sequence))
    }

    fn append(&self, run_id: &RunId, module: &str, entries: &[(String, String)]) -> Result<(), LedgerError> {
        // The sequence lock doubles as the writer lock.
        let _guard = self.sequence.lock().map_err(|_| LedgerError::Poisoned)?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        for entry in build_entries(run_id, module, entries) {
            writer.serialize(entry)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn query(&self, run_id: Option<&RunId>) -> Result<Vec<LedgerEntry>, LedgerError> {
        let _guard = self.sequence.lock().map_err(|_| LedgerError::Poisoned)?;
        Ok(filter_run(read_entries(&self.path)?, run_id))
    }
}

fn read_entries(path: &Path) -> Result<Vec<LedgerEntry>, LedgerError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path)?;
    let entries = reader
        .deserialize::<LedgerEntry>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}
