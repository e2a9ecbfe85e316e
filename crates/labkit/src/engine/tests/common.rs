use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::engine::evaluation::{guarded_div, Domain, Rule, RuleSet};
use crate::engine::ledger::{InMemoryLedger, LedgerEntry, LedgerError, ResultLedger, RunId};
use crate::engine::model::{ModelDefinition, OutputSpec, ParameterSpec, SeriesSpec, Suite};
use crate::engine::registry::ModuleRegistry;
use crate::engine::service::LabService;

pub(super) const RAMP: &str = "ramp";

/// Small model touching every schema feature: numbers, a choice, a
/// cross-parameter check, scalars, a series and a classification.
pub(super) fn ramp_model() -> ModelDefinition {
    ModelDefinition::new(RAMP, "Ramp", Suite::Programming)
        .summary("Linear or quadratic ramp between two positions.")
        .formula("y = gain x or y = gain x^2")
        .parameter(ParameterSpec::number("gain", "Gain", 0.0, 10.0, 2.0))
        .parameter(ParameterSpec::number("start", "Start", 0.0, 100.0, 0.0).with_unit("m"))
        .parameter(ParameterSpec::number("stop", "Stop", 0.0, 100.0, 10.0).with_unit("m"))
        .parameter(ParameterSpec::choice("shape", "Shape", &["linear", "square"], "linear"))
        .constraint("stop must be greater than start", &["start", "stop"], |p| {
            match (p.number("start"), p.number("stop")) {
                (Ok(start), Ok(stop)) => stop > start,
                _ => false,
            }
        })
        .output(
            OutputSpec::scalar("level", "Level at stop", |p, _| {
                let stop = p.number("stop")?;
                let gain = p.number("gain")?;
                Ok(match p.choice("shape")? {
                    "square" => gain * stop * stop,
                    _ => gain * stop,
                })
            })
            .with_unit("V"),
        )
        .output(OutputSpec::scalar("inverse_gain", "Inverse gain", |p, _| {
            guarded_div("inverse_gain", 1.0, p.number("gain")?)
        }))
        .output(OutputSpec::series(
            "ramp",
            "Ramp",
            SeriesSpec {
                x_label: "Position",
                x_unit: Some("m"),
                resolution: 11,
                domain: |p, _| Ok(Domain::new(p.number("start")?, p.number("stop")?)),
                curve: |p, _, x| {
                    let gain = p.number("gain")?;
                    Ok(match p.choice("shape")? {
                        "square" => gain * x * x,
                        _ => gain * x,
                    })
                },
            },
        ))
        .classify(
            "band",
            "level",
            RuleSet::new(vec![
                Rule::at_least(50.0, "High"),
                Rule::at_least(10.0, "Medium"),
                Rule::otherwise("Low"),
            ]),
        )
        .interpret(|_, s| match s.get("level") {
            Ok(level) if level >= 50.0 => vec!["Ramp saturates the band.".to_string()],
            _ => Vec::new(),
        })
}

pub(super) fn registry() -> Arc<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    registry.register(ramp_model()).expect("ramp registers");
    Arc::new(registry)
}

pub(super) fn build_service() -> (Arc<LabService<InMemoryLedger>>, Arc<InMemoryLedger>) {
    let ledger = Arc::new(InMemoryLedger::new());
    let service = Arc::new(LabService::new(registry(), ledger.clone()));
    (service, ledger)
}

/// Ledger whose writes always fail.
#[derive(Debug, Default)]
pub(super) struct BrokenLedger;

impl ResultLedger for BrokenLedger {
    fn next_run_id(&self) -> Result<RunId, LedgerError> {
        Ok(RunId::from_sequence(1))
    }

    fn append(&self, _run_id: &RunId, _module: &str, _entries: &[(String, String)]) -> Result<(), LedgerError> {
        Err(LedgerError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }

    fn query(&self, _run_id: Option<&RunId>) -> Result<Vec<LedgerEntry>, LedgerError> {
        Err(LedgerError::Poisoned)
    }
}

pub(super) fn broken_service() -> Arc<LabService<BrokenLedger>> {
    Arc::new(LabService::new(registry(), Arc::new(BrokenLedger)))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
