use super::common::*;
use crate::engine::evaluation::evaluate;
use crate::engine::ledger::{record_result, InMemoryLedger, ResultLedger};
use crate::engine::model::ParameterBag;

#[test]
fn recorded_rows_follow_inputs_scalars_labels_then_notes() {
    let ledger = InMemoryLedger::new();
    let bag = ParameterBag::new().with("gain", 6.0);
    let result = evaluate(&ramp_model(), &bag).expect("evaluates");

    let run_id = record_result(&ledger, &result).expect("records");
    let entries = ledger.query(Some(&run_id)).expect("query");

    let names: Vec<_> = entries
        .iter()
        .map(|entry| entry.parameter_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["gain", "start", "stop", "shape", "level", "inverse_gain", "band", "notes"]
    );
    assert!(entries.iter().all(|entry| entry.module_name == RAMP));
    assert!(entries.iter().all(|entry| entry.run_id == run_id));

    let value_of = |name: &str| {
        entries
            .iter()
            .find(|entry| entry.parameter_name == name)
            .map(|entry| entry.value.clone())
    };
    assert_eq!(value_of("gain").as_deref(), Some("6"));
    assert_eq!(value_of("shape").as_deref(), Some("linear"));
    assert_eq!(value_of("level").as_deref(), Some("60 V"));
    assert_eq!(value_of("band").as_deref(), Some("High"));
}

#[test]
fn reads_are_idempotent() {
    let ledger = InMemoryLedger::new();
    let result = evaluate(&ramp_model(), &ParameterBag::new()).expect("evaluates");
    record_result(&ledger, &result).expect("first");
    record_result(&ledger, &result).expect("second");

    let first = ledger.query(None).expect("first read");
    let second = ledger.query(None).expect("second read");
    assert_eq!(first, second);
    assert_eq!(ledger.len().expect("ledger readable"), first.len());
}

#[test]
fn each_recording_gets_a_fresh_run_id() {
    let ledger = InMemoryLedger::new();
    let result = evaluate(&ramp_model(), &ParameterBag::new()).expect("evaluates");
    let first = record_result(&ledger, &result).expect("first");
    let second = record_result(&ledger, &result).expect("second");

    assert_ne!(first, second);
    let only_first = ledger.query(Some(&first)).expect("query");
    assert!(!only_first.is_empty());
    assert!(only_first.iter().all(|entry| entry.run_id == first));
    // Defaults produce no notes.
    assert!(only_first.iter().all(|entry| entry.parameter_name != "notes"));
}
