use labkit::catalog;
use labkit::engine::{
    DispatchError, Dispatcher, InMemoryLedger, LabService, LabServiceError, ParameterBag,
    ParamValue, ResultLedger, Session, Suite,
};
use std::sync::Arc;

fn lab() -> LabService<InMemoryLedger> {
    let registry = Arc::new(catalog::standard_registry().expect("catalog registers"));
    LabService::new(registry, Arc::new(InMemoryLedger::new()))
}

#[test]
fn catalog_lists_modules_in_suite_order() {
    let service = lab();
    let modules = service.modules();

    let first_calculus = modules
        .iter()
        .position(|module| module.suite == Suite::Calculus)
        .expect("calculus present");
    let first_programming = modules
        .iter()
        .position(|module| module.suite == Suite::Programming)
        .expect("programming present");
    assert!(first_calculus < first_programming);
    assert!(modules.iter().any(|module| module.name == "brick_compression"));
}

#[test]
fn recorded_brick_test_lands_in_the_ledger() {
    let service = lab();
    let bag = ParameterBag::new()
        .with("max_load_kn", 513.0)
        .with("length_mm", 190.0)
        .with("width_mm", 90.0);

    let outcome = service
        .run("brick_compression", &bag, true)
        .expect("brick evaluates");
    let run_id = outcome.run_id.expect("recorded run");

    let entries = service.entries(Some(&run_id)).expect("ledger readable");
    let value_of = |name: &str| {
        entries
            .iter()
            .find(|entry| entry.parameter_name == name)
            .map(|entry| entry.value.as_str())
    };
    assert_eq!(value_of("max_load_kn"), Some("513"));
    assert_eq!(value_of("strength"), Some("30 N/mm^2"));
    assert_eq!(value_of("grade"), Some("Grade B"));
    assert!(value_of("notes").is_some_and(|notes| notes.contains("load-bearing")));
}

#[test]
fn loose_cli_values_resolve_like_typed_ones() {
    let service = lab();
    let typed = ParameterBag::new().with("mix", "plastic").with("water_cement", 0.6);
    let loose: ParameterBag = [
        ("mix", ParamValue::parse_loose("plastic")),
        ("water_cement", ParamValue::parse_loose("0.6")),
    ]
    .into_iter()
    .collect();

    let typed = service.run("slump_test", &typed, false).expect("typed");
    let loose = service.run("slump_test", &loose, false).expect("loose");
    assert_eq!(typed.result.scalars, loose.result.scalars);
    assert_eq!(typed.result.classifications, loose.result.classifications);
}

#[test]
fn invalid_runs_report_and_skip_the_ledger() {
    let service = lab();
    let bag = ParameterBag::new()
        .with("weight", 500.0)
        .with("height_cm", "tall");

    match service.run("bmi", &bag, true) {
        Err(LabServiceError::Dispatch(DispatchError::Validation(error))) => {
            let names: Vec<_> = error
                .violations
                .iter()
                .map(|violation| violation.parameter.as_str())
                .collect();
            assert_eq!(names, vec!["weight", "height_cm"]);
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert!(service.ledger().query(None).expect("readable").is_empty());
}

#[test]
fn unknown_modules_list_the_whole_catalog() {
    let service = lab();
    match service.run("perpetual_motion", &ParameterBag::new(), false) {
        Err(LabServiceError::Dispatch(DispatchError::UnknownModule { name, available })) => {
            assert_eq!(name, "perpetual_motion");
            assert_eq!(available.len(), catalog::models().len());
        }
        other => panic!("expected unknown module, got {other:?}"),
    }
}

#[test]
fn sessions_track_runs_across_modules() {
    let registry = Arc::new(catalog::standard_registry().expect("catalog registers"));
    let dispatcher = Dispatcher::new(registry);
    let mut session = Session::new();

    dispatcher
        .run_in(&mut session, "ohms_law", &ParameterBag::new())
        .expect("ohms law");
    dispatcher
        .run_in(&mut session, "loan_emi", &ParameterBag::new())
        .expect("loan");
    dispatcher
        .run_in(
            &mut session,
            "ohms_law",
            &ParameterBag::new().with("voltage", 24.0),
        )
        .expect("ohms law again");

    assert_eq!(session.len(), 3);
    let latest = session.latest("ohms_law").expect("latest ohms law");
    assert_eq!(latest.scalar("current"), Some(0.24));
    assert_eq!(session.history()[1].module_name, "loan_emi");
}
