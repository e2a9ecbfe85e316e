use labkit::catalog;
use labkit::engine::{
    ComputationError, DispatchError, Dispatcher, ModuleRegistry, ParameterBag, ViolationKind,
};
use std::sync::Arc;

fn dispatcher() -> Dispatcher {
    let registry: ModuleRegistry = catalog::standard_registry().expect("catalog registers");
    Dispatcher::new(Arc::new(registry))
}

#[test]
fn logistic_growth_saturates_at_capacity() {
    let bag = ParameterBag::new()
        .with("r", 0.5)
        .with("K", 5_000.0)
        .with("P0", 100.0)
        .with("T", 100.0);
    let result = dispatcher()
        .run("population_growth", &bag)
        .expect("logistic model runs");

    let population = result.series("population").expect("population series");
    assert_eq!(population.len(), 1000);
    assert_eq!(population.y.first().copied(), Some(100.0));

    for ((t, _), pair) in population.points().zip(population.y.windows(2)) {
        assert!(pair[1] >= pair[0], "population fell after t = {t}");
        if t < 50.0 {
            assert!(pair[1] > pair[0], "growth stalled at t = {t}");
        }
    }

    let peak = population.max().expect("non-empty");
    assert!(peak <= 5_000.0);
    let last = population.y.last().copied().expect("non-empty");
    assert!((last - 5_000.0).abs() < 1e-6);

    let midpoint = result.scalar("half_capacity_time").expect("midpoint");
    assert!((midpoint - 49.0_f64.ln() / 0.5).abs() < 1e-12);
}

#[test]
fn cost_minimizer_finds_the_economic_order_quantity() {
    let bag = ParameterBag::new()
        .with("F", 20_000.0)
        .with("a", 100.0)
        .with("b", 50_000.0);
    let result = dispatcher().run("cost_minimizer", &bag).expect("runs");

    let quantity = result.scalar("optimal_quantity").expect("q*");
    assert!((quantity - 22.360_68).abs() < 1e-4, "q* = {quantity}");
    let cost = result.scalar("min_cost").expect("min cost");
    assert!((cost - 24_472.136).abs() < 1e-2, "C(q*) = {cost}");

    let curve = result.series("total_cost").expect("cost curve");
    assert_eq!(curve.x.first().copied(), Some(1.0));
    let lowest = curve.min().expect("non-empty");
    assert!(lowest >= cost - 1e-6);
}

#[test]
fn cost_minimizer_rejects_zero_variable_cost() {
    let bag = ParameterBag::new().with("a", 0.0);
    match dispatcher().run("cost_minimizer", &bag) {
        Err(DispatchError::Computation { module, source }) => {
            assert_eq!(module, "cost_minimizer");
            assert!(matches!(source, ComputationError::DivisionByZero { .. }));
        }
        other => panic!("expected computation error, got {other:?}"),
    }
}

#[test]
fn brick_grades_switch_exactly_at_thresholds() {
    let grade_for = |load_kn: f64| {
        let bag = ParameterBag::new()
            .with("max_load_kn", load_kn)
            .with("length_mm", 190.0)
            .with("width_mm", 90.0);
        let result = dispatcher()
            .run("brick_compression", &bag)
            .expect("brick runs");
        (
            result.scalar("strength").expect("strength"),
            result.label("grade").expect("grade").to_string(),
        )
    };

    let (strength, grade) = grade_for(513.0);
    assert!((strength - 30.0).abs() < 1e-12);
    assert_eq!(grade, "Grade B");

    let (strength, grade) = grade_for(34.999 * 17.1);
    assert!(strength < 35.0);
    assert_eq!(grade, "Grade B");

    let (strength, grade) = grade_for(598.5);
    assert_eq!(strength, 35.0);
    assert_eq!(grade, "Grade A");

    let (_, grade) = grade_for(100.0);
    assert_eq!(grade, "Below standard");
}

#[test]
fn every_catalog_module_runs_with_defaults() {
    let dispatcher = dispatcher();
    for name in dispatcher.registry().list() {
        let result = dispatcher
            .run(name, &ParameterBag::new())
            .unwrap_or_else(|err| panic!("{name} failed with defaults: {err}"));
        assert_eq!(result.module_name, name);
        for series in &result.series {
            assert_eq!(series.x.len(), series.y.len(), "{name}/{}", series.name);
            assert!(series.y.iter().all(|value| value.is_finite()));
        }
    }
}

#[test]
fn rocket_requires_coast_time_after_burnout() {
    let bag = ParameterBag::new()
        .with("burn_time", 100.0)
        .with("total_time", 60.0);
    match dispatcher().run("rocket_trajectory", &bag) {
        Err(DispatchError::Validation(validation)) => {
            assert_eq!(validation.violations.len(), 1);
            assert_eq!(validation.violations[0].parameter, "burn_time,total_time");
            assert!(matches!(
                validation.violations[0].problem,
                ViolationKind::Constraint { .. }
            ));
        }
        other => panic!("expected constraint violation, got {other:?}"),
    }
}

#[test]
fn water_absorption_requires_weight_gain() {
    let bag = ParameterBag::new()
        .with("dry_weight", 1_600.0)
        .with("wet_weight", 1_500.0);
    let error = dispatcher()
        .run("water_absorption", &bag)
        .expect_err("wet below dry");
    assert!(matches!(error, DispatchError::Validation(_)));

    let result = dispatcher()
        .run("water_absorption", &ParameterBag::new())
        .expect("defaults run");
    assert!((result.scalar("absorption").expect("absorption") - 8.0).abs() < 1e-9);
    assert_eq!(result.label("suitability"), Some("Within acceptable limits"));
}

#[test]
fn slump_is_capped_and_banded() {
    let plastic = ParameterBag::new()
        .with("mix", "plastic")
        .with("water_cement", 0.7);
    let result = dispatcher().run("slump_test", &plastic).expect("runs");
    assert!((result.scalar("slump").expect("slump") - 168.0).abs() < 1e-9);
    assert_eq!(result.label("workability"), Some("High workability"));

    let flowing = ParameterBag::new()
        .with("mix", "flowing")
        .with("water_cement", 0.7);
    let result = dispatcher().run("slump_test", &flowing).expect("runs");
    assert_eq!(result.scalar("slump"), Some(250.0));

    let result = dispatcher()
        .run("slump_test", &ParameterBag::new())
        .expect("defaults run");
    assert_eq!(result.label("workability"), Some("Low workability"));
}

#[test]
fn double_slit_fringe_width_matches_lambda_d_over_d() {
    let result = dispatcher()
        .run("double_slit", &ParameterBag::new())
        .expect("defaults run");
    let width = result.scalar("fringe_width_mm").expect("fringe width");
    assert!((width - 0.55).abs() < 1e-9);
    assert_eq!(result.scalar("fringes_in_view"), Some(36.0));

    let intensity = result.series("intensity").expect("intensity");
    assert!(intensity.max().expect("non-empty") <= 1.0);
    assert!(intensity.min().expect("non-empty") >= 0.0);
}

#[test]
fn concrete_cooling_flags_large_drops() {
    let result = dispatcher()
        .run("concrete_cooling", &ParameterBag::new())
        .expect("defaults run");
    let drop = result.scalar("temperature_drop").expect("drop");
    assert!((drop - 40.0 * (1.0 - (-2.4_f64).exp())).abs() < 1e-9);
    assert_eq!(result.label("crack_risk"), Some("High thermal crack risk"));

    let gentle = ParameterBag::new()
        .with("T0", 40.0)
        .with("T_env", 35.0);
    let result = dispatcher().run("concrete_cooling", &gentle).expect("runs");
    assert_eq!(result.label("crack_risk"), Some("Low thermal crack risk"));
}

#[test]
fn ohms_law_picks_a_resistor_rating() {
    let bag = ParameterBag::new()
        .with("voltage", 5.0)
        .with("resistance", 220.0);
    let result = dispatcher().run("ohms_law", &bag).expect("runs");
    let power = result.scalar("power").expect("power");
    assert!((power - 25.0 / 220.0).abs() < 1e-12);
    assert_eq!(result.label("resistor_rating"), Some("1/4 W resistor"));
}
