use proptest::prelude::*;

use crate::engine::evaluation::{classify, Rule, RuleSet, RuleSetProblem};

fn grades() -> RuleSet {
    RuleSet::new(vec![
        Rule::at_least(35.0, "A"),
        Rule::half_open(25.0, 35.0, "B"),
        Rule::half_open(12.0, 25.0, "C"),
        Rule::otherwise("Below"),
    ])
}

fn reference_grade(value: f64) -> &'static str {
    if value >= 35.0 {
        "A"
    } else if value >= 25.0 {
        "B"
    } else if value >= 12.0 {
        "C"
    } else {
        "Below"
    }
}

#[test]
fn thresholds_are_inclusive_on_the_lower_bound() {
    let rules = grades();
    assert_eq!(classify(30.0, &rules), "B");
    assert_eq!(classify(34.999, &rules), "B");
    assert_eq!(classify(35.0, &rules), "A");
    assert_eq!(classify(25.0, &rules), "B");
    assert_eq!(classify(24.999_999, &rules), "C");
    assert_eq!(classify(12.0, &rules), "C");
    assert_eq!(classify(-4.0, &rules), "Below");
}

#[test]
fn non_finite_values_fall_back() {
    let rules = grades();
    assert_eq!(classify(f64::NAN, &rules), "Below");
    assert_eq!(classify(f64::INFINITY, &rules), "Below");
    assert_eq!(classify(f64::NEG_INFINITY, &rules), "Below");
}

#[test]
fn first_matching_rule_wins_over_later_overlaps() {
    let rules = RuleSet::new(vec![
        Rule::at_most(10.0, "small"),
        Rule::at_most(100.0, "medium"),
        Rule::otherwise("large"),
    ]);
    assert_eq!(classify(5.0, &rules), "small");
    assert_eq!(classify(10.0, &rules), "small");
    assert_eq!(classify(10.5, &rules), "medium");
    assert_eq!(classify(100.5, &rules), "large");
}

#[test]
fn structural_checks_require_a_trailing_fallback() {
    assert_eq!(grades().check(), Ok(()));

    let missing = RuleSet::new(vec![Rule::above(0.0, "positive")]);
    assert_eq!(missing.check(), Err(RuleSetProblem::MissingFallback));

    let shadowing = RuleSet::new(vec![
        Rule::otherwise("anything"),
        Rule::above(0.0, "positive"),
    ]);
    assert_eq!(
        shadowing.check(),
        Err(RuleSetProblem::ShadowingFallback { position: 0 })
    );
}

proptest! {
    #[test]
    fn classification_matches_reference_bands(value in -100.0f64..200.0) {
        prop_assert_eq!(classify(value, &grades()), reference_grade(value));
    }

    #[test]
    fn every_finite_value_gets_exactly_one_band(value in proptest::num::f64::NORMAL) {
        let rules = grades();
        let label = classify(value, &rules);
        let matching = rules
            .rules()
            .iter()
            .filter(|rule| rule.label != "Below" && rule.predicate.matches(value))
            .count();
        prop_assert!(matching <= 1);
        prop_assert_eq!(label == "Below", matching == 0);
    }
}
