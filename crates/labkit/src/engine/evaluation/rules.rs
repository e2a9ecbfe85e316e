use std::fmt;

use serde::Serialize;

/// Label returned by a rule set that was never registered and has no fallback.
pub const UNCLASSIFIED: &str = "Unclassified";

/// Condition a scalar must satisfy for a rule to apply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    AtLeast { bound: f64 },
    Above { bound: f64 },
    AtMost { bound: f64 },
    Below { bound: f64 },
    /// `lower <= value < upper`
    HalfOpen { lower: f64, upper: f64 },
    /// `lower <= value <= upper`
    Closed { lower: f64, upper: f64 },
    Always,
}

impl Predicate {
    pub fn matches(&self, value: f64) -> bool {
        match *self {
            Predicate::AtLeast { bound } => value >= bound,
            Predicate::Above { bound } => value > bound,
            Predicate::AtMost { bound } => value <= bound,
            Predicate::Below { bound } => value < bound,
            Predicate::HalfOpen { lower, upper } => value >= lower && value < upper,
            Predicate::Closed { lower, upper } => value >= lower && value <= upper,
            Predicate::Always => true,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Predicate::AtLeast { bound } => write!(f, ">= {bound}"),
            Predicate::Above { bound } => write!(f, "> {bound}"),
            Predicate::AtMost { bound } => write!(f, "<= {bound}"),
            Predicate::Below { bound } => write!(f, "< {bound}"),
            Predicate::HalfOpen { lower, upper } => write!(f, "[{lower}, {upper})"),
            Predicate::Closed { lower, upper } => write!(f, "[{lower}, {upper}]"),
            Predicate::Always => f.write_str("otherwise"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    #[serde(flatten)]
    pub predicate: Predicate,
    pub label: &'static str,
}

impl Rule {
    pub fn at_least(bound: f64, label: &'static str) -> Self {
        Self {
            predicate: Predicate::AtLeast { bound },
            label,
        }
    }

    pub fn above(bound: f64, label: &'static str) -> Self {
        Self {
            predicate: Predicate::Above { bound },
            label,
        }
    }

    pub fn at_most(bound: f64, label: &'static str) -> Self {
        Self {
            predicate: Predicate::AtMost { bound },
            label,
        }
    }

    pub fn below(bound: f64, label: &'static str) -> Self {
        Self {
            predicate: Predicate::Below { bound },
            label,
        }
    }

    pub fn half_open(lower: f64, upper: f64, label: &'static str) -> Self {
        Self {
            predicate: Predicate::HalfOpen { lower, upper },
            label,
        }
    }

    pub fn closed(lower: f64, upper: f64, label: &'static str) -> Self {
        Self {
            predicate: Predicate::Closed { lower, upper },
            label,
        }
    }

    pub fn otherwise(label: &'static str) -> Self {
        Self {
            predicate: Predicate::Always,
            label,
        }
    }
}

/// Structural problems detected when a rule set is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSetProblem {
    MissingFallback,
    ShadowingFallback { position: usize },
}

/// Ordered, first-match rule list. Must end with [`Predicate::Always`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn fallback(&self) -> Option<&Rule> {
        self.rules
            .last()
            .filter(|rule| rule.predicate == Predicate::Always)
    }

    pub fn check(&self) -> Result<(), RuleSetProblem> {
        let last = self.rules.len().checked_sub(1);
        if let Some(position) = self
            .rules
            .iter()
            .position(|rule| rule.predicate == Predicate::Always)
        {
            if Some(position) != last {
                return Err(RuleSetProblem::ShadowingFallback { position });
            }
        }

        match self.fallback() {
            Some(_) => Ok(()),
            None => Err(RuleSetProblem::MissingFallback),
        }
    }
}

/// First-match classification. NaN and infinities always route to the fallback.
pub fn classify(value: f64, rules: &RuleSet) -> &'static str {
    let fallback = rules.fallback().map(|rule| rule.label).unwrap_or(UNCLASSIFIED);

    if !value.is_finite() {
        return fallback;
    }

    rules
        .rules
        .iter()
        .find(|rule| rule.predicate.matches(value))
        .map(|rule| rule.label)
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workability() -> RuleSet {
        RuleSet::new(vec![
            Rule::below(25.0, "Very low"),
            Rule::at_most(75.0, "Low"),
            Rule::at_most(150.0, "Medium"),
            Rule::otherwise("High"),
        ])
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = workability();
        assert_eq!(classify(10.0, &rules), "Very low");
        assert_eq!(classify(25.0, &rules), "Low");
        assert_eq!(classify(75.0, &rules), "Low");
        assert_eq!(classify(75.5, &rules), "Medium");
        assert_eq!(classify(400.0, &rules), "High");
    }

    #[test]
    fn non_finite_values_use_fallback() {
        let rules = workability();
        assert_eq!(classify(f64::NAN, &rules), "High");
        assert_eq!(classify(f64::NEG_INFINITY, &rules), "High");
        assert_eq!(classify(f64::INFINITY, &rules), "High");
    }

    #[test]
    fn check_rejects_missing_and_shadowing_fallbacks() {
        let missing = RuleSet::new(vec![Rule::below(1.0, "small")]);
        assert_eq!(missing.check(), Err(RuleSetProblem::MissingFallback));

        let shadowing = RuleSet::new(vec![
            Rule::otherwise("anything"),
            Rule::below(1.0, "never reached"),
        ]);
        assert_eq!(
            shadowing.check(),
            Err(RuleSetProblem::ShadowingFallback { position: 0 })
        );

        assert!(RuleSet::new(Vec::new()).check().is_err());
        assert!(workability().check().is_ok());
    }

    #[test]
    fn unregistered_rule_set_without_fallback_is_still_total() {
        let rules = RuleSet::new(vec![Rule::below(1.0, "small")]);
        assert_eq!(classify(5.0, &rules), UNCLASSIFIED);
    }

    #[test]
    fn predicates_render_as_bands() {
        assert_eq!(Predicate::HalfOpen { lower: 25.0, upper: 35.0 }.to_string(), "[25, 35)");
        assert_eq!(Predicate::AtLeast { bound: 0.5 }.to_string(), ">= 0.5");
        assert_eq!(Predicate::Always.to_string(), "otherwise");
    }
}
