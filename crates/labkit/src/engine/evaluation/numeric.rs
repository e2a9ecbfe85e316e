use serde::{Deserialize, Serialize};

use super::ComputationError;

/// Closed sampling interval `[start, end]` for a series output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub start: f64,
    pub end: f64,
}

impl Domain {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn is_sampleable(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start < self.end
    }
}

/// `count` evenly spaced points across the domain; both endpoints included.
pub fn linspace(domain: Domain, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![domain.start],
        _ => {
            let last = count - 1;
            let span = domain.end - domain.start;
            (0..count)
                .map(|index| {
                    if index == last {
                        domain.end
                    } else {
                        domain.start + span * (index as f64 / last as f64)
                    }
                })
                .collect()
        }
    }
}

/// Division that refuses a zero or non-finite denominator.
pub fn guarded_div(quantity: &str, numerator: f64, denominator: f64) -> Result<f64, ComputationError> {
    if denominator == 0.0 || !denominator.is_finite() {
        return Err(ComputationError::DivisionByZero {
            quantity: quantity.to_string(),
        });
    }

    let value = numerator / denominator;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ComputationError::NonFinite {
            output: quantity.to_string(),
        })
    }
}

pub fn guarded_sqrt(quantity: &str, value: f64) -> Result<f64, ComputationError> {
    if value < 0.0 || !value.is_finite() {
        return Err(ComputationError::Undefined {
            quantity: quantity.to_string(),
            reason: format!("square root of {value}"),
        });
    }
    Ok(value.sqrt())
}

pub fn guarded_ln(quantity: &str, value: f64) -> Result<f64, ComputationError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ComputationError::Undefined {
            quantity: quantity.to_string(),
            reason: format!("logarithm of {value}"),
        });
    }
    Ok(value.ln())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_includes_both_endpoints() {
        let points = linspace(Domain::new(0.0, 100.0), 1000);
        assert_eq!(points.len(), 1000);
        assert_eq!(points[0], 0.0);
        assert_eq!(points[999], 100.0);
        assert!(points.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn guarded_div_rejects_zero_denominator() {
        let err = guarded_div("rate", 1.0, 0.0).expect_err("zero denominator");
        assert!(matches!(err, ComputationError::DivisionByZero { .. }));
        assert_eq!(guarded_div("rate", 9.0, 3.0).expect("finite"), 3.0);
    }

    #[test]
    fn guarded_sqrt_and_ln_reject_out_of_domain_inputs() {
        assert!(guarded_sqrt("q", -1.0).is_err());
        assert!(guarded_ln("t", 0.0).is_err());
        assert_eq!(guarded_sqrt("q", 4.0).expect("sqrt"), 2.0);
    }

    #[test]
    fn inverted_domain_is_not_sampleable() {
        assert!(!Domain::new(5.0, 5.0).is_sampleable());
        assert!(!Domain::new(5.0, 1.0).is_sampleable());
        assert!(!Domain::new(0.0, f64::INFINITY).is_sampleable());
        assert!(Domain::new(-1.0, 1.0).is_sampleable());
    }
}
