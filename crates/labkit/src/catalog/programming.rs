use crate::engine::evaluation::{guarded_div, ComputationError, Domain, ParameterSet, Rule, RuleSet};
use crate::engine::model::{ModelDefinition, OutputSpec, ParameterSpec, SeriesSpec, Suite};

pub(super) fn models() -> Vec<ModelDefinition> {
    vec![bmi(), loan_emi()]
}

fn height_squared(params: &ParameterSet) -> Result<f64, ComputationError> {
    let height_m = params.number("height_cm")? / 100.0;
    Ok(height_m * height_m)
}

fn bmi() -> ModelDefinition {
    ModelDefinition::new("bmi", "BMI Calculator", Suite::Programming)
        .summary("Body mass index with WHO adult category bands.")
        .formula("BMI = weight (kg) / height (m)^2")
        .parameter(ParameterSpec::number("weight", "Weight", 10.0, 200.0, 70.0).with_unit("kg"))
        .parameter(ParameterSpec::number("height_cm", "Height", 50.0, 250.0, 170.0).with_unit("cm"))
        .output(
            OutputSpec::scalar("bmi", "Body mass index", |p, _| {
                guarded_div("bmi", p.number("weight")?, height_squared(p)?)
            })
            .with_unit("kg/m^2"),
        )
        .output(
            OutputSpec::scalar("healthy_weight_min", "Lowest normal weight", |p, _| {
                Ok(18.5 * height_squared(p)?)
            })
            .with_unit("kg"),
        )
        .output(
            OutputSpec::scalar("healthy_weight_max", "Highest normal weight", |p, _| {
                Ok(25.0 * height_squared(p)?)
            })
            .with_unit("kg"),
        )
        .classify(
            "category",
            "bmi",
            RuleSet::new(vec![
                Rule::below(18.5, "Underweight"),
                Rule::below(25.0, "Normal"),
                Rule::below(30.0, "Overweight"),
                Rule::otherwise("Obese"),
            ]),
        )
}

/// Fixed-rate loan repaid in equal monthly instalments.
struct Loan {
    principal: f64,
    monthly_rate: f64,
    months: f64,
}

impl Loan {
    fn from_params(params: &ParameterSet) -> Result<Self, ComputationError> {
        Ok(Self {
            principal: params.number("principal")?,
            monthly_rate: params.number("annual_rate_pct")? / 1200.0,
            months: params.number("tenure_years")? * 12.0,
        })
    }

    fn instalment(&self) -> Result<f64, ComputationError> {
        if self.monthly_rate == 0.0 {
            return guarded_div("emi", self.principal, self.months);
        }
        let growth = (1.0 + self.monthly_rate).powf(self.months);
        guarded_div("emi", self.principal * self.monthly_rate * growth, growth - 1.0)
    }

    /// Outstanding principal after `month` instalments.
    fn balance(&self, month: f64) -> Result<f64, ComputationError> {
        let emi = self.instalment()?;
        if self.monthly_rate == 0.0 {
            return Ok((self.principal - emi * month).max(0.0));
        }
        let growth = (1.0 + self.monthly_rate).powf(month);
        let repaid = emi * (growth - 1.0) / self.monthly_rate;
        Ok((self.principal * growth - repaid).max(0.0))
    }
}

fn loan_emi() -> ModelDefinition {
    ModelDefinition::new("loan_emi", "Loan EMI Calculator", Suite::Programming)
        .summary("Equated monthly instalment and repayment schedule of a loan.")
        .formula("EMI = P r (1 + r)^N / ((1 + r)^N - 1), EMI = P / N when r = 0")
        .parameter(ParameterSpec::number("principal", "Loan amount", 1_000.0, 1e8, 100_000.0))
        .parameter(ParameterSpec::number("annual_rate_pct", "Annual interest rate", 0.0, 50.0, 8.0).with_unit("%"))
        .parameter(ParameterSpec::number("tenure_years", "Tenure", 1.0, 30.0, 5.0).with_unit("years"))
        .output(OutputSpec::scalar("emi", "Monthly instalment", |p, _| {
            Loan::from_params(p)?.instalment()
        }))
        .output(OutputSpec::scalar("total_payment", "Total payment", |p, s| {
            Ok(s.get("emi")? * p.number("tenure_years")? * 12.0)
        }))
        .output(OutputSpec::scalar("total_interest", "Total interest", |p, s| {
            Ok(s.get("total_payment")? - p.number("principal")?)
        }))
        .output(OutputSpec::series(
            "outstanding_balance",
            "Outstanding principal",
            SeriesSpec {
                x_label: "Month",
                x_unit: None,
                resolution: 200,
                domain: |p, _| Ok(Domain::new(0.0, p.number("tenure_years")? * 12.0)),
                curve: |p, _, month| Loan::from_params(p)?.balance(month),
            },
        ))
        .interpret(|p, s| {
            match (s.get("total_interest"), p.number("principal")) {
                (Ok(interest), Ok(principal)) if principal > 0.0 => vec![format!(
                    "Interest makes up {:.1}% of the principal over the tenure.",
                    interest / principal * 100.0
                )],
                _ => Vec::new(),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{evaluate, ParameterBag};

    #[test]
    fn zero_rate_loan_divides_principal_evenly() {
        let bag = ParameterBag::new()
            .with("principal", 120_000.0)
            .with("annual_rate_pct", 0.0)
            .with("tenure_years", 10.0);
        let result = evaluate(&loan_emi(), &bag).expect("zero rate is valid");
        assert_eq!(result.scalar("emi"), Some(1_000.0));
        assert_eq!(result.scalar("total_interest"), Some(0.0));

        let balance = result.series("outstanding_balance").expect("schedule");
        assert_eq!(balance.y.first().copied(), Some(120_000.0));
        assert_eq!(balance.y.last().copied(), Some(0.0));
    }

    #[test]
    fn schedule_is_fully_repaid() {
        let result = evaluate(&loan_emi(), &ParameterBag::new()).expect("defaults evaluate");
        let emi = result.scalar("emi").expect("emi");
        assert!((emi - 2_027.64).abs() < 0.01, "emi = {emi}");
        let balance = result.series("outstanding_balance").expect("schedule");
        assert!(balance.y.last().copied().unwrap_or(f64::NAN).abs() < 1e-6);
        assert!(balance.y.windows(2).all(|pair| pair[1] <= pair[0]));
    }

    #[test]
    fn bmi_bands_follow_who_cutoffs() {
        let normal = evaluate(&bmi(), &ParameterBag::new()).expect("defaults evaluate");
        assert_eq!(normal.label("category"), Some("Normal"));

        let bag = ParameterBag::new().with("weight", 100.0).with("height_cm", 200.0);
        let boundary = evaluate(&bmi(), &bag).expect("evaluates");
        assert_eq!(boundary.scalar("bmi"), Some(25.0));
        assert_eq!(boundary.label("category"), Some("Overweight"));
    }
}
