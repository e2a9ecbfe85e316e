use crate::infra::{build_lab, parse_param, Lab};
use chrono::Local;
use clap::Args;
use labkit::catalog;
use labkit::config::AppConfig;
use labkit::engine::{
    DispatchError, LabServiceError, LedgerEntry, ModelView, ModuleSummary, ParamKind, ParamValue,
    ParameterBag, RunId, RunOutcome, Series, Suite,
};
use labkit::error::AppError;
use std::fmt::Write as _;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct ModulesListArgs {
    /// Only list models of one suite (calculus, civil, electronics, optics, programming)
    #[arg(long, value_parser = parse_suite)]
    pub(crate) suite: Option<Suite>,
}

#[derive(Args, Debug)]
pub(crate) struct RunArgs {
    /// Model name, e.g. `slump_test`
    pub(crate) name: String,
    /// Parameter override as key=value; repeat for several parameters
    #[arg(long = "param", value_parser = parse_param)]
    pub(crate) params: Vec<(String, ParamValue)>,
    /// Append the result to the configured ledger
    #[arg(long)]
    pub(crate) record: bool,
    /// Number of points to print from each series
    #[arg(long, default_value_t = 5)]
    pub(crate) preview: usize,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RunAllArgs {
    /// Append every result to the configured ledger
    #[arg(long)]
    pub(crate) record: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct LedgerArgs {
    /// Only show rows of one run, e.g. `run-000003`
    #[arg(long)]
    pub(crate) run_id: Option<String>,
}

fn parse_suite(raw: &str) -> Result<Suite, String> {
    Suite::parse(raw).ok_or_else(|| {
        format!("unknown suite '{raw}' (expected calculus, civil, electronics, optics or programming)")
    })
}

pub(crate) fn show_modules(args: ModulesListArgs) -> Result<(), AppError> {
    let registry = catalog::standard_registry()?;
    let modules: Vec<ModuleSummary> = registry
        .iter()
        .map(|model| model.summary_view())
        .filter(|summary| args.suite.map_or(true, |suite| summary.suite == suite))
        .collect();

    print!("{}", render_modules(&modules));
    Ok(())
}

pub(crate) fn show_module(name: &str) -> Result<(), AppError> {
    let registry = catalog::standard_registry()?;
    match registry.get(name) {
        Ok(model) => {
            print!("{}", render_model(&model.view()));
            Ok(())
        }
        Err(missing) => {
            eprintln!("Available modules: {}", missing.available.join(", "));
            Err(DispatchError::from(missing).into())
        }
    }
}

pub(crate) fn run_module(args: RunArgs) -> Result<(), AppError> {
    let RunArgs {
        name,
        params,
        record,
        preview,
    } = args;

    let config = AppConfig::load()?;
    let lab = build_lab(&config.ledger)?;
    let bag: ParameterBag = params.into_iter().collect();

    match lab.run(&name, &bag, record) {
        Ok(outcome) => {
            print!("{}", render_outcome(&outcome, preview));
            if record {
                warn_if_ephemeral(&lab);
            }
            Ok(())
        }
        Err(err) => {
            report_failure(&err);
            Err(err.into())
        }
    }
}

pub(crate) fn run_all(args: RunAllArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let lab = build_lab(&config.ledger)?;

    println!("Running every lab suite with default parameters");
    let mut failures = 0usize;
    for suite in Suite::ALL {
        let models = lab.dispatcher().registry().by_suite(suite);
        if models.is_empty() {
            continue;
        }

        println!("\n== {} ==", suite.label());
        for model in models {
            match lab.run(model.name, &ParameterBag::new(), args.record) {
                Ok(outcome) => print!("{}", render_outcome(&outcome, 0)),
                Err(err) => {
                    failures += 1;
                    println!("{}: failed ({err})", model.display_name);
                }
            }
        }
    }

    println!(
        "\nCompleted {} modules, {failures} failed",
        lab.dispatcher().registry().len()
    );
    if args.record {
        warn_if_ephemeral(&lab);
    }
    Ok(())
}

pub(crate) fn show_ledger(args: LedgerArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let lab = build_lab(&config.ledger)?;
    if !lab.ledger().is_persistent() {
        println!("Ledger is in-memory for this process; set APP_LEDGER_PATH to keep results.");
    }

    let run_id = args.run_id.map(RunId);
    let entries = lab.entries(run_id.as_ref())?;
    print!("{}", render_entries(&entries));
    Ok(())
}

fn warn_if_ephemeral(lab: &Arc<Lab>) {
    if !lab.ledger().is_persistent() {
        println!("Note: the ledger is in-memory, so this recording ends with the process.");
    }
}

fn report_failure(err: &LabServiceError) {
    match err {
        LabServiceError::Dispatch(DispatchError::UnknownModule { available, .. }) => {
            eprintln!("Available modules: {}", available.join(", "));
        }
        LabServiceError::Dispatch(DispatchError::Validation(validation)) => {
            eprintln!("Rejected parameters:");
            for violation in &validation.violations {
                eprintln!("  - {violation}");
            }
        }
        LabServiceError::Dispatch(DispatchError::Computation { .. }) | LabServiceError::Ledger(_) => {}
    }
}

pub(crate) fn render_modules(modules: &[ModuleSummary]) -> String {
    let mut out = String::new();
    if modules.is_empty() {
        let _ = writeln!(out, "No modules registered");
        return out;
    }

    let mut current: Option<Suite> = None;
    for module in modules {
        if current != Some(module.suite) {
            let _ = writeln!(out, "{}", module.suite_label);
            current = Some(module.suite);
        }
        let _ = writeln!(out, "  {:<20} {}", module.name, module.display_name);
    }
    out
}

pub(crate) fn render_model(view: &ModelView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", view.display_name, view.name);
    if !view.summary.is_empty() {
        let _ = writeln!(out, "{}", view.summary);
    }
    if !view.formula.is_empty() {
        let _ = writeln!(out, "Formula: {}", view.formula);
    }

    let _ = writeln!(out, "Parameters:");
    for spec in &view.parameters {
        let unit = spec.unit.map(|unit| format!(" {unit}")).unwrap_or_default();
        let domain = match &spec.kind {
            ParamKind::Number { min, max } => format!("[{min}, {max}]{unit}"),
            ParamKind::Choice { allowed } => allowed.join(" | "),
            ParamKind::Flag => "true | false".to_string(),
        };
        let _ = writeln!(
            out,
            "  {:<20} {} {} (default {})",
            spec.name, spec.label, domain, spec.default
        );
    }

    if !view.constraints.is_empty() {
        let _ = writeln!(out, "Constraints:");
        for constraint in &view.constraints {
            let _ = writeln!(out, "  - {constraint}");
        }
    }

    let _ = writeln!(out, "Outputs:");
    for output in &view.outputs {
        let unit = output.unit.map(|unit| format!(" [{unit}]")).unwrap_or_default();
        let _ = writeln!(out, "  {:<20} {} {}{unit}", output.name, output.kind, output.label);
    }

    for classification in &view.classifications {
        let _ = writeln!(
            out,
            "Classification '{}' of {}:",
            classification.name, classification.source
        );
        for rule in classification.rules.rules() {
            let _ = writeln!(out, "  {:<14} {}", rule.predicate.to_string(), rule.label);
        }
    }
    out
}

pub(crate) fn render_outcome(outcome: &RunOutcome, preview: usize) -> String {
    let result = &outcome.result;
    let mut out = String::new();

    match &outcome.run_id {
        Some(run_id) => {
            let _ = writeln!(out, "{} (recorded as {run_id})", result.module_name);
        }
        None => {
            let _ = writeln!(out, "{}", result.module_name);
        }
    }

    let inputs: Vec<String> = result
        .inputs
        .iter()
        .map(|input| {
            let marker = if input.defaulted { "*" } else { "" };
            format!("{}={}{marker}", input.name, input.value)
        })
        .collect();
    let _ = writeln!(out, "  Inputs: {}", inputs.join(", "));

    for scalar in result.scalars.iter() {
        let unit = scalar.unit.as_deref().map(|unit| format!(" {unit}")).unwrap_or_default();
        let _ = writeln!(out, "  {}: {:.4}{unit}", scalar.label, scalar.value);
    }

    for classification in &result.classifications {
        let _ = writeln!(out, "  {}: {}", classification.name, classification.label);
    }

    for note in &result.notes {
        let _ = writeln!(out, "  Note: {note}");
    }

    if preview > 0 {
        for series in &result.series {
            render_series_preview(&mut out, series, preview);
        }
    }
    out
}

fn render_series_preview(out: &mut String, series: &Series, preview: usize) {
    let x_unit = series
        .x_unit
        .as_deref()
        .map(|unit| format!(" ({unit})"))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "  {} vs {}{x_unit}, {} points:",
        series.label,
        series.x_label,
        series.len()
    );
    for index in preview_indices(series.len(), preview) {
        let _ = writeln!(out, "    {:>12.4} {:>14.4}", series.x[index], series.y[index]);
    }
}

/// Evenly spaced sample positions that always include both ends.
pub(crate) fn preview_indices(len: usize, count: usize) -> Vec<usize> {
    if len == 0 || count == 0 {
        return Vec::new();
    }
    if count >= len {
        return (0..len).collect();
    }
    if count == 1 {
        return vec![0];
    }

    let mut indices: Vec<usize> = (0..count)
        .map(|step| step * (len - 1) / (count - 1))
        .collect();
    indices.dedup();
    indices
}

pub(crate) fn render_entries(entries: &[LedgerEntry]) -> String {
    let mut out = String::new();
    if entries.is_empty() {
        let _ = writeln!(out, "No recorded results");
        return out;
    }

    let mut current: Option<&RunId> = None;
    for entry in entries {
        if current != Some(&entry.run_id) {
            let recorded = entry.recorded_at.with_timezone(&Local);
            let _ = writeln!(
                out,
                "{} {} {}",
                entry.run_id,
                entry.module_name,
                recorded.format("%Y-%m-%d %H:%M:%S")
            );
            current = Some(&entry.run_id);
        }
        let _ = writeln!(out, "  {:<22} {}", entry.parameter_name, entry.value);
    }
    out
}
