//! Static catalog of the shipped lab tools.
//!
//! Each suite module exposes `models()`; [`standard_registry`] registers all of
//! them in suite order and fails on the first structural problem.

mod calculus;
mod civil;
mod electronics;
mod optics;
mod programming;

use tracing::info;

use crate::engine::evaluation::ComputationError;
use crate::engine::{ModelDefinition, ModuleRegistry, RegistrationError};

/// Every catalog model, grouped by suite in listing order.
pub fn models() -> Vec<ModelDefinition> {
    let mut models = Vec::new();
    models.extend(calculus::models());
    models.extend(civil::models());
    models.extend(electronics::models());
    models.extend(optics::models());
    models.extend(programming::models());
    models
}

/// Raised when a choice string reaches a formula that has no case for it.
fn unknown_choice(parameter: &str, value: &str) -> ComputationError {
    ComputationError::Undefined {
        quantity: parameter.to_string(),
        reason: format!("'{value}' is not a recognised option"),
    }
}

pub fn standard_registry() -> Result<ModuleRegistry, RegistrationError> {
    let mut registry = ModuleRegistry::new();
    for model in models() {
        registry.register(model)?;
    }

    info!(modules = registry.len(), "catalog registered");
    Ok(registry)
}
