//! Parametric model evaluation engine for the engineering lab dashboard.
//!
//! Every lab tool is described once as a [`engine::ModelDefinition`]: a declared
//! parameter schema, scalar and sampled-series outputs, and optional
//! classification rules. The [`engine::Dispatcher`] resolves a model from the
//! [`engine::ModuleRegistry`], the evaluator validates and computes it, and the
//! caller decides whether to render the result or append it to a
//! [`engine::ResultLedger`].

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod telemetry;
