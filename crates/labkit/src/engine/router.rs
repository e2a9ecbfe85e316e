use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::dispatcher::DispatchError;
use super::ledger::{ResultLedger, RunId};
use super::model::ParameterBag;
use super::service::{LabService, LabServiceError};

/// Body accepted by the run endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub parameters: ParameterBag,
    #[serde(default)]
    pub record: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerQuery {
    pub run_id: Option<String>,
}

/// Router builder exposing catalog, evaluation, and ledger endpoints.
pub fn lab_router<L>(service: Arc<LabService<L>>) -> Router
where
    L: ResultLedger + 'static,
{
    Router::new()
        .route("/api/v1/modules", get(list_handler::<L>))
        .route("/api/v1/modules/:name", get(describe_handler::<L>))
        .route("/api/v1/modules/:name/run", post(run_handler::<L>))
        .route("/api/v1/ledger", get(ledger_handler::<L>))
        .with_state(service)
}

pub(crate) async fn list_handler<L>(State(service): State<Arc<LabService<L>>>) -> Response
where
    L: ResultLedger + 'static,
{
    let modules = service.modules();
    (StatusCode::OK, axum::Json(json!({ "modules": modules }))).into_response()
}

pub(crate) async fn describe_handler<L>(
    State(service): State<Arc<LabService<L>>>,
    Path(name): Path<String>,
) -> Response
where
    L: ResultLedger + 'static,
{
    match service.describe(&name) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn run_handler<L>(
    State(service): State<Arc<LabService<L>>>,
    Path(name): Path<String>,
    axum::Json(request): axum::Json<RunRequest>,
) -> Response
where
    L: ResultLedger + 'static,
{
    // A CSV ledger writes to disk while recording.
    let outcome =
        tokio::task::spawn_blocking(move || service.run(&name, &request.parameters, request.record)).await;
    match outcome {
        Ok(Ok(outcome)) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Ok(Err(error)) => error_response(error),
        Err(error) => join_failure(error),
    }
}

pub(crate) async fn ledger_handler<L>(
    State(service): State<Arc<LabService<L>>>,
    Query(query): Query<LedgerQuery>,
) -> Response
where
    L: ResultLedger + 'static,
{
    let run_id = query.run_id.map(RunId);
    let entries = tokio::task::spawn_blocking(move || service.entries(run_id.as_ref())).await;
    match entries {
        Ok(Ok(entries)) => (StatusCode::OK, axum::Json(json!({ "entries": entries }))).into_response(),
        Ok(Err(error)) => error_response(error),
        Err(error) => join_failure(error),
    }
}

fn join_failure(error: tokio::task::JoinError) -> Response {
    error!(%error, "lab task did not complete");
    let payload = json!({
        "error": "request could not be completed",
    });
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
}

fn error_response(error: LabServiceError) -> Response {
    match error {
        LabServiceError::Dispatch(DispatchError::UnknownModule { name, available }) => {
            let payload = json!({
                "error": format!("module '{name}' not found"),
                "available": available,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        LabServiceError::Dispatch(DispatchError::Validation(error)) => {
            let payload = json!({
                "error": error.to_string(),
                "violations": error.violations,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        LabServiceError::Dispatch(error @ DispatchError::Computation { .. }) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        LabServiceError::Ledger(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
