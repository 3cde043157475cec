//! `POST /start_workflow` — grounded on
//! `original_source/workflows/handlers.py::start_workflow_handler`:
//! persist the caller's initial state, synthesize an `init_workflow`
//! exchange, and launch the first phase with that as its only previous
//! result.

use axum::extract::State;
use axum::response::Json;
use cadence_core::operation::{InitWorkflowOutput, InitWorkflowParams};
use cadence_core::{OperationRequest, OperationResult};
use serde::Deserialize;

use crate::error::ServerError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StartWorkflowBody {
    pub state_id: String,
    pub workflow_type: String,
    pub initial_state: serde_json::Value,
    pub first_phase: String,
    #[serde(default)]
    pub settings_path: Option<String>,
}

pub async fn start_workflow(
    State(state): State<AppState>,
    Json(body): Json<StartWorkflowBody>,
) -> Result<Json<serde_json::Value>, ServerError> {
    validate(&body).map_err(ServerError::BadRequest)?;

    let settings_path = body
        .settings_path
        .clone()
        .unwrap_or_else(|| "settings.json".to_string());

    let init_request = OperationRequest::InitWorkflow {
        params: InitWorkflowParams {
            workflow_type: body.workflow_type.clone(),
        },
        metadata: None,
    };
    let init_result = OperationResult::InitWorkflow {
        result: InitWorkflowOutput {
            state_id: body.state_id.clone(),
            settings_path,
        },
        error: None,
        metadata: None,
    };

    // The synthetic init_workflow exchange is durably recorded on disk as
    // the state's first `previous_results` batch, not just threaded
    // through the first phase's stdin — otherwise a workflow whose first
    // phase emits no operations of its own would never have the engine's
    // own bookkeeping reflected in its persisted state.
    let persisted_state = append_previous_results_batch(
        body.initial_state.clone(),
        vec![(init_request.clone(), init_result.clone())],
    );
    state
        .state_store
        .save_raw(&body.state_id, persisted_state)
        .map_err(|err| {
            tracing::error!(error = %err, state_id = %body.state_id, "failed to persist initial state");
            err
        })?;

    state
        .launcher
        .run(&body.first_phase, &body.state_id, vec![(init_request, init_result)])
        .await
        .map_err(|err| {
            tracing::error!(error = %err, phase = %body.first_phase, "first phase failed");
            err
        })?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": format!("workflow {} started", body.state_id),
        "state_id": body.state_id,
    })))
}

/// Appends one `previous_results` batch onto `initial_state`, treating a
/// non-object or object-missing-the-key state as starting from an empty
/// history (per spec.md §8 scenario 1).
fn append_previous_results_batch(
    mut initial_state: serde_json::Value,
    batch: Vec<cadence_core::state::OperationExchange>,
) -> serde_json::Value {
    let batch_value = serde_json::to_value(batch).expect("operation exchanges always serialize");
    if !initial_state.is_object() {
        initial_state = serde_json::json!({});
    }
    let object = initial_state.as_object_mut().expect("coerced to object above");
    match object.get_mut("previous_results").and_then(|v| v.as_array_mut()) {
        Some(existing) => existing.push(batch_value),
        None => {
            object.insert("previous_results".to_string(), serde_json::Value::Array(vec![batch_value]));
        }
    }
    initial_state
}

fn validate(body: &StartWorkflowBody) -> Result<(), String> {
    if body.state_id.trim().is_empty() {
        return Err("state_id is required".to_string());
    }
    if body.workflow_type.trim().is_empty() {
        return Err("workflow_type is required".to_string());
    }
    if body.first_phase.trim().is_empty() {
        return Err("first_phase is required".to_string());
    }
    Ok(())
}
