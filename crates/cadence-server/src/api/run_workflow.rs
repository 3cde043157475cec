//! `POST /run_workflow` — grounded on
//! `original_source/workflows/handlers.py::{handle_workflow,
//! workflow_handler, execute_next_phase}`: dispatch a phase's operation
//! batch (with an engine-injected `save_state` appended), return the
//! results, and — if the phase named a `next_phase` — launch it in the
//! background without waiting for it to finish.

use axum::extract::State;
use axum::response::Json;
use cadence_core::operation::SaveStateParams;
use cadence_core::state::OperationExchange;
use cadence_core::OperationRequest;
use serde::{Deserialize, Serialize};

use crate::error::ServerError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RunWorkflowBody {
    pub state_id: String,
    #[serde(default)]
    pub current_phase: Option<String>,
    #[serde(default)]
    pub next_phase: Option<String>,
    #[serde(default)]
    pub delay: Option<f64>,
    #[serde(default)]
    pub operations: Vec<OperationRequest>,
}

#[derive(Debug, Serialize)]
pub struct RunWorkflowResponse {
    pub updates: Vec<OperationExchange>,
    pub next_phase: Option<String>,
    pub error: Option<String>,
    pub delay: Option<f64>,
}

pub async fn run_workflow(
    State(state): State<AppState>,
    Json(body): Json<RunWorkflowBody>,
) -> Result<Json<RunWorkflowResponse>, ServerError> {
    if let Some(delay) = body.delay {
        if delay > 0.0 {
            tokio::time::sleep(std::time::Duration::from_secs_f64(delay)).await;
        }
    }

    let current_state = state.state_store.load_raw(&body.state_id)?;

    let save_state_op = OperationRequest::SaveState {
        params: SaveStateParams {
            state_id: body.state_id.clone(),
            state: current_state,
            timestamp: chrono::Utc::now().to_rfc3339(),
        },
        metadata: None,
    };

    let mut requests = body.operations.clone();
    for request in requests.iter_mut() {
        stamp_state_id(request, &body.state_id);
    }
    requests.push(save_state_op);

    let results = match state.dispatcher.dispatch(requests.clone(), &state.handler_deps).await {
        Ok(results) => results,
        Err(err) => {
            tracing::error!(error = %err, state_id = %body.state_id, "operation batch failed");
            return Err(err.into());
        }
    };

    let updates: Vec<OperationExchange> = requests.into_iter().zip(results).collect();

    spawn_next_phase_if_any(&state, &body.state_id, &body.next_phase, updates.clone());

    Ok(Json(RunWorkflowResponse {
        updates,
        next_phase: body.next_phase,
        error: None,
        delay: body.delay,
    }))
}

/// Phase programs rarely bother setting `metadata.state_id` on the
/// requests they build (the engine already knows it from the enclosing
/// `/run_workflow` call), but SIMULATED handlers that persist per-state
/// artifacts (logs, mailbox files) key off it. Stamp it in here rather
/// than ask every phase author to remember to set it.
fn stamp_state_id(request: &mut OperationRequest, state_id: &str) {
    let metadata = request.metadata_mut().get_or_insert_with(Default::default);
    if metadata.state_id.is_none() {
        metadata.state_id = Some(state_id.to_string());
    }
}

fn spawn_next_phase_if_any(
    state: &AppState,
    state_id: &str,
    next_phase: &Option<String>,
    updates: Vec<OperationExchange>,
) {
    let Some(next_phase) = next_phase.clone() else {
        return;
    };
    let launcher = state.launcher.clone();
    let state_id = state_id.to_string();
    tokio::spawn(async move {
        if let Err(err) = launcher.run(&next_phase, &state_id, updates).await {
            tracing::error!(error = %err, phase = %next_phase, state_id = %state_id, "chained phase failed");
        }
    });
}
