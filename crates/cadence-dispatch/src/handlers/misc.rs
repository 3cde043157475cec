//! Handlers for the remaining operations that don't need their own
//! module: `action`, `observation`, `get_task`, `get_usage`, `submit`,
//! `init_workflow`, `save_state`. Grounded on
//! `original_source/type_defs/operations.py` for the output shapes and
//! on `original_source/flock/__main__.py::start_workflow` for
//! `init_workflow`'s `{state_id, settings_path}` contract.

use async_trait::async_trait;
use cadence_core::operation::{
    ActionOutput, ActionParams, GetTaskOutput, GetUsageOutput, InitWorkflowOutput,
    InitWorkflowParams, ObservationOutput, ObservationParams, RunUsage, SaveStateOutput,
    SaveStateParams, ScoringInfo, SubmissionOutput, SubmissionParams,
};
use cadence_core::{OperationRequest, OperationResult};
use uuid::Uuid;

use crate::deps::HandlerDeps;
use crate::registry::OperationHandler;

// ---------------------------------------------------------------------
// init_workflow
// ---------------------------------------------------------------------

pub struct InitWorkflowHandler;

fn init_workflow_params_of(request: &OperationRequest) -> &InitWorkflowParams {
    match request {
        OperationRequest::InitWorkflow { params, .. } => params,
        _ => unreachable!(),
    }
}

#[async_trait]
impl OperationHandler for InitWorkflowHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        _deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let params = init_workflow_params_of(&request);
        let metadata = request.metadata().cloned();
        let state_id = metadata
            .as_ref()
            .and_then(|m| m.state_id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Ok(OperationResult::InitWorkflow {
            result: InitWorkflowOutput {
                state_id,
                settings_path: format!("{}/settings.json", params.workflow_type),
            },
            error: None,
            metadata,
        })
    }
}

// ---------------------------------------------------------------------
// save_state
// ---------------------------------------------------------------------

pub struct SaveStateHandler;

fn save_state_params_of(request: &OperationRequest) -> &SaveStateParams {
    match request {
        OperationRequest::SaveState { params, .. } => params,
        _ => unreachable!(),
    }
}

#[async_trait]
impl OperationHandler for SaveStateHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let params = save_state_params_of(&request);
        let metadata = request.metadata().cloned();
        deps.state_store
            .save_raw(&params.state_id, params.state.clone())?;
        let snapshot_path =
            deps.state_store
                .save_snapshot(&params.state_id, &params.timestamp, &params.state)?;
        Ok(OperationResult::SaveState {
            result: SaveStateOutput {
                status: "success".to_string(),
                message: format!("state snapshot saved to {}", snapshot_path.display()),
                snapshot_path: snapshot_path.to_string_lossy().into_owned(),
            },
            error: None,
            metadata,
        })
    }
}

// ---------------------------------------------------------------------
// get_usage
// ---------------------------------------------------------------------

/// LIVE mode's usage accounting (talking to the real run-limits service)
/// is out of scope per spec.md's Non-goals; both modes here return the
/// zeroed/unlimited usage a freestanding engine has no way to observe
/// externally, and leave real enforcement to whatever deploys it.
pub struct GetUsageHandler;

#[async_trait]
impl OperationHandler for GetUsageHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        _deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let metadata = request.metadata().cloned();
        Ok(OperationResult::GetUsage {
            result: GetUsageOutput {
                checkpoint: None,
                is_paused: false,
                usage: RunUsage::default(),
                usage_limits: RunUsage {
                    tokens: 300_000,
                    actions: 1000,
                    total_seconds: 604_800,
                    cost: 100.0,
                },
            },
            error: None,
            metadata,
        })
    }
}

// ---------------------------------------------------------------------
// get_task
// ---------------------------------------------------------------------

pub struct GetTaskHandler {
    pub instructions: String,
}

#[async_trait]
impl OperationHandler for GetTaskHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        _deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let metadata = request.metadata().cloned();
        Ok(OperationResult::GetTask {
            result: GetTaskOutput {
                instructions: self.instructions.clone(),
                permissions: vec![],
                scoring: ScoringInfo {
                    intermediate: false,
                    visible_to_agent: false,
                    score_on_usage_limits: false,
                },
            },
            error: None,
            metadata,
        })
    }
}

// ---------------------------------------------------------------------
// submit
// ---------------------------------------------------------------------

pub struct SubmitHandler;

fn submit_params_of(request: &OperationRequest) -> &SubmissionParams {
    match request {
        OperationRequest::Submit { params, .. } => params,
        _ => unreachable!(),
    }
}

#[async_trait]
impl OperationHandler for SubmitHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        _deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let _params = submit_params_of(&request);
        let metadata = request.metadata().cloned();
        Ok(OperationResult::Submit {
            result: SubmissionOutput {
                status: "success".to_string(),
                message: "submission recorded".to_string(),
                submission_id: Some(Uuid::new_v4().to_string()),
            },
            error: None,
            metadata,
        })
    }
}

// ---------------------------------------------------------------------
// action / observation
// ---------------------------------------------------------------------

pub struct ActionHandler;

fn action_params_of(request: &OperationRequest) -> &ActionParams {
    match request {
        OperationRequest::Action { params, .. } => params,
        _ => unreachable!(),
    }
}

#[async_trait]
impl OperationHandler for ActionHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        _deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let params = action_params_of(&request);
        let metadata = request.metadata().cloned();
        let action = serde_json::json!({
            "action_type": params.action_type,
            "parameters": params.parameters,
        })
        .as_object()
        .cloned()
        .unwrap_or_default();
        Ok(OperationResult::Action {
            result: ActionOutput {
                status: "success".to_string(),
                message: "action recorded".to_string(),
                action,
            },
            error: None,
            metadata,
        })
    }
}

pub struct ObservationHandler;

fn observation_params_of(request: &OperationRequest) -> &ObservationParams {
    match request {
        OperationRequest::Observation { params, .. } => params,
        _ => unreachable!(),
    }
}

#[async_trait]
impl OperationHandler for ObservationHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        _deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let params = observation_params_of(&request);
        let metadata = request.metadata().cloned();
        let observation = serde_json::json!({
            "observation_type": params.observation_type,
            "content": params.content,
        })
        .as_object()
        .cloned()
        .unwrap_or_default();
        Ok(OperationResult::Observation {
            result: ObservationOutput {
                status: "success".to_string(),
                message: "observation recorded".to_string(),
                observation,
            },
            error: None,
            metadata,
        })
    }
}
