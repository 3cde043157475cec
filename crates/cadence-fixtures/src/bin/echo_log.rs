//! Phase that emits one `log` operation per previous result it received,
//! then chains to itself once with no operations (so the state
//! eventually settles). Used to exercise the dispatcher's handling of a
//! non-empty operation batch and the engine's auto-appended save_state.

use cadence_core::operation::LogParams;
use cadence_core::{OperationRequest, OperationResult};
use cadence_sdk::{PhaseContext, RunWorkflowRequest};

#[tokio::main]
async fn main() {
    let ctx = PhaseContext::from_environment().expect("phase context");

    let already_logged = ctx
        .previous_operations
        .iter()
        .any(|(_, result)| matches!(result, OperationResult::Log { .. }));

    let operations = if already_logged {
        vec![]
    } else {
        vec![OperationRequest::Log {
            params: LogParams {
                content: serde_json::json!("hello from echo_log"),
                level: "INFO".to_string(),
            },
            metadata: None,
        }]
    };

    let next_phase = if already_logged {
        None
    } else {
        Some("echo_log".to_string())
    };

    let request = RunWorkflowRequest {
        state_id: ctx.state_id.clone(),
        current_phase: Some("echo_log".to_string()),
        next_phase,
        delay: None,
        operations,
    };
    ctx.client
        .run_workflow(request)
        .await
        .expect("run_workflow call");
}
