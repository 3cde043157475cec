//! Minimal phase: posts an empty operation batch and chains to no
//! further phase. Used to exercise the Phase Launcher's happy path.

use cadence_sdk::{PhaseContext, RunWorkflowRequest};

#[tokio::main]
async fn main() {
    let ctx = PhaseContext::from_environment().expect("phase context");
    let request = RunWorkflowRequest {
        state_id: ctx.state_id.clone(),
        current_phase: Some("noop".to_string()),
        next_phase: None,
        delay: None,
        operations: vec![],
    };
    ctx.client
        .run_workflow(request)
        .await
        .expect("run_workflow call");
}
