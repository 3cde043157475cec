//! Phase that requests a `generate` operation, inspects how many
//! generate attempts it has already seen across previous batches, and
//! chains to itself until three attempts have accumulated. Exercises a
//! multi-hop phase chain through the Phase Launcher.

use cadence_core::operation::{GenerationParams, GenerationSettings};
use cadence_core::{OperationRequest, OperationResult};
use cadence_sdk::{PhaseContext, RunWorkflowRequest};

const MAX_ATTEMPTS: usize = 3;

#[tokio::main]
async fn main() {
    let ctx = PhaseContext::from_environment().expect("phase context");

    let attempts = ctx
        .previous_operations
        .iter()
        .filter(|(_, result)| matches!(result, OperationResult::Generate { .. }))
        .count();

    let (operations, next_phase) = if attempts < MAX_ATTEMPTS {
        let request = OperationRequest::Generate {
            params: GenerationParams {
                settings: GenerationSettings {
                    model: "test-model".to_string(),
                    temp: 0.0,
                    n: 1,
                    max_tokens: None,
                    stop: vec![],
                    logprobs: None,
                    cache_key: None,
                },
                template: None,
                template_values: None,
                messages: None,
                functions: None,
                description: None,
                prompt: Some(format!("attempt {}", attempts + 1)),
                extra_parameters: None,
            },
            metadata: None,
        };
        (vec![request], Some("gen_retry".to_string()))
    } else {
        (vec![], None)
    };

    let request = RunWorkflowRequest {
        state_id: ctx.state_id.clone(),
        current_phase: Some("gen_retry".to_string()),
        next_phase,
        delay: None,
        operations,
    };
    ctx.client
        .run_workflow(request)
        .await
        .expect("run_workflow call");
}
