//! `generate` operation handlers: the only handler that talks to the LLM
//! gateway (spec.md explicitly keeps the gateway client itself out of
//! scope — this is a thin `reqwest` caller over whatever endpoint
//! `HandlerDeps::llm_gateway_url` points at).

use async_trait::async_trait;
use cadence_core::operation::{GenerationOutput, GenerationParams, ModelOutput};
use cadence_core::{OperationRequest, OperationResult};
use serde::Serialize;

use crate::deps::HandlerDeps;
use crate::registry::OperationHandler;

pub struct LiveGenerateHandler;
pub struct SimulatedGenerateHandler;

fn params_of(request: &OperationRequest) -> &GenerationParams {
    match request {
        OperationRequest::Generate { params, .. } => params,
        _ => unreachable!("dispatcher only routes generate requests to generate handlers"),
    }
}

/// Only a gateway that is overloaded (`503`) or explicitly asking
/// clients to back off (`529`) is worth a retry; any other failure is
/// surfaced as an error-bearing result immediately.
fn is_retryable_status(code: u16) -> bool {
    matches!(code, 503 | 529)
}

/// Exponential backoff with jitter for retrying `503`/`529` gateway
/// responses, per spec.md §6. No `rand` dependency in the stack, so the
/// jitter component is seeded off the wall clock rather than a PRNG.
fn backoff_with_jitter(attempt: u32) -> std::time::Duration {
    let base_ms = 200u64 * 2u64.pow(attempt);
    let jitter_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_millis()) % 100)
        .unwrap_or(0);
    std::time::Duration::from_millis(base_ms + jitter_ms)
}

#[derive(Serialize)]
struct GatewayRequestBody<'a> {
    settings: &'a cadence_core::operation::GenerationSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: &'a Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    messages: &'a Option<Vec<serde_json::Value>>,
}

#[async_trait]
impl OperationHandler for LiveGenerateHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let params = params_of(&request);
        let metadata = request.metadata().cloned();

        let url = deps
            .llm_gateway_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no llm_gateway_url configured for live generate"))?;

        let body = GatewayRequestBody {
            settings: &params.settings,
            prompt: &params.prompt,
            messages: &params.messages,
        };

        let started = std::time::Instant::now();
        let mut attempt = 0u32;
        let response = loop {
            attempt += 1;
            let resp = match deps.http_client.post(url).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    return Ok(OperationResult::Generate {
                        result: GenerationOutput {
                            error: Some(format!("generate request failed: {e}")),
                            duration_ms: Some(started.elapsed().as_millis() as u64),
                            ..Default::default()
                        },
                        error: None,
                        metadata,
                    });
                }
            };
            if is_retryable_status(resp.status().as_u16()) && attempt < 5 {
                tracing::warn!(attempt, status = %resp.status(), "generate request retrying");
                tokio::time::sleep(backoff_with_jitter(attempt)).await;
                continue;
            }
            break resp;
        };

        let duration_ms = started.elapsed().as_millis() as u64;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response.text().await.unwrap_or_default();
            return Ok(OperationResult::Generate {
                result: GenerationOutput {
                    error: Some(format!("gateway returned {status}: {body_text}")),
                    duration_ms: Some(duration_ms),
                    ..Default::default()
                },
                error: None,
                metadata,
            });
        }

        let parsed: GatewayResponseBody = response.json().await?;

        Ok(OperationResult::Generate {
            result: GenerationOutput {
                error: None,
                non_blocking_errors: None,
                outputs: Some(parsed.outputs),
                n_completion_tokens_spent: parsed.n_completion_tokens_spent,
                n_prompt_tokens_spent: parsed.n_prompt_tokens_spent,
                cost: parsed.cost,
                duration_ms: Some(duration_ms),
            },
            error: None,
            metadata,
        })
    }
}

#[derive(serde::Deserialize)]
struct GatewayResponseBody {
    outputs: Vec<ModelOutput>,
    #[serde(default)]
    n_completion_tokens_spent: Option<u64>,
    #[serde(default)]
    n_prompt_tokens_spent: Option<u64>,
    #[serde(default)]
    cost: Option<f64>,
}

#[async_trait]
impl OperationHandler for SimulatedGenerateHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        _deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let params = params_of(&request);
        let metadata = request.metadata().cloned();
        let echoed = params
            .prompt
            .clone()
            .unwrap_or_else(|| "[simulated completion]".to_string());
        Ok(OperationResult::Generate {
            result: GenerationOutput {
                error: None,
                non_blocking_errors: None,
                outputs: Some(vec![ModelOutput {
                    completion: format!("[simulated] {echoed}"),
                    function_call: None,
                    logprobs: None,
                }]),
                n_completion_tokens_spent: Some(0),
                n_prompt_tokens_spent: Some(0),
                cost: Some(0.0),
                duration_ms: Some(0),
            },
            error: None,
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoopEventSink;
    use cadence_core::operation::GenerationSettings;
    use std::sync::Arc;

    fn deps() -> HandlerDeps {
        HandlerDeps::new(std::env::temp_dir(), Arc::new(NoopEventSink))
    }

    fn generate_request(prompt: &str) -> OperationRequest {
        OperationRequest::Generate {
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
                prompt: Some(prompt.to_string()),
                extra_parameters: None,
            },
            metadata: None,
        }
    }

    #[tokio::test]
    async fn simulated_generate_echoes_prompt_with_zero_cost() {
        let handler = SimulatedGenerateHandler;
        let result = handler
            .handle(generate_request("hello"), &deps())
            .await
            .unwrap();
        match result {
            OperationResult::Generate { result, .. } => {
                assert_eq!(result.cost, Some(0.0));
                assert!(result.outputs.unwrap()[0].completion.contains("hello"));
            }
            _ => panic!("expected generate result"),
        }
    }

    #[tokio::test]
    async fn live_generate_without_gateway_url_errors() {
        let handler = LiveGenerateHandler;
        let err = handler
            .handle(generate_request("hello"), &deps())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("llm_gateway_url"));
    }

    #[test]
    fn only_503_and_529_are_retryable() {
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(529));
        assert!(!is_retryable_status(500));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(200));
    }

    #[tokio::test]
    async fn live_generate_reports_transport_failure_without_retrying() {
        let mut handler_deps = deps();
        handler_deps.llm_gateway_url = Some("http://127.0.0.1:0/generate".to_string());
        let handler = LiveGenerateHandler;
        let result = handler
            .handle(generate_request("hello"), &handler_deps)
            .await
            .unwrap();
        match result {
            OperationResult::Generate { result, .. } => {
                assert!(result.error.unwrap().contains("generate request failed"));
            }
            _ => panic!("expected generate result"),
        }
    }
}
