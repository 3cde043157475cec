//! Runs a batch of operation requests against the handler registry and
//! reassembles results in the caller's original order.
//!
//! Grounded on `original_source/operation_handler.py::handle_operations`,
//! generalized per spec.md §4.D/§5: every non-`get_usage`/`save_state`
//! operation runs concurrently (tier 1), the batch's `get_usage`
//! operation (at most one) runs after tier 1 completes (tier 2), and
//! every `save_state` operation runs after tier 2, in relative input
//! order (tier 3) — but the final `Vec<OperationResult>` is indexed by
//! the *original* input position, not by which tier produced it.

use std::sync::Arc;

use cadence_core::{OperationKind, OperationRequest, OperationResult};
use futures_util::future::join_all;

use crate::deps::HandlerDeps;
use crate::error::{DispatchError, Result};
use crate::events::event_for;
use crate::mode::ProcessingMode;
use crate::registry::HandlerRegistry;

pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    mode: ProcessingMode,
}

impl Dispatcher {
    pub fn new(registry: Arc<HandlerRegistry>, mode: ProcessingMode) -> Self {
        Self { registry, mode }
    }

    pub async fn dispatch(
        &self,
        requests: Vec<OperationRequest>,
        deps: &HandlerDeps,
    ) -> Result<Vec<OperationResult>> {
        let mut slots: Vec<Option<OperationResult>> = requests.iter().map(|_| None).collect();

        let mut primary_idx = Vec::new();
        let mut usage_idx = Vec::new();
        let mut save_state_idx = Vec::new();
        for (i, req) in requests.iter().enumerate() {
            match req.kind() {
                OperationKind::GetUsage => usage_idx.push(i),
                OperationKind::SaveState => save_state_idx.push(i),
                _ => primary_idx.push(i),
            }
        }

        // Tier 1: everything else, concurrently.
        let primary_futs = primary_idx.iter().map(|&i| self.run_one(&requests[i], deps));
        for (i, result) in primary_idx.iter().zip(join_all(primary_futs).await) {
            slots[*i] = Some(result?);
        }

        // Tier 2: get_usage, after tier 1 has landed (it typically reads
        // the effects of actions/bash/generate calls in the same batch).
        for &i in &usage_idx {
            let result = self.run_one(&requests[i], deps).await?;
            slots[i] = Some(result);
        }

        // Tier 3: save_state, after usage accounting is up to date.
        for &i in &save_state_idx {
            let result = self.run_one(&requests[i], deps).await?;
            slots[i] = Some(result);
        }

        Ok(slots
            .into_iter()
            .map(|s| s.expect("every index is populated by exactly one tier"))
            .collect())
    }

    async fn run_one(
        &self,
        request: &OperationRequest,
        deps: &HandlerDeps,
    ) -> Result<OperationResult> {
        let kind = request.kind();
        let handler = self.registry.get(kind, self.mode)?;
        let result = handler
            .handle(request.clone(), deps)
            .await
            .map_err(|source| DispatchError::HandlerFailed { kind, source })?;

        if self.mode == ProcessingMode::Simulated {
            let event = event_for(request, &result, "completed", chrono::Utc::now());
            deps.event_sink.emit(event);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cadence_core::operation::{
        BashOutput, BashParams, GetUsageOutput, GetUsageParams, RunUsage, SaveStateOutput,
        SaveStateParams,
    };
    use parking_lot::Mutex;

    use crate::events::NoopEventSink;
    use crate::registry::OperationHandler;

    /// Records the order in which `.handle` is invoked, so tests can
    /// assert tier ordering without depending on wall-clock timing.
    struct OrderRecordingHandler {
        kind: OperationKind,
        order: Arc<Mutex<Vec<OperationKind>>>,
    }

    #[async_trait]
    impl OperationHandler for OrderRecordingHandler {
        async fn handle(
            &self,
            request: OperationRequest,
            _deps: &HandlerDeps,
        ) -> anyhow::Result<OperationResult> {
            self.order.lock().push(self.kind);
            let result = match request {
                OperationRequest::Bash { .. } => OperationResult::Bash {
                    result: BashOutput {
                        stdout: String::new(),
                        stderr: String::new(),
                        status: Some(0),
                    },
                    error: None,
                    metadata: None,
                },
                OperationRequest::GetUsage { .. } => OperationResult::GetUsage {
                    result: GetUsageOutput {
                        checkpoint: None,
                        is_paused: false,
                        usage: RunUsage::default(),
                        usage_limits: RunUsage::default(),
                    },
                    error: None,
                    metadata: None,
                },
                OperationRequest::SaveState { .. } => OperationResult::SaveState {
                    result: SaveStateOutput {
                        status: "success".to_string(),
                        message: "saved".to_string(),
                        snapshot_path: "state.json".to_string(),
                    },
                    error: None,
                    metadata: None,
                },
                other => panic!("unexpected request in test: {:?}", other.kind()),
            };
            Ok(result)
        }
    }

    fn deps() -> HandlerDeps {
        HandlerDeps::new(std::env::temp_dir(), Arc::new(NoopEventSink))
    }

    #[tokio::test]
    async fn results_preserve_original_input_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        registry.register_both(
            OperationKind::Bash,
            Arc::new(OrderRecordingHandler {
                kind: OperationKind::Bash,
                order: order.clone(),
            }),
        );
        registry.register_both(
            OperationKind::GetUsage,
            Arc::new(OrderRecordingHandler {
                kind: OperationKind::GetUsage,
                order: order.clone(),
            }),
        );
        registry.register_both(
            OperationKind::SaveState,
            Arc::new(OrderRecordingHandler {
                kind: OperationKind::SaveState,
                order: order.clone(),
            }),
        );
        let dispatcher = Dispatcher::new(Arc::new(registry), ProcessingMode::Simulated);

        // Input order: save_state, get_usage, bash — deliberately
        // scrambled to prove tier ordering is independent of input order.
        let requests = vec![
            OperationRequest::SaveState {
                params: SaveStateParams {
                    state_id: "s1".to_string(),
                    state: serde_json::json!({}),
                    timestamp: "now".to_string(),
                },
                metadata: None,
            },
            OperationRequest::GetUsage {
                params: GetUsageParams {},
                metadata: None,
            },
            OperationRequest::Bash {
                params: BashParams {
                    command: "echo hi".to_string(),
                    timeout: None,
                    agent_id: None,
                    extra: Default::default(),
                },
                metadata: None,
            },
        ];

        let results = dispatcher.dispatch(requests, &deps()).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].kind(), OperationKind::SaveState);
        assert_eq!(results[1].kind(), OperationKind::GetUsage);
        assert_eq!(results[2].kind(), OperationKind::Bash);

        // Execution order: bash (tier 1) before get_usage (tier 2) before
        // save_state (tier 3), regardless of their position in the input.
        let executed = order.lock().clone();
        assert_eq!(
            executed,
            vec![OperationKind::Bash, OperationKind::GetUsage, OperationKind::SaveState]
        );
    }

    #[tokio::test]
    async fn unregistered_handler_surfaces_unsupported_mode() {
        let registry = HandlerRegistry::new();
        let dispatcher = Dispatcher::new(Arc::new(registry), ProcessingMode::Live);
        let requests = vec![OperationRequest::Bash {
            params: BashParams {
                command: "echo hi".to_string(),
                timeout: None,
                agent_id: None,
                extra: Default::default(),
            },
            metadata: None,
        }];
        let err = dispatcher.dispatch(requests, &deps()).await.unwrap_err();
        assert!(matches!(err, DispatchError::UnsupportedMode { .. }));
    }
}
