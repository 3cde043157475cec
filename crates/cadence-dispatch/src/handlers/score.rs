//! `score` / `score_log` operation handlers. LIVE mode would call out to
//! the task's scoring harness (out of scope per spec.md's Non-goals —
//! "scoring math" belongs to the phase program, not the engine); the
//! engine's job is only to carry the request through. SIMULATED mode
//! returns a deterministic zero score so integration tests can assert on
//! the dispatcher plumbing without a real task harness.

use async_trait::async_trait;
use cadence_core::operation::{ScoreLogEntry, ScoreOutput};
use cadence_core::{OperationRequest, OperationResult};

use crate::deps::HandlerDeps;
use crate::registry::OperationHandler;

pub struct SimulatedScoreHandler;
pub struct SimulatedScoreLogHandler;

#[async_trait]
impl OperationHandler for SimulatedScoreHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        _deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let metadata = request.metadata().cloned();
        let mut message = serde_json::Map::new();
        message.insert("score".to_string(), serde_json::json!(0.0));
        Ok(OperationResult::Score {
            result: ScoreOutput { message },
            error: None,
            metadata,
        })
    }
}

#[async_trait]
impl OperationHandler for SimulatedScoreLogHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        _deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let metadata = request.metadata().cloned();
        Ok(OperationResult::ScoreLog {
            result: vec![ScoreLogEntry {
                elapsed_seconds: 0.0,
                score: Some(0.0),
                message: serde_json::Map::new(),
            }],
            error: None,
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoopEventSink;
    use cadence_core::operation::ScoreParams;
    use std::sync::Arc;

    #[tokio::test]
    async fn simulated_score_returns_zero() {
        let deps = HandlerDeps::new(std::env::temp_dir(), Arc::new(NoopEventSink));
        let handler = SimulatedScoreHandler;
        let request = OperationRequest::Score {
            params: ScoreParams::default(),
            metadata: None,
        };
        let result = handler.handle(request, &deps).await.unwrap();
        match result {
            OperationResult::Score { result, .. } => {
                assert_eq!(result.message.get("score"), Some(&serde_json::json!(0.0)));
            }
            _ => panic!("expected score result"),
        }
    }
}
