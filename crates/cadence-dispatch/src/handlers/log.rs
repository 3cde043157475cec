//! `log` / `log_with_attributes` operation handlers.
//!
//! Grounded on `original_source/flock/handlers/log.py`: LIVE mode routes
//! through the engine's own `tracing` span (there is no separate
//! transcript service in scope here, per spec.md's Non-goals); SIMULATED
//! mode appends JSONL records under `<states_dir>/<id>/logs/<date>.jsonl`
//! so integration tests can assert on emitted log lines without a live
//! backend.

use std::io::Write;

use async_trait::async_trait;
use cadence_core::operation::{LogOutput, LogParams, LogWithAttributesOutput, LogWithAttributesParams};
use cadence_core::{OperationRequest, OperationResult};

use crate::deps::HandlerDeps;
use crate::registry::OperationHandler;

pub struct LiveLogHandler;
pub struct SimulatedLogHandler;
pub struct LiveLogWithAttributesHandler;
pub struct SimulatedLogWithAttributesHandler;

fn log_params_of(request: &OperationRequest) -> &LogParams {
    match request {
        OperationRequest::Log { params, .. } => params,
        _ => unreachable!("dispatcher only routes log requests to log handlers"),
    }
}

fn log_with_attrs_params_of(request: &OperationRequest) -> &LogWithAttributesParams {
    match request {
        OperationRequest::LogWithAttributes { params, .. } => params,
        _ => unreachable!("dispatcher only routes log_with_attributes requests to this handler"),
    }
}

fn append_jsonl(deps: &HandlerDeps, state_id: &str, record: &serde_json::Value) -> anyhow::Result<()> {
    let date = chrono::Utc::now().format("%Y-%m-%d");
    let dir = deps.states_dir.join(state_id).join("logs");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{date}.jsonl"));
    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", serde_json::to_string(record)?)?;
    Ok(())
}

#[async_trait]
impl OperationHandler for LiveLogHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        _deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let params = log_params_of(&request);
        let metadata = request.metadata().cloned();
        match params.level.to_ascii_uppercase().as_str() {
            "ERROR" => tracing::error!(content = %params.content, "phase log"),
            "WARNING" | "WARN" => tracing::warn!(content = %params.content, "phase log"),
            "DEBUG" => tracing::debug!(content = %params.content, "phase log"),
            _ => tracing::info!(content = %params.content, "phase log"),
        }
        let timestamp = chrono::Utc::now().to_rfc3339();
        Ok(OperationResult::Log {
            result: LogOutput {
                status: "success".to_string(),
                message: "logged".to_string(),
                timestamp,
            },
            error: None,
            metadata,
        })
    }
}

#[async_trait]
impl OperationHandler for SimulatedLogHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let params = log_params_of(&request);
        let metadata = request.metadata().cloned();
        let state_id = metadata
            .as_ref()
            .and_then(|m| m.state_id.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let timestamp = chrono::Utc::now().to_rfc3339();
        append_jsonl(
            deps,
            &state_id,
            &serde_json::json!({ "level": params.level, "content": params.content, "timestamp": timestamp }),
        )?;
        Ok(OperationResult::Log {
            result: LogOutput {
                status: "success".to_string(),
                message: "logged".to_string(),
                timestamp,
            },
            error: None,
            metadata,
        })
    }
}

#[async_trait]
impl OperationHandler for LiveLogWithAttributesHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        _deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let params = log_with_attrs_params_of(&request);
        let metadata = request.metadata().cloned();
        tracing::info!(content = %params.content, attributes = ?params.attributes, "phase log");
        let timestamp = params
            .timestamp
            .unwrap_or_else(chrono::Utc::now)
            .to_rfc3339();
        Ok(OperationResult::LogWithAttributes {
            result: LogWithAttributesOutput {
                status: "success".to_string(),
                message: "logged".to_string(),
                timestamp,
                attributes: params.attributes.clone(),
            },
            error: None,
            metadata,
        })
    }
}

#[async_trait]
impl OperationHandler for SimulatedLogWithAttributesHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let params = log_with_attrs_params_of(&request);
        let metadata = request.metadata().cloned();
        let state_id = metadata
            .as_ref()
            .and_then(|m| m.state_id.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let timestamp = params
            .timestamp
            .unwrap_or_else(chrono::Utc::now)
            .to_rfc3339();
        append_jsonl(
            deps,
            &state_id,
            &serde_json::json!({
                "content": params.content,
                "attributes": params.attributes,
                "timestamp": timestamp,
            }),
        )?;
        Ok(OperationResult::LogWithAttributes {
            result: LogWithAttributesOutput {
                status: "success".to_string(),
                message: "logged".to_string(),
                timestamp,
                attributes: params.attributes.clone(),
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
    use std::sync::Arc;

    #[tokio::test]
    async fn simulated_log_appends_jsonl_under_states_dir() {
        let dir = tempfile::tempdir().unwrap();
        let deps = HandlerDeps::new(dir.path(), Arc::new(NoopEventSink));
        let handler = SimulatedLogHandler;
        let request = OperationRequest::Log {
            params: LogParams {
                content: serde_json::json!("hello"),
                level: "INFO".to_string(),
            },
            metadata: Some(cadence_core::OperationMetadata {
                state_id: Some("s1".to_string()),
                ..Default::default()
            }),
        };
        handler.handle(request, &deps).await.unwrap();
        let logs_dir = dir.path().join("s1").join("logs");
        assert!(logs_dir.exists());
        let entries: Vec<_> = std::fs::read_dir(&logs_dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn live_log_returns_success_without_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let deps = HandlerDeps::new(dir.path(), Arc::new(NoopEventSink));
        let handler = LiveLogHandler;
        let request = OperationRequest::Log {
            params: LogParams {
                content: serde_json::json!("hello"),
                level: "ERROR".to_string(),
            },
            metadata: None,
        };
        let result = handler.handle(request, &deps).await.unwrap();
        match result {
            OperationResult::Log { result, .. } => assert_eq!(result.status, "success"),
            _ => panic!("expected log result"),
        }
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
