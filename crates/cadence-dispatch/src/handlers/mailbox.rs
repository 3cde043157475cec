//! `write_message` / `read_messages`: subagent-to-subagent mailbox
//! operations, supplemented from `original_source/type_defs/operations.py`
//! (see SPEC_FULL.md §3). Messages are JSONL files under
//! `<states_dir>/mailbox/<to_agent>.jsonl`; `read_messages` drains them
//! unless `remove` is false.

use async_trait::async_trait;
use cadence_core::operation::{ReadMessagesOutput, ReadMessagesParams, WriteMessageOutput, WriteMessageParams};
use cadence_core::{OperationRequest, OperationResult};
use std::io::Write as _;

use crate::deps::HandlerDeps;
use crate::registry::OperationHandler;

pub struct WriteMessageHandler;
pub struct ReadMessagesHandler;

fn mailbox_path(deps: &HandlerDeps, agent_id: &str) -> std::path::PathBuf {
    deps.states_dir.join("mailbox").join(format!("{agent_id}.jsonl"))
}

fn write_params_of(request: &OperationRequest) -> &WriteMessageParams {
    match request {
        OperationRequest::WriteMessage { params, .. } => params,
        _ => unreachable!(),
    }
}

fn read_params_of(request: &OperationRequest) -> &ReadMessagesParams {
    match request {
        OperationRequest::ReadMessages { params, .. } => params,
        _ => unreachable!(),
    }
}

#[async_trait]
impl OperationHandler for WriteMessageHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let params = write_params_of(&request);
        let metadata = request.metadata().cloned();
        let timestamp = chrono::Utc::now().to_rfc3339();

        let path = mailbox_path(deps, &params.to_agent);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        let record = serde_json::json!({
            "from_agent": params.from_agent,
            "msg_type": params.msg_type,
            "content": params.content,
            "timestamp": timestamp,
        });
        writeln!(file, "{}", serde_json::to_string(&record)?)?;

        Ok(OperationResult::WriteMessage {
            result: WriteMessageOutput {
                status: "success".to_string(),
                message: format!("message delivered to {}", params.to_agent),
                timestamp,
            },
            error: None,
            metadata,
        })
    }
}

#[async_trait]
impl OperationHandler for ReadMessagesHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let params = read_params_of(&request);
        let metadata = request.metadata().cloned();
        let path = mailbox_path(deps, &params.agent_id);

        let messages = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            content
                .lines()
                .filter(|l| !l.trim().is_empty())
                .filter_map(|l| serde_json::from_str(l).ok())
                .collect::<Vec<serde_json::Value>>()
        } else {
            vec![]
        };

        if params.remove && path.exists() {
            std::fs::remove_file(&path)?;
        }

        Ok(OperationResult::ReadMessages {
            result: ReadMessagesOutput { messages },
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

    fn deps(dir: &std::path::Path) -> HandlerDeps {
        HandlerDeps::new(dir, Arc::new(NoopEventSink))
    }

    #[tokio::test]
    async fn write_then_read_messages_round_trips_and_removes_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let d = deps(dir.path());

        let write = WriteMessageHandler;
        let write_req = OperationRequest::WriteMessage {
            params: WriteMessageParams {
                from_agent: "lead".to_string(),
                to_agent: "worker-1".to_string(),
                msg_type: "task".to_string(),
                content: serde_json::json!({ "go": true }).as_object().cloned().unwrap(),
            },
            metadata: None,
        };
        write.handle(write_req, &d).await.unwrap();

        let read = ReadMessagesHandler;
        let read_req = OperationRequest::ReadMessages {
            params: ReadMessagesParams {
                agent_id: "worker-1".to_string(),
                remove: true,
            },
            metadata: None,
        };
        let result = read.handle(read_req, &d).await.unwrap();
        match result {
            OperationResult::ReadMessages { result, .. } => assert_eq!(result.messages.len(), 1),
            _ => panic!("expected read_messages result"),
        }

        // Mailbox is drained after a remove=true read.
        assert!(!mailbox_path(&d, "worker-1").exists());
    }

    #[tokio::test]
    async fn read_messages_without_remove_keeps_mailbox_intact() {
        let dir = tempfile::tempdir().unwrap();
        let d = deps(dir.path());
        let write = WriteMessageHandler;
        let write_req = OperationRequest::WriteMessage {
            params: WriteMessageParams {
                from_agent: "lead".to_string(),
                to_agent: "worker-2".to_string(),
                msg_type: "task".to_string(),
                content: Default::default(),
            },
            metadata: None,
        };
        write.handle(write_req, &d).await.unwrap();

        let read = ReadMessagesHandler;
        let read_req = OperationRequest::ReadMessages {
            params: ReadMessagesParams {
                agent_id: "worker-2".to_string(),
                remove: false,
            },
            metadata: None,
        };
        read.handle(read_req, &d).await.unwrap();
        assert!(mailbox_path(&d, "worker-2").exists());
    }
}
