//! `bash` operation handlers.
//!
//! LIVE mode spawns a real shell, grounded on the subprocess lifecycle in
//! `crates/tools/src/exec.rs` (piped stdio, timeout via `tokio::select!`)
//! adapted to the simpler run-to-completion contract
//! `original_source/handlers/bash.py::bash_hooks` uses: no background
//! sessions, just `stdout`/`stderr`/`status`. SIMULATED mode never spawns
//! a process at all.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use cadence_core::operation::{BashOutput, BashParams};
use cadence_core::{OperationRequest, OperationResult};
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::deps::HandlerDeps;
use crate::registry::OperationHandler;

const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// Process exit status convention for "killed for exceeding its timeout",
/// matching the original's `status=124` (same convention `timeout(1)` uses).
const TIMEOUT_STATUS: i32 = 124;

pub struct LiveBashHandler;
pub struct SimulatedBashHandler;

fn params_of(request: &OperationRequest) -> &BashParams {
    match request {
        OperationRequest::Bash { params, .. } => params,
        _ => unreachable!("dispatcher only routes bash requests to bash handlers"),
    }
}

fn metadata_of(request: &OperationRequest) -> Option<&cadence_core::OperationMetadata> {
    request.metadata()
}

fn ok_result(output: BashOutput, metadata: Option<cadence_core::OperationMetadata>) -> OperationResult {
    OperationResult::Bash {
        result: output,
        error: None,
        metadata,
    }
}

#[async_trait]
impl OperationHandler for LiveBashHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        _deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let params = params_of(&request);
        let timeout = Duration::from_secs(params.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS));

        // If the request carries an agent_id, the command runs inside
        // that subagent's working directory, per
        // `original_source/handlers/bash.py::bash_hooks`.
        let full_command = match &params.agent_id {
            Some(agent_id) => {
                let workdir = format!("subagents/{agent_id}/.cache");
                format!("mkdir -p {workdir} && cd {workdir} && {}", params.command)
            }
            None => params.command.clone(),
        };

        let mut child = Command::new("/bin/bash")
            .arg("-c")
            .arg(&full_command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut stdout_pipe = child.stdout.take().expect("piped stdout");
        let mut stderr_pipe = child.stderr.take().expect("piped stderr");

        let output = tokio::time::timeout(timeout, async {
            let mut stdout = String::new();
            let mut stderr = String::new();
            let (_, _, status) = tokio::join!(
                stdout_pipe.read_to_string(&mut stdout),
                stderr_pipe.read_to_string(&mut stderr),
                child.wait(),
            );
            anyhow::Ok((stdout, stderr, status?))
        })
        .await;

        let metadata = metadata_of(&request).cloned();

        let bash_output = match output {
            Ok(Ok((stdout, stderr, status))) => BashOutput {
                stdout: stdout.trim().to_string(),
                stderr: stderr.trim().to_string(),
                status: status.code().or(Some(1)),
            },
            Ok(Err(err)) => return Err(err),
            Err(_elapsed) => {
                let _ = child.kill().await;
                BashOutput {
                    stdout: String::new(),
                    stderr: format!("command timed out after {}s", timeout.as_secs()),
                    status: Some(TIMEOUT_STATUS),
                }
            }
        };

        Ok(ok_result(bash_output, metadata))
    }
}

/// A command of the literal form `exit <code>` simulates that exit code
/// deterministically (per spec.md §8 scenario 5's soft-failure case)
/// instead of being echoed as a no-op, so phase authors can write
/// SIMULATED-mode tests against a failing `bash` result without spawning
/// a real shell.
fn simulated_exit_code(command: &str) -> std::option::Option<i32> {
    command.trim().strip_prefix("exit ")?.trim().parse().ok()
}

#[async_trait]
impl OperationHandler for SimulatedBashHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        _deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let params = params_of(&request);
        let metadata = metadata_of(&request).cloned();

        let output = match simulated_exit_code(&params.command) {
            Some(0) => BashOutput {
                stdout: String::new(),
                stderr: String::new(),
                status: Some(0),
            },
            Some(code) => BashOutput {
                stdout: String::new(),
                stderr: "sim".to_string(),
                status: Some(code),
            },
            None => BashOutput {
                stdout: format!("[simulated] would run: {}", params.command),
                stderr: String::new(),
                status: Some(0),
            },
        };

        Ok(ok_result(output, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoopEventSink;
    use std::sync::Arc;

    fn deps() -> HandlerDeps {
        HandlerDeps::new(std::env::temp_dir(), Arc::new(NoopEventSink))
    }

    fn bash_request(command: &str, timeout: Option<u64>) -> OperationRequest {
        OperationRequest::Bash {
            params: BashParams {
                command: command.to_string(),
                timeout,
                agent_id: None,
                extra: Default::default(),
            },
            metadata: None,
        }
    }

    #[tokio::test]
    async fn live_bash_runs_and_captures_stdout() {
        let handler = LiveBashHandler;
        let result = handler
            .handle(bash_request("echo hello", None), &deps())
            .await
            .unwrap();
        match result {
            OperationResult::Bash { result, .. } => {
                assert_eq!(result.stdout, "hello");
                assert_eq!(result.status, Some(0));
            }
            _ => panic!("expected bash result"),
        }
    }

    #[tokio::test]
    async fn live_bash_reports_nonzero_exit_status() {
        let handler = LiveBashHandler;
        let result = handler
            .handle(bash_request("exit 7", None), &deps())
            .await
            .unwrap();
        match result {
            OperationResult::Bash { result, .. } => assert_eq!(result.status, Some(7)),
            _ => panic!("expected bash result"),
        }
    }

    #[tokio::test]
    async fn live_bash_times_out_with_status_124() {
        let handler = LiveBashHandler;
        let result = handler
            .handle(bash_request("sleep 5", Some(1)), &deps())
            .await
            .unwrap();
        match result {
            OperationResult::Bash { result, .. } => {
                assert_eq!(result.status, Some(TIMEOUT_STATUS));
            }
            _ => panic!("expected bash result"),
        }
    }

    #[tokio::test]
    async fn simulated_bash_never_spawns_a_process() {
        let handler = SimulatedBashHandler;
        let result = handler
            .handle(bash_request("rm -rf /", None), &deps())
            .await
            .unwrap();
        match result {
            OperationResult::Bash { result, .. } => {
                assert!(result.stdout.contains("simulated"));
            }
            _ => panic!("expected bash result"),
        }
    }

    #[tokio::test]
    async fn simulated_bash_reports_a_deterministic_soft_failure() {
        let handler = SimulatedBashHandler;
        let result = handler
            .handle(bash_request("exit 1", None), &deps())
            .await
            .unwrap();
        match result {
            OperationResult::Bash { result, .. } => {
                assert_eq!(result.status, Some(1));
                assert_eq!(result.stderr, "sim");
            }
            _ => panic!("expected bash result"),
        }
    }
}
