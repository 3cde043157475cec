//! `python` operation handlers. Same subprocess shape as `bash`
//! (grounded on `crates/tools/src/exec.rs`), but always invoked as
//! `python3 -c <code>` with no subagent working-directory convention —
//! the original only applies that to `bash`.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use cadence_core::operation::{PythonOutput, PythonParams};
use cadence_core::{OperationRequest, OperationResult};
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::deps::HandlerDeps;
use crate::registry::OperationHandler;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub struct LivePythonHandler;
pub struct SimulatedPythonHandler;

fn params_of(request: &OperationRequest) -> &PythonParams {
    match request {
        OperationRequest::Python { params, .. } => params,
        _ => unreachable!("dispatcher only routes python requests to python handlers"),
    }
}

#[async_trait]
impl OperationHandler for LivePythonHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        _deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let params = params_of(&request);
        let timeout = Duration::from_secs(params.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS));
        let metadata = request.metadata().cloned();

        let mut child = Command::new("python3")
            .arg("-c")
            .arg(&params.code)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut stdout_pipe = child.stdout.take().expect("piped stdout");
        let mut stderr_pipe = child.stderr.take().expect("piped stderr");

        let outcome = tokio::time::timeout(timeout, async {
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

        let output = match outcome {
            Ok(Ok((stdout, stderr, status))) => PythonOutput {
                output: stdout,
                error: if status.success() {
                    None
                } else {
                    Some(stderr)
                },
            },
            Ok(Err(err)) => return Err(err),
            Err(_elapsed) => {
                let _ = child.kill().await;
                PythonOutput {
                    output: String::new(),
                    error: Some(format!("command timed out after {}s", timeout.as_secs())),
                }
            }
        };

        Ok(OperationResult::Python {
            result: output,
            error: None,
            metadata,
        })
    }
}

#[async_trait]
impl OperationHandler for SimulatedPythonHandler {
    async fn handle(
        &self,
        request: OperationRequest,
        _deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult> {
        let params = params_of(&request);
        let metadata = request.metadata().cloned();
        Ok(OperationResult::Python {
            result: PythonOutput {
                output: format!("[simulated] would run: {}", params.code),
                error: None,
            },
            error: None,
            metadata,
        })
    }
}
