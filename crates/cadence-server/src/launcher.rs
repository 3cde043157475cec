//! Phase Launcher: spawns a phase program as a subprocess, feeds it the
//! previous operation batch on stdin, and waits for it to exit.
//!
//! Grounded on `original_source/workflows/executor.py::execute_phase`
//! (same argv/stdin contract: `<phase_path> <state_id>`, previous
//! operations JSON on stdin) and on `crates/tools/src/exec.rs`'s
//! subprocess lifecycle for the piped-stdio/timeout-free "run to
//! completion" shape.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use cadence_core::state::OperationExchange;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(thiserror::Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum LaunchError {
    #[error("phase binary not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to spawn phase {phase}: {source}")]
    Spawn {
        phase: String,
        #[source]
        source: std::io::Error,
    },
    #[error("phase {phase} exited with status {status}\nstderr: {stderr}")]
    NonZeroExit {
        phase: String,
        status: i32,
        stderr: String,
    },
    #[error("failed to serialize previous operations: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct PreviousOperationsWire {
    updates: Vec<OperationExchange>,
}

pub struct PhaseLauncher {
    phases_dir: PathBuf,
    states_dir: PathBuf,
    server_url: String,
}

impl PhaseLauncher {
    pub fn new(
        phases_dir: impl Into<PathBuf>,
        states_dir: impl Into<PathBuf>,
        server_url: impl Into<String>,
    ) -> Self {
        Self {
            phases_dir: phases_dir.into(),
            states_dir: states_dir.into(),
            server_url: server_url.into(),
        }
    }

    fn binary_path(&self, phase_name: &str) -> PathBuf {
        self.phases_dir.join(phase_name)
    }

    /// Runs `phase_name` to completion, piping `updates` to its stdin.
    /// A non-zero exit or spawn failure is returned as an error; the
    /// caller decides whether that's fatal to the containing request
    /// (per spec.md §4.E, it is for a synchronously-awaited launch).
    pub async fn run(
        &self,
        phase_name: &str,
        state_id: &str,
        updates: Vec<OperationExchange>,
    ) -> Result<(), LaunchError> {
        let path = self.binary_path(phase_name);
        if !path.exists() {
            return Err(LaunchError::NotFound(path));
        }

        let payload = serde_json::to_vec(&PreviousOperationsWire { updates })?;

        let mut child = Command::new(&path)
            .arg(state_id)
            .env("CADENCE_STATES_DIR", &self.states_dir)
            .env("CADENCE_SERVER_URL", &self.server_url)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                phase: phase_name.to_string(),
                source,
            })?;

        // Write stdin in its own task so a phase that reads a large
        // payload before producing output can't deadlock against a full
        // pipe buffer (spec.md §9).
        let mut stdin = child.stdin.take().expect("piped stdin");
        let writer = tokio::spawn(async move {
            let _ = stdin.write_all(&payload).await;
            drop(stdin);
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| LaunchError::Spawn {
                phase: phase_name.to_string(),
                source,
            })?;
        let _ = writer.await;

        if !output.status.success() {
            return Err(LaunchError::NonZeroExit {
                phase: phase_name.to_string(),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(())
    }

    pub fn phases_dir(&self) -> &Path {
        &self.phases_dir
    }
}
