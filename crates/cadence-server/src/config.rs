//! CLI surface, grounded on `crates/gateway/src/cli/mod.rs`'s
//! `clap::Parser`/`Subcommand` style.

use std::path::PathBuf;

use cadence_dispatch::ProcessingMode;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "cadence-server", version, about = "Agent workflow engine")]
pub struct Cli {
    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Log verbosity passed through to `tracing_subscriber`'s env filter.
    #[arg(long, default_value = "info", value_parser = ["debug", "info", "warning", "error"])]
    pub log_level: String,

    /// Whether operation handlers talk to real external systems.
    #[arg(long, default_value = "simulated")]
    pub mode: String,

    /// Directory holding `<state_id>.json` documents.
    #[arg(long, default_value = "states")]
    pub states_dir: PathBuf,

    /// Directory holding phase program binaries.
    #[arg(long, default_value = "phases")]
    pub phases_dir: PathBuf,

    /// Base URL this server is reachable at, handed to phase programs
    /// via `CADENCE_SERVER_URL` so they can call back in.
    #[arg(long)]
    pub server_url: Option<String>,

    /// URL of the LLM gateway the `generate` handler posts to in LIVE
    /// mode. Required only when `--mode live` is combined with a
    /// workflow that issues `generate` operations.
    #[arg(long)]
    pub llm_gateway_url: Option<String>,
}

impl Cli {
    pub fn processing_mode(&self) -> anyhow::Result<ProcessingMode> {
        self.mode
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
    }

    pub fn resolved_server_url(&self) -> String {
        self.server_url
            .clone()
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", self.port))
    }
}
