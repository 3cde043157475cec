//! Workflow HTTP API and Phase Launcher: the server half of the agent
//! workflow engine.

pub mod api;
pub mod config;
pub mod error;
pub mod launcher;
pub mod state;

pub use config::Cli;
pub use error::ServerError;
pub use state::AppState;
