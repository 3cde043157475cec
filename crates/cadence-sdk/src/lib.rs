//! Phase SDK: the library every phase program links against. A phase
//! program's shape, per `original_source/flock/modular/phases/*.py`, is
//! always read -> build -> post: read the previous operation batch and
//! the current state, build a new batch of operation requests, post it
//! back to the engine.

pub mod client;
pub mod io;

pub use client::{ClientError, PhaseClient, PhaseClientBuilder, RunWorkflowRequest, RunWorkflowResponse};
pub use io::{read_previous_operations_from_stdin, read_state_id_from_args, PhaseIoError};

use cadence_core::state::OperationExchange;
use cadence_core::{AgentState, StateStore};

/// Everything a phase program needs to get going, assembled from argv,
/// stdin, and the environment the Phase Launcher sets (`CADENCE_STATES_DIR`,
/// `CADENCE_SERVER_URL`).
pub struct PhaseContext {
    pub state_id: String,
    pub previous_operations: Vec<OperationExchange>,
    pub client: PhaseClient,
    state_store: StateStore,
}

#[derive(thiserror::Error, Debug)]
pub enum PhaseContextError {
    #[error(transparent)]
    Io(#[from] PhaseIoError),
    #[error("CADENCE_SERVER_URL not set")]
    MissingServerUrl,
    #[error("CADENCE_STATES_DIR not set")]
    MissingStatesDir,
}

impl PhaseContext {
    pub fn from_environment() -> Result<Self, PhaseContextError> {
        let state_id = read_state_id_from_args()?;
        let previous_operations = read_previous_operations_from_stdin()?;
        let server_url = std::env::var("CADENCE_SERVER_URL")
            .map_err(|_| PhaseContextError::MissingServerUrl)?;
        let states_dir = std::env::var("CADENCE_STATES_DIR")
            .map_err(|_| PhaseContextError::MissingStatesDir)?;
        Ok(Self {
            state_id,
            previous_operations,
            client: PhaseClient::builder(server_url).build(),
            state_store: StateStore::new(states_dir),
        })
    }

    pub fn load_state(&self) -> cadence_core::Result<AgentState> {
        self.state_store.load(&self.state_id)
    }
}
