//! Reads what the Phase Launcher hands a phase program: the state ID on
//! argv and the previous batch's (request, result) pairs as JSON on
//! stdin. Grounded on
//! `original_source/workflows/executor.py::execute_phase`, which invokes
//! each phase as `<interpreter> <phase_path> <state_id>` and pipes
//! `json.dumps(previous_operations)` to its stdin.

use std::io::Read;

use cadence_core::state::OperationExchange;
use serde::Deserialize;

#[derive(thiserror::Error, Debug)]
pub enum PhaseIoError {
    #[error("missing state_id argument (argv[1])")]
    MissingStateId,
    #[error("failed to read stdin: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse previous operations: {0}")]
    Json(#[from] serde_json::Error),
}

/// The payload the engine pipes to a phase's stdin: `{"updates": [...]}`
/// where each element is a `[request, result]` pair, matching
/// `original_source/flock/__main__.py`'s `PreviousOperations` shape.
#[derive(Debug, Deserialize)]
struct PreviousOperationsWire {
    #[serde(default)]
    updates: Vec<OperationExchange>,
}

/// Reads `argv[1]` as the state ID.
pub fn read_state_id_from_args() -> Result<String, PhaseIoError> {
    std::env::args().nth(1).ok_or(PhaseIoError::MissingStateId)
}

/// Reads and parses the previous-results batch from stdin.
pub fn read_previous_operations_from_stdin() -> Result<Vec<OperationExchange>, PhaseIoError> {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    if buf.trim().is_empty() {
        return Ok(vec![]);
    }
    let wire: PreviousOperationsWire = serde_json::from_str(&buf)?;
    Ok(wire.updates)
}
