use cadence_core::OperationKind;

use crate::mode::ProcessingMode;

#[derive(thiserror::Error, Debug)]
pub enum DispatchError {
    #[error("no handler registered for {kind:?} in {mode} mode")]
    UnsupportedMode {
        kind: OperationKind,
        mode: ProcessingMode,
    },

    /// A handler raised. Per spec.md §4.D / §7, this is fatal: it aborts
    /// the whole batch and the caller should surface an HTTP 500,
    /// matching `original_source/handlers/base.py`'s "handler exception
    /// exits the process" behavior, adapted to "fails the request"
    /// for a long-lived server.
    #[error("handler for {kind:?} failed: {source}")]
    HandlerFailed {
        kind: OperationKind,
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T> = std::result::Result<T, DispatchError>;
