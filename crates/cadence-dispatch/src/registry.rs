//! `(OperationKind, ProcessingMode) -> handler` lookup table, built once
//! at process start and handed to the dispatcher as an `Arc`. Grounded on
//! the teacher's `node_registry`/`tool_router` wiring in
//! `crates/gateway/src/main.rs`, and on
//! `original_source/handlers/base.py::get_handler`'s
//! `handler_registry[operation_type][mode]` lookup.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::{OperationKind, OperationRequest, OperationResult};

use crate::deps::HandlerDeps;
use crate::error::{DispatchError, Result};
use crate::mode::ProcessingMode;

#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn handle(
        &self,
        request: OperationRequest,
        deps: &HandlerDeps,
    ) -> anyhow::Result<OperationResult>;
}

pub struct HandlerRegistry {
    handlers: HashMap<(OperationKind, ProcessingMode), Arc<dyn OperationHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        kind: OperationKind,
        mode: ProcessingMode,
        handler: Arc<dyn OperationHandler>,
    ) -> &mut Self {
        self.handlers.insert((kind, mode), handler);
        self
    }

    /// Registers the same handler for both LIVE and SIMULATED, for
    /// operations with no externally observable side effect to fake
    /// (e.g. `save_state`, `get_task`).
    pub fn register_both(
        &mut self,
        kind: OperationKind,
        handler: Arc<dyn OperationHandler>,
    ) -> &mut Self {
        self.register(kind, ProcessingMode::Live, handler.clone());
        self.register(kind, ProcessingMode::Simulated, handler);
        self
    }

    pub fn get(
        &self,
        kind: OperationKind,
        mode: ProcessingMode,
    ) -> Result<Arc<dyn OperationHandler>> {
        self.handlers
            .get(&(kind, mode))
            .cloned()
            .ok_or(DispatchError::UnsupportedMode { kind, mode })
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
