//! UI/observability event sink for dispatched operations.
//!
//! Grounded on `crates/gateway/src/runtime/runs.rs`'s `RunEvent`
//! broadcast pattern, narrowed to the single record shape spec.md §4.J
//! calls for. Per spec.md §4.D / `original_source/operation_handler.py`
//! ("if mode != HOOKS: add_operation_event(...)"), the sink only fires in
//! SIMULATED mode — LIVE mode has no UI attached.

use cadence_core::{OperationKind, OperationRequest, OperationResult};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct OperationEvent {
    pub state_id: std::option::Option<String>,
    pub phase: std::option::Option<String>,
    pub operation: OperationKind,
    pub status: &'static str,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: OperationEvent);
}

/// Default sink: drops every event. Used in LIVE mode, and anywhere a
/// caller doesn't care to observe dispatch activity.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: OperationEvent) {}
}

/// Collects events in memory; used by SIMULATED mode and by tests that
/// assert on dispatch activity.
#[derive(Default)]
pub struct RecordingEventSink {
    events: parking_lot::Mutex<Vec<OperationEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<OperationEvent> {
        std::mem::take(&mut self.events.lock())
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: OperationEvent) {
        self.events.lock().push(event);
    }
}

pub fn event_for(
    request: &OperationRequest,
    _result: &OperationResult,
    status: &'static str,
    now: chrono::DateTime<chrono::Utc>,
) -> OperationEvent {
    let metadata = request.metadata();
    OperationEvent {
        state_id: metadata.and_then(|m| m.state_id.clone()),
        phase: metadata.and_then(|m| m.phase.clone()),
        operation: request.kind(),
        status,
        timestamp: now,
    }
}
