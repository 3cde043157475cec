//! Operation Handler Registry & Dispatcher: the part of the engine that
//! turns a phase's batch of operation requests into a batch of results.

pub mod deps;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod handlers;
pub mod mode;
pub mod registry;

pub use deps::HandlerDeps;
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, Result};
pub use events::{EventSink, NoopEventSink, OperationEvent, RecordingEventSink};
pub use handlers::build_default_registry;
pub use mode::ProcessingMode;
pub use registry::{HandlerRegistry, OperationHandler};
