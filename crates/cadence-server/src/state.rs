use std::sync::Arc;

use cadence_core::StateStore;
use cadence_dispatch::{Dispatcher, HandlerDeps, ProcessingMode, RecordingEventSink};

use crate::launcher::PhaseLauncher;

/// Everything an axum handler needs, grounded on the teacher's
/// `AppState` construction in `crates/gateway/src/main.rs`.
#[derive(Clone)]
pub struct AppState {
    pub state_store: Arc<StateStore>,
    pub dispatcher: Arc<Dispatcher>,
    pub handler_deps: HandlerDeps,
    pub launcher: Arc<PhaseLauncher>,
    pub mode: ProcessingMode,
}

impl AppState {
    pub fn new(
        states_dir: impl Into<std::path::PathBuf>,
        phases_dir: impl Into<std::path::PathBuf>,
        server_url: impl Into<String>,
        mode: ProcessingMode,
        task_instructions: String,
        llm_gateway_url: Option<String>,
    ) -> Self {
        let states_dir = states_dir.into();
        let state_store = Arc::new(StateStore::new(states_dir.clone()));

        let event_sink: Arc<dyn cadence_dispatch::EventSink> = match mode {
            ProcessingMode::Live => Arc::new(cadence_dispatch::NoopEventSink),
            ProcessingMode::Simulated => Arc::new(RecordingEventSink::new()),
        };
        let mut handler_deps = HandlerDeps::new(states_dir.clone(), event_sink);
        if let Some(url) = llm_gateway_url {
            handler_deps = handler_deps.with_llm_gateway_url(url);
        }

        let registry = cadence_dispatch::build_default_registry(task_instructions);
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(registry), mode));

        let launcher = Arc::new(PhaseLauncher::new(phases_dir, states_dir, server_url));

        Self {
            state_store,
            dispatcher,
            handler_deps,
            launcher,
            mode,
        }
    }
}
