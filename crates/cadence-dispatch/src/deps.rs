//! The bundle of dependencies handed to every handler invocation.
//! Grounded on `original_source/operation_handler.py::setup_dependencies`,
//! which built an analogous per-mode dependency dict once at process
//! start and threaded it through every `handle_operation` call.

use std::sync::Arc;

use cadence_core::StateStore;

use crate::events::EventSink;

#[derive(Clone)]
pub struct HandlerDeps {
    pub states_dir: std::path::PathBuf,
    pub state_store: Arc<StateStore>,
    pub http_client: reqwest::Client,
    pub llm_gateway_url: Option<String>,
    pub event_sink: Arc<dyn EventSink>,
}

impl HandlerDeps {
    pub fn new(states_dir: impl Into<std::path::PathBuf>, event_sink: Arc<dyn EventSink>) -> Self {
        let states_dir = states_dir.into();
        Self {
            state_store: Arc::new(StateStore::new(states_dir.clone())),
            states_dir,
            http_client: reqwest::Client::new(),
            llm_gateway_url: None,
            event_sink,
        }
    }

    pub fn with_llm_gateway_url(mut self, url: impl Into<String>) -> Self {
        self.llm_gateway_url = Some(url.into());
        self
    }
}
