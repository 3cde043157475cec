pub mod health;
pub mod run_workflow;
pub mod start_workflow;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/run_workflow", post(run_workflow::run_workflow))
        .route("/start_workflow", post(start_workflow::start_workflow))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
