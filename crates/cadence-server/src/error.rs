//! One flat error enum at the HTTP boundary, grounded on
//! `crates/domain/src/error.rs`'s style (since removed from the
//! workspace in the final trim; its shape survives here): every surface
//! error this crate can produce, mapped to an HTTP status per spec.md §7.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::launcher::LaunchError;

#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Store(#[from] cadence_core::StoreError),

    #[error(transparent)]
    Dispatch(#[from] cadence_dispatch::DispatchError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::Store(cadence_core::StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Store(_) | ServerError::Dispatch(_) | ServerError::Launch(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
