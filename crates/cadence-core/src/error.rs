/// Shared error type for the state store and agent state schema.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("state not found: {0}")]
    NotFound(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("validation: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
