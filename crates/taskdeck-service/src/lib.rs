mod documents;
mod tasks;
mod users;

pub use documents::{DocumentService, UploadedFile};
pub use tasks::TaskService;
pub use users::UserService;

use thiserror::Error;

/// Failure taxonomy for every repository operation. The HTTP boundary
/// maps each variant to a status code and never leaks internals.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<taskdeck_db::DbError> for ServiceError {
    fn from(e: taskdeck_db::DbError) -> Self {
        match e {
            taskdeck_db::DbError::NotFound(msg) => ServiceError::NotFound(msg),
            taskdeck_db::DbError::Conflict(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<taskdeck_store::StoreError> for ServiceError {
    fn from(e: taskdeck_store::StoreError) -> Self {
        match e {
            taskdeck_store::StoreError::NotFound(key) => ServiceError::NotFound(key),
            taskdeck_store::StoreError::Internal(msg) => ServiceError::Storage(msg),
        }
    }
}
