//! Service error taxonomy
//!
//! Every failure a service returns is one of these variants. Repository
//! errors are converted through [`crate::db::classify`], so storage-engine
//! error types never escape the persistence layer.

use crate::db::{classify, StorageFailure};

/// Error types for service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Referenced post, comment or user does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The authorization guard rejected the actor
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed or ownership-mismatched mutation target
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The author's account is not active
    #[error("User {0} is not active")]
    InactiveUser(i64),

    /// Moderation to the status the comment already has
    #[error("Comment {id} is already {status}")]
    NoOp { id: i64, status: String },

    /// A conditional write found the row changed since it was checked
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage or other unexpected failure
    #[error("Internal error: {0}")]
    Internal(anyhow::Error),
}

impl ServiceError {
    pub fn not_found(what: &str, id: i64) -> Self {
        Self::NotFound(format!("{} with ID {} not found", what, id))
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        match classify(&err) {
            StorageFailure::RowNotFound | StorageFailure::MissingReference => {
                Self::NotFound(format!("{:#}", err))
            }
            StorageFailure::Duplicate => Self::Conflict(format!("{:#}", err)),
            StorageFailure::InvalidShape => Self::InvalidInput(format!("{:#}", err)),
            StorageFailure::Other => Self::Internal(err),
        }
    }
}

/// Result alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
