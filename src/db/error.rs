//! Storage error classification
//!
//! Repositories return `anyhow::Result` with context attached. Before a
//! failure leaves the persistence layer it is classified here, so callers
//! above never have to look at `sqlx::Error` themselves.

use sqlx::error::ErrorKind;

/// Structural category of a storage failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFailure {
    /// A row that was required by the statement does not exist
    RowNotFound,
    /// A write referenced a row that does not exist (foreign key)
    MissingReference,
    /// A write collided with an existing row (unique key)
    Duplicate,
    /// A write had the wrong shape (check or not-null constraint)
    InvalidShape,
    /// Anything else: connectivity, syntax, pool exhaustion
    Other,
}

/// Classify an error produced by a repository.
///
/// The whole context chain is searched, so `.context(..)` wrappers added by
/// repositories do not hide the underlying database error.
pub fn classify(err: &anyhow::Error) -> StorageFailure {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<sqlx::Error>())
        .map(classify_sqlx)
        .unwrap_or(StorageFailure::Other)
}

fn classify_sqlx(err: &sqlx::Error) -> StorageFailure {
    match err {
        sqlx::Error::RowNotFound => StorageFailure::RowNotFound,
        sqlx::Error::Database(db_err) => match db_err.kind() {
            ErrorKind::ForeignKeyViolation => StorageFailure::MissingReference,
            ErrorKind::UniqueViolation => StorageFailure::Duplicate,
            ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
                StorageFailure::InvalidShape
            }
            _ => StorageFailure::Other,
        },
        _ => StorageFailure::Other,
    }
}
