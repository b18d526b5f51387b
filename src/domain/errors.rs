//! Domain errors for the reasoning bank.

use thiserror::Error;

use crate::domain::models::TrajectoryId;

/// Domain-level errors that can occur in the reasoning bank.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Trajectory not found: {0}")]
    TrajectoryNotFound(TrajectoryId),

    #[error("Trajectory already recorded: {0}")]
    DuplicateTrajectory(TrajectoryId),

    #[error("Invalid trajectory id: {0}")]
    InvalidTrajectoryId(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Storage unavailable during {operation} after {attempts} attempt(s): {reason}")]
    StorageUnavailable {
        operation: String,
        attempts: u32,
        reason: String,
    },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DomainError {
    /// Whether a storage operation that failed with this error may succeed
    /// if attempted again.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::DatabaseError(_))
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err)
                if !matches!(db_err.kind(), sqlx::error::ErrorKind::Other) =>
            {
                DomainError::ConstraintViolation(db_err.message().to_string())
            }
            _ => DomainError::DatabaseError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
