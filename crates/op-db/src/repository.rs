//! Repository error types

use op_core::error::OpError;

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid stored data: {0}")]
    Corrupt(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<RepositoryError> for OpError {
    fn from(err: RepositoryError) -> Self {
        OpError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_to_database_error() {
        let err: OpError = RepositoryError::Conflict("stale".into()).into();
        assert!(matches!(err, OpError::Database(ref m) if m == "Conflict: stale"));
        assert_eq!(err.status_code(), 500);
    }
}
