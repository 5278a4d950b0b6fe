//! Storage error types

use thiserror::Error;

/// Result type for storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Storage-related errors.
///
/// "Not found" is never an error at this level; absence is expressed through
/// `Option`/`bool` returns on the store contract, so callers can never
/// mistake a connectivity failure for a missing record.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached (connection refused, pool exhausted,
    /// connection lost mid-call)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A query was executed but failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema setup failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A persisted record could not be encoded/decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid store configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Whether retrying the same call might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            sqlx::Error::Configuration(_) => StoreError::Configuration(err.to_string()),
            other => StoreError::QueryFailed(other.to_string()),
        }
    }
}
