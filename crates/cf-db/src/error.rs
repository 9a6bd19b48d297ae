//! Error types for cf-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Statement execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Another run holds the lock for this environment (D003)
    #[error("[D003] Environment '{environment}' is locked by {owner} since {acquired_at}. Wait for that run to finish, or delete its row from the lock table if it died")]
    LockHeld {
        environment: String,
        owner: String,
        acquired_at: String,
    },

    /// A history row could not be read back (D004)
    #[error("[D004] Invalid history record: {0}")]
    InvalidRecord(String),

    /// Mutex poisoned (D005)
    #[error("[D005] Database mutex poisoned: {0}")]
    MutexPoisoned(String),
}

impl DbError {
    /// Whether the database could not be reached at all
    pub fn is_connection(&self) -> bool {
        matches!(self, DbError::ConnectionError(_) | DbError::MutexPoisoned(_))
    }
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::ExecutionError(err.to_string())
    }
}
