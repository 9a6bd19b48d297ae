//! Error types for cf-runner

use cf_core::CoreError;
use cf_db::DbError;
use cf_jinja::JinjaError;
use thiserror::Error;

/// Operator-facing error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Render,
    Resolution,
    ChecksumMismatch,
    Execution,
    LockHeld,
    Connection,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCategory::Config => "ConfigError",
            ErrorCategory::Render => "RenderError",
            ErrorCategory::Resolution => "ResolutionError",
            ErrorCategory::ChecksumMismatch => "ChecksumMismatchError",
            ErrorCategory::Execution => "ExecutionError",
            ErrorCategory::LockHeld => "LockHeldError",
            ErrorCategory::Connection => "ConnectionError",
        };
        f.write_str(name)
    }
}

/// Errors from a changeflow run
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Jinja(#[from] JinjaError),

    #[error(transparent)]
    Db(#[from] DbError),

    /// A pending unit's SQL failed; nothing after it ran (R001)
    #[error("[R001] Change unit '{id}' ({path}) failed: {source}")]
    ExecutionFailed {
        id: String,
        path: String,
        source: DbError,
    },

    /// A unit executed but its record could not be written (R002)
    #[error("[R002] Change unit '{id}' executed but recording it failed: {source}. Verify the change and record it before the next run")]
    CheckpointFailed { id: String, source: DbError },
}

impl RunError {
    /// Taxonomy bucket of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            RunError::Core(CoreError::ChecksumMismatch { .. }) => ErrorCategory::ChecksumMismatch,
            RunError::Core(e) if e.is_resolution() => ErrorCategory::Resolution,
            RunError::Core(_) => ErrorCategory::Config,
            RunError::Jinja(_) => ErrorCategory::Render,
            RunError::Db(DbError::LockHeld { .. }) => ErrorCategory::LockHeld,
            RunError::Db(e) if e.is_connection() => ErrorCategory::Connection,
            RunError::Db(_) => ErrorCategory::Execution,
            RunError::ExecutionFailed { .. } | RunError::CheckpointFailed { .. } => {
                ErrorCategory::Execution
            }
        }
    }
}

/// Result type alias for RunError
pub type RunResult<T> = Result<T, RunError>;
