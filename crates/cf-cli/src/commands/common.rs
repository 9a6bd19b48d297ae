//! Shared utilities for CLI commands

use cf_runner::{ErrorCategory, RunError};
use chrono::{DateTime, Utc};

/// Category of the first runner error in an anyhow chain
pub(crate) fn error_category(err: &anyhow::Error) -> Option<ErrorCategory> {
    err.chain()
        .find_map(|e| e.downcast_ref::<RunError>())
        .map(RunError::category)
}

/// Process exit code for a failed command
pub(crate) fn exit_code_for(category: Option<ErrorCategory>) -> i32 {
    match category {
        Some(ErrorCategory::ChecksumMismatch) => 3,
        Some(ErrorCategory::LockHeld) => 4,
        Some(ErrorCategory::Config) => 2,
        _ => 1,
    }
}

/// Timestamp as shown in text reports
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Width of the widest value, at least `min`
pub(crate) fn column_width<'a>(values: impl Iterator<Item = &'a str>, min: usize) -> usize {
    values.map(str::len).max().unwrap_or(min).max(min)
}
