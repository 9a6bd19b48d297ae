//! Error types for cf-core

use thiserror::Error;

/// Core error type for changeflow
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config {path}: {message}")]
    ConfigParseError { path: String, message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: No variables document for the requested environment
    #[error("[E004] No variables for environment '{environment}' in {dir} and no default.yaml. Known environments: {available}")]
    EnvironmentNotFound {
        environment: String,
        dir: String,
        available: String,
    },

    /// E005: Variables document is malformed
    #[error("[E005] Invalid variables file {path}: {message}")]
    VariablesInvalid { path: String, message: String },

    /// E006: No environment selected
    #[error("[E006] No environment selected. Pass --env, set CF_ENV, or set default_environment in config.yaml")]
    EnvironmentNotSelected,

    /// C001: Changelog document not found
    #[error("[C001] Changelog not found: {path}{}", included_from_suffix(.included_from))]
    ChangelogNotFound {
        path: String,
        included_from: Option<String>,
    },

    /// C002: Changelog document could not be parsed
    #[error("[C002] Failed to parse changelog {path}: {message}")]
    ChangelogParseError { path: String, message: String },

    /// C003: A document includes itself, directly or transitively
    #[error("[C003] Cyclic changelog include: {cycle}")]
    CyclicInclude { cycle: String },

    /// C004: Two change units resolve to the same id
    #[error("[C004] Duplicate change unit id '{id}' declared by {first} and {second}")]
    DuplicateChangeUnit {
        id: String,
        first: String,
        second: String,
    },

    /// C005: A change unit references a SQL file that does not exist
    #[error("[C005] SQL file not found: {path} (referenced by {changelog})")]
    ChangeUnitFileNotFound { path: String, changelog: String },

    /// C006: A changelog entry is malformed
    #[error("[C006] Invalid entry #{index} in {changelog}: {reason}")]
    InvalidEntry {
        changelog: String,
        index: usize,
        reason: String,
    },

    /// C007: A wildcard entry matched nothing
    #[error("[C007] Pattern '{pattern}' in {changelog} matched no files")]
    EmptyWildcard { pattern: String, changelog: String },

    /// C008: A declared dependency is not applied before the dependent unit
    #[error("[C008] Change unit '{id}' depends on '{dependency}', which is not declared before it")]
    UnresolvedDependency { id: String, dependency: String },

    /// P001: Already-applied content has changed
    #[error("[P001] Checksum mismatch for change unit '{id}': recorded {recorded}, current {current}. Applied change units must not be edited; add a new change unit instead")]
    ChecksumMismatch {
        id: String,
        recorded: String,
        current: String,
    },

    /// E014: IO error
    #[error("[E014] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E016: IO error with file path context
    #[error("[E016] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

fn included_from_suffix(included_from: &Option<String>) -> String {
    match included_from {
        Some(parent) => format!(" (included from {})", parent),
        None => String::new(),
    }
}

impl CoreError {
    /// Whether this error comes from project configuration or variables
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            CoreError::ConfigNotFound { .. }
                | CoreError::ConfigParseError { .. }
                | CoreError::ConfigInvalid { .. }
                | CoreError::EnvironmentNotFound { .. }
                | CoreError::VariablesInvalid { .. }
                | CoreError::EnvironmentNotSelected
        )
    }

    /// Whether this error comes from changelog resolution
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            CoreError::ChangelogNotFound { .. }
                | CoreError::ChangelogParseError { .. }
                | CoreError::CyclicInclude { .. }
                | CoreError::DuplicateChangeUnit { .. }
                | CoreError::ChangeUnitFileNotFound { .. }
                | CoreError::InvalidEntry { .. }
                | CoreError::EmptyWildcard { .. }
                | CoreError::UnresolvedDependency { .. }
        )
    }
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
