//! Configuration types and parsing for config.yaml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable consulted when `--env` is not given
pub const ENV_VAR: &str = "CF_ENV";

/// Project configuration from config.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Target database connection
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Name of the history table (optionally `schema.table`)
    #[serde(default = "default_history_table")]
    pub history_table: String,

    /// Environment used when neither `--env` nor `CF_ENV` is set
    #[serde(default)]
    pub default_environment: Option<String>,

    /// Directory containing macro files
    #[serde(default = "default_macros_dir")]
    pub macros_dir: String,

    /// Directory containing `common.yaml` and one document per environment
    #[serde(default = "default_variables_dir")]
    pub variables_dir: String,

    /// Per-environment overrides (e.g. dev, uat, prd)
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentConfig>,
}

/// Environment-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Database configuration override
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

/// Database type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// DuckDB (default)
    #[default]
    DuckDb,
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::DuckDb => write!(f, "duckdb"),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database type
    #[serde(rename = "type", default)]
    pub db_type: DbType,

    /// Database path (file-based or `:memory:`)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DbType::default(),
            path: default_db_path(),
        }
    }
}

impl DatabaseConfig {
    /// Whether this connection targets a transient in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.path == MEMORY_DB_PATH
    }

    /// Resolve the database path against the project root.
    ///
    /// `:memory:` and absolute paths are returned unchanged.
    pub fn resolved_path(&self, root: &Path) -> String {
        if self.is_in_memory() || Path::new(&self.path).is_absolute() {
            self.path.clone()
        } else {
            root.join(&self.path).display().to_string()
        }
    }
}

const MEMORY_DB_PATH: &str = ":memory:";

fn default_db_path() -> String {
    MEMORY_DB_PATH.to_string()
}

fn default_history_table() -> String {
    "changelog_state".to_string()
}

fn default_macros_dir() -> String {
    "macros".to_string()
}

fn default_variables_dir() -> String {
    "variables".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            history_table: default_history_table(),
            default_environment: None,
            macros_dir: default_macros_dir(),
            variables_dir: default_variables_dir(),
            environments: HashMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for config.yaml or config.yml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yaml_path = dir.join("config.yaml");
        let yml_path = dir.join("config.yml");

        if yaml_path.exists() {
            Self::load(&yaml_path)
        } else if yml_path.exists() {
            Self::load(&yml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yaml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if !is_valid_table_name(&self.history_table) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "history_table '{}' must be an identifier or schema.identifier",
                    self.history_table
                ),
            });
        }

        if self.macros_dir.trim().is_empty() || self.variables_dir.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "macros_dir and variables_dir cannot be empty".to_string(),
            });
        }

        if let Some(env) = &self.default_environment {
            if env.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: "default_environment cannot be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get absolute macros directory relative to a project root
    pub fn macros_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.macros_dir)
    }

    /// Get absolute variables directory relative to a project root
    pub fn variables_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.variables_dir)
    }

    /// Get database configuration, applying the environment override if any
    pub fn database_for(&self, environment: &str) -> &DatabaseConfig {
        self.environments
            .get(environment)
            .and_then(|ec| ec.database.as_ref())
            .unwrap_or(&self.database)
    }

    /// Resolve the environment from the CLI flag, `CF_ENV`, or `default_environment`
    ///
    /// Priority: CLI flag > CF_ENV env var > config default
    pub fn resolve_environment(&self, cli_env: Option<&str>) -> CoreResult<String> {
        cli_env
            .map(String::from)
            .or_else(|| std::env::var(ENV_VAR).ok().filter(|v| !v.is_empty()))
            .or_else(|| self.default_environment.clone())
            .ok_or(CoreError::EnvironmentNotSelected)
    }
}

/// Check a table name is `ident` or `schema.ident` with plain identifiers.
///
/// The name is interpolated into DDL, so anything else is rejected.
pub fn is_valid_table_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.is_empty() || parts.len() > 2 {
        return false;
    }
    parts.iter().all(|part| {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
