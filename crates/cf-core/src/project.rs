//! Project discovery: locates the master changelog and its config.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Default master changelog file name
pub const DEFAULT_CHANGELOG_FILE: &str = "master-changelogs.yaml";

/// A changeflow project rooted at the master changelog's directory
#[derive(Debug, Clone)]
pub struct Project {
    /// Canonical directory containing the master changelog
    pub root: PathBuf,

    /// Canonical path of the master changelog
    pub changelog: PathBuf,

    /// Project configuration
    pub config: Config,
}

impl Project {
    /// Load a project from its master changelog.
    ///
    /// The config is read from `config_override` when given, otherwise from
    /// `config.yaml` / `config.yml` next to the master changelog.
    pub fn load(changelog_file: &Path, config_override: Option<&Path>) -> CoreResult<Self> {
        if !changelog_file.is_file() {
            return Err(CoreError::ChangelogNotFound {
                path: changelog_file.display().to_string(),
                included_from: None,
            });
        }

        let changelog = changelog_file
            .canonicalize()
            .map_err(|e| CoreError::IoWithPath {
                path: changelog_file.display().to_string(),
                source: e,
            })?;
        let root = changelog
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| CoreError::ConfigInvalid {
                message: format!("{} has no parent directory", changelog.display()),
            })?;

        let config = match config_override {
            Some(path) => Config::load(path)?,
            None => Config::load_from_dir(&root)?,
        };

        Ok(Self {
            root,
            changelog,
            config,
        })
    }

    /// Absolute macros directory
    pub fn macros_dir(&self) -> PathBuf {
        self.config.macros_dir_absolute(&self.root)
    }

    /// Absolute variables directory
    pub fn variables_dir(&self) -> PathBuf {
        self.config.variables_dir_absolute(&self.root)
    }
}
