//! Environment variable overlays: `common.yaml` merged with `<env>.yaml`.
//!
//! Merge rule: mappings merge key by key (recursively); scalars and lists in
//! the overlay replace the base value wholesale.

use crate::error::{CoreError, CoreResult};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const COMMON_DOC: &str = "common";
const DEFAULT_DOC: &str = "default";

/// Immutable set of template variables for one environment.
///
/// Built once per run and shared read-only; there is no mutating API.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSet {
    environment: String,
    values: BTreeMap<String, Value>,
}

impl VariableSet {
    /// Load `common` and the environment's overlay from `dir`.
    ///
    /// Falls back to `default.yaml` when the environment has no document of
    /// its own; fails when neither exists.
    pub fn load(dir: &Path, environment: &str) -> CoreResult<Self> {
        let common = match find_document(dir, COMMON_DOC) {
            Some(path) => read_mapping(&path)?,
            None => {
                log::debug!("No common variables in {}", dir.display());
                Mapping::new()
            }
        };

        let overlay_path = find_document(dir, environment)
            .or_else(|| {
                find_document(dir, DEFAULT_DOC).inspect(|p| {
                    log::info!(
                        "No variables for environment '{}', using {}",
                        environment,
                        p.display()
                    )
                })
            })
            .ok_or_else(|| CoreError::EnvironmentNotFound {
                environment: environment.to_string(),
                dir: dir.display().to_string(),
                available: available_environments(dir).join(", "),
            })?;
        let overlay = read_mapping(&overlay_path)?;

        Ok(Self::from_layers(environment, common, overlay))
    }

    /// Merge a base mapping with an environment overlay.
    pub fn from_layers(environment: &str, common: Mapping, overlay: Mapping) -> Self {
        let merged = merge_values(&Value::Mapping(common), &Value::Mapping(overlay));
        let values = match merged {
            Value::Mapping(map) => map
                .into_iter()
                .filter_map(|(k, v)| k.as_str().map(|key| (key.to_string(), v)))
                .collect(),
            _ => BTreeMap::new(),
        };
        Self {
            environment: environment.to_string(),
            values,
        }
    }

    /// Environment these variables were resolved for
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Get a variable value by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Check whether a variable is defined
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterate variables in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Borrow the whole name → value map
    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Number of top-level variables
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no variables are defined
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Overlay `overlay` on top of `base`.
///
/// Two mappings merge key by key, recursing into nested mappings. Any other
/// combination returns `overlay` unchanged, so lists are replaced, never
/// appended.
pub fn merge_values(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in overlay_map {
                let next = match merged.get(key) {
                    Some(existing) => merge_values(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Mapping(merged)
        }
        _ => overlay.clone(),
    }
}

fn find_document(dir: &Path, stem: &str) -> Option<PathBuf> {
    ["yaml", "yml"]
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|p| p.is_file())
}

fn read_mapping(path: &Path) -> CoreResult<Mapping> {
    let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
        path: path.display().to_string(),
        source: e,
    })?;
    let value: Value = serde_yaml::from_str(&content).map_err(|e| CoreError::VariablesInvalid {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    match value {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(map) => {
            if let Some(bad) = map.keys().find(|k| k.as_str().is_none()) {
                return Err(CoreError::VariablesInvalid {
                    path: path.display().to_string(),
                    message: format!("variable names must be strings, found {:?}", bad),
                });
            }
            Ok(map)
        }
        _ => Err(CoreError::VariablesInvalid {
            path: path.display().to_string(),
            message: "top level must be a mapping of variable names to values".to_string(),
        }),
    }
}

/// Environments that have their own variables document in `dir`, sorted
fn available_environments(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| {
                    p.extension()
                        .is_some_and(|ext| ext == "yaml" || ext == "yml")
                })
                .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
                .filter(|stem| stem != COMMON_DOC)
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names.dedup();
    names
}

#[cfg(test)]
#[path = "variables_test.rs"]
mod tests;
