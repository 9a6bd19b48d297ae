//! Macro library: the project's macro files, indexed by macro name.
//!
//! Every macro file is registered with the renderer as a template and every
//! macro it defines is imported into each change unit's scope, so macro
//! names must be unique across the whole library.

use crate::error::{JinjaError, JinjaResult};
use minijinja::Environment;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const MACRO_EXTENSIONS: &[&str] = &["sql", "j2", "jinja", "jinja2"];

/// One macro file
#[derive(Debug, Clone)]
pub struct MacroFile {
    /// Template name, the path relative to the macro directory with `/` separators
    pub name: String,
    pub path: PathBuf,
    pub source: String,
    /// Macro names in definition order
    pub macros: Vec<String>,
}

/// Explicit macro name → template mapping for one run
#[derive(Debug, Clone, Default)]
pub struct MacroLibrary {
    files: Vec<MacroFile>,
    index: BTreeMap<String, usize>,
}

impl MacroLibrary {
    /// A library with no macros
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every macro file under `dir`, recursively, in lexical path order.
    ///
    /// A missing directory yields an empty library.
    pub fn load(dir: &Path) -> JinjaResult<Self> {
        if !dir.is_dir() {
            log::warn!(
                "Macro directory {} does not exist, no macros loaded",
                dir.display()
            );
            return Ok(Self::empty());
        }

        let mut paths = Vec::new();
        collect_macro_files(dir, &mut paths)?;

        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let name = template_name(dir, &path);
            let source = std::fs::read_to_string(&path).map_err(|e| JinjaError::IoWithPath {
                path: path.display().to_string(),
                source: e,
            })?;
            sources.push((name, path, source));
        }
        sources.sort_by(|a, b| a.0.cmp(&b.0));

        let library = Self::build(sources)?;
        log::debug!(
            "Loaded {} macros from {} files in {}",
            library.len(),
            library.files.len(),
            dir.display()
        );
        Ok(library)
    }

    /// Build a library from in-memory `(template name, source)` pairs
    pub fn from_sources(sources: Vec<(String, String)>) -> JinjaResult<Self> {
        Self::build(
            sources
                .into_iter()
                .map(|(name, source)| {
                    let path = PathBuf::from(&name);
                    (name, path, source)
                })
                .collect(),
        )
    }

    fn build(sources: Vec<(String, PathBuf, String)>) -> JinjaResult<Self> {
        let mut syntax_env = syntax_environment();
        let mut files: Vec<MacroFile> = Vec::with_capacity(sources.len());
        let mut index = BTreeMap::new();

        for (name, path, source) in sources {
            syntax_env
                .add_template_owned(name.clone(), source.clone())
                .map_err(|e| JinjaError::MacroSyntax {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;

            let macros = extract_macro_names(&source);
            if let Some(repeated) = first_repeated(&macros) {
                return Err(JinjaError::DuplicateMacro {
                    name: repeated.to_string(),
                    first: name.clone(),
                    second: name,
                });
            }
            for macro_name in &macros {
                if let Some(&prev) = index.get(macro_name) {
                    let prev: &MacroFile = &files[prev];
                    return Err(JinjaError::DuplicateMacro {
                        name: macro_name.clone(),
                        first: prev.name.clone(),
                        second: name.clone(),
                    });
                }
                index.insert(macro_name.clone(), files.len());
            }

            log::debug!("Macro file {}: {}", name, macros.join(", "));
            files.push(MacroFile {
                name,
                path,
                source,
                macros,
            });
        }

        Ok(Self { files, index })
    }

    /// All macro names, sorted
    pub fn macro_names(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Template name of the file defining `macro_name`
    pub fn template_for(&self, macro_name: &str) -> Option<&str> {
        self.index
            .get(macro_name)
            .map(|&idx| self.files[idx].name.as_str())
    }

    /// Macro files in lexical order
    pub fn files(&self) -> &[MacroFile] {
        &self.files
    }

    /// Number of macros
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Environment used to compile macro files for syntax checking only
pub(crate) fn syntax_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env
}

/// Macro names defined in a template source, in definition order
///
/// Matches `{% macro name(` and `{%- macro name(`.
fn extract_macro_names(content: &str) -> Vec<String> {
    static MACRO_PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    let pattern = MACRO_PATTERN.get_or_init(|| {
        regex::Regex::new(r"\{%-?\s*macro\s+(\w+)\s*\(").expect("valid regex literal")
    });
    pattern
        .captures_iter(content)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

fn first_repeated(names: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(String::as_str)
        .find(|name| !seen.insert(*name))
}

fn collect_macro_files(dir: &Path, files: &mut Vec<PathBuf>) -> JinjaResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| JinjaError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| JinjaError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_macro_files(&path, files)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| MACRO_EXTENSIONS.contains(&e))
        {
            files.push(path);
        }
    }
    Ok(())
}

fn template_name(dir: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(dir).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
#[path = "macros_test.rs"]
mod tests;
