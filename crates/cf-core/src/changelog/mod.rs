//! Changelog documents and their expansion into an ordered unit sequence.

mod resolver;

pub use resolver::{resolve, ResolvedChangelog};

use crate::change_id::ChangeId;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A parsed changelog document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangelogDocument {
    /// Entries in declared order
    #[serde(default)]
    pub changes: Vec<ChangelogEntry>,
}

/// Kind of a changelog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A SQL change unit (file, wildcard or inline)
    Sql,
    /// A nested changelog document
    #[serde(alias = "include")]
    Yaml,
}

/// One entry of a changelog document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangelogEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,

    /// Path or glob pattern, relative to the declaring document
    #[serde(default)]
    pub file: Option<String>,

    /// Explicit change id; defaults to the file path relative to the project root
    #[serde(default)]
    pub id: Option<ChangeId>,

    /// Inline statement text (requires `id`)
    #[serde(default)]
    pub sql: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Ids that must appear earlier in the apply order
    #[serde(default)]
    pub depends_on: Vec<ChangeId>,
}

impl ChangelogEntry {
    /// Whether `file` is a glob pattern rather than a single path
    pub fn is_wildcard(&self) -> bool {
        self.file.as_deref().is_some_and(is_glob_pattern)
    }
}

impl ChangelogDocument {
    /// Read and parse a document. An empty file is an empty changelog.
    pub fn load(path: &Path, display: &str) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: display.to_string(),
            source: e,
        })?;
        Self::parse(&content, display)
    }

    /// Parse document text; `display` names the document in errors
    pub fn parse(content: &str, display: &str) -> CoreResult<Self> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| CoreError::ChangelogParseError {
                path: display.to_string(),
                message: e.to_string(),
            })?;
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_yaml::from_value(value).map_err(|e| CoreError::ChangelogParseError {
            path: display.to_string(),
            message: e.to_string(),
        })
    }
}

/// Whether a path contains glob metacharacters
pub fn is_glob_pattern(path: &str) -> bool {
    path.contains(['*', '?', '['])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries() {
        let doc = ChangelogDocument::parse(
            r#"
changes:
  - type: include
    file: ods/changelog.yaml
  - type: sql
    file: ods/create_table.sql
    id: ods-create
    description: Create ODS table
    depends_on: [bootstrap]
  - type: sql
    file: "edw/*.sql"
"#,
            "master-changelogs.yaml",
        )
        .unwrap();
        assert_eq!(doc.changes.len(), 3);
        assert_eq!(doc.changes[0].kind, EntryKind::Yaml);
        assert_eq!(doc.changes[1].id.as_ref().unwrap(), "ods-create");
        assert_eq!(doc.changes[1].depends_on, vec![ChangeId::try_new("bootstrap").unwrap()]);
        assert!(!doc.changes[1].is_wildcard());
        assert!(doc.changes[2].is_wildcard());
    }

    #[test]
    fn test_empty_document() {
        let doc = ChangelogDocument::parse("", "empty.yaml").unwrap();
        assert!(doc.changes.is_empty());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ChangelogDocument::parse(
            "changes:\n  - type: sql\n    file: a.sql\n    runAlways: true\n",
            "bad.yaml",
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ChangelogParseError { .. }));
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = ChangelogDocument::parse("changes:\n  - type: xml\n    file: a.xml\n", "x.yaml")
            .unwrap_err();
        assert!(matches!(err, CoreError::ChangelogParseError { .. }));
    }
}
