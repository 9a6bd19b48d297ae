//! Change units as resolved from the changelog and as rendered for a run.

use crate::change_id::ChangeId;
use crate::checksum::compute_checksum;
use std::path::PathBuf;

/// One apply-once SQL artifact, in its global apply position.
///
/// Recomputed from disk on every run; never persisted as such.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeUnit {
    /// Stable identity (declared, or the relative path)
    pub id: ChangeId,

    /// Absolute path of the file holding the SQL (the changelog for inline units)
    pub source_path: PathBuf,

    /// Source location relative to the project root, `/`-separated
    pub relative_path: String,

    /// Changelog document that declared this unit, relative to the project root
    pub changelog_path: String,

    /// Free-text description from the changelog entry
    pub description: String,

    /// Ids of units that must be applied before this one
    pub depends_on: Vec<ChangeId>,

    /// Template text before rendering
    pub raw_content: String,

    /// Zero-based position in the global apply order
    pub position: usize,
}

impl ChangeUnit {
    /// Whether the SQL is written inline in the changelog
    pub fn is_inline(&self) -> bool {
        self.relative_path == self.changelog_path
    }

    /// Name used for this unit in render errors
    pub fn source_name(&self) -> String {
        if self.is_inline() {
            format!("{} ({})", self.changelog_path, self.id)
        } else {
            self.relative_path.clone()
        }
    }
}

/// A change unit with its final SQL and the checksum of that SQL.
///
/// The checksum covers the rendered text, so a variable that changes the
/// output for one environment changes the checksum for that environment only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedUnit {
    pub unit: ChangeUnit,
    pub sql: String,
    pub checksum: String,
}

impl RenderedUnit {
    /// Attach rendered SQL to a unit and checksum it
    pub fn new(unit: ChangeUnit, sql: String) -> Self {
        let checksum = compute_checksum(&sql);
        Self {
            unit,
            sql,
            checksum,
        }
    }

    /// Id of the underlying change unit
    pub fn id(&self) -> &ChangeId {
        &self.unit.id
    }
}
