//! Depth-first expansion of the include graph into one ordered unit list.
//!
//! Traversal is driven by an explicit stack of frames, one per document
//! being expanded. A document found on the stack again is a cycle; a
//! document reached again after it was expanded (a diamond) is skipped.

use super::{ChangelogDocument, ChangelogEntry, EntryKind};
use crate::change_id::ChangeId;
use crate::error::{CoreError, CoreResult};
use crate::unit::ChangeUnit;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// Output of changelog resolution
#[derive(Debug, Clone)]
pub struct ResolvedChangelog {
    /// Project root that ids and display paths are relative to
    pub root: PathBuf,

    /// Canonical path of the master changelog
    pub master: PathBuf,

    /// Documents in the order they were first expanded
    pub documents: Vec<PathBuf>,

    /// Change units in global apply order
    pub units: Vec<ChangeUnit>,
}

impl ResolvedChangelog {
    /// Look up a unit by id
    pub fn get(&self, id: &str) -> Option<&ChangeUnit> {
        self.units.iter().find(|u| u.id == id)
    }
}

struct Frame {
    path: PathBuf,
    display: String,
    entries: Vec<ChangelogEntry>,
    next: usize,
    /// Documents matched by the current include entry, not yet expanded
    queued: VecDeque<PathBuf>,
}

struct Resolver<'a> {
    root: &'a Path,
    stack: Vec<Frame>,
    expanded: HashSet<PathBuf>,
    documents: Vec<PathBuf>,
    units: Vec<ChangeUnit>,
    /// id -> display of the source that declared it
    declared: HashMap<ChangeId, String>,
}

/// Resolve `master` (and everything it includes) into ordered change units.
///
/// `root` must be canonical; `master` may be relative to the working
/// directory.
pub fn resolve(root: &Path, master: &Path) -> CoreResult<ResolvedChangelog> {
    let master = canonical(master, None, root)?;
    let mut resolver = Resolver {
        root,
        stack: Vec::new(),
        expanded: HashSet::new(),
        documents: Vec::new(),
        units: Vec::new(),
        declared: HashMap::new(),
    };
    resolver.push_document(master.clone())?;
    resolver.run()?;

    log::debug!(
        "Resolved {} change units from {} changelog documents",
        resolver.units.len(),
        resolver.documents.len()
    );

    Ok(ResolvedChangelog {
        root: root.to_path_buf(),
        master,
        documents: resolver.documents,
        units: resolver.units,
    })
}

impl Resolver<'_> {
    fn run(&mut self) -> CoreResult<()> {
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(());
            };

            if let Some(next_doc) = frame.queued.pop_front() {
                self.include(next_doc)?;
                continue;
            }

            if frame.next >= frame.entries.len() {
                let done = self.stack.pop();
                if let Some(done) = done {
                    log::debug!("Finished changelog {}", done.display);
                }
                continue;
            }

            let index = frame.next;
            frame.next += 1;
            let entry = frame.entries[index].clone();
            let doc_path = frame.path.clone();
            let doc_display = frame.display.clone();

            match entry.kind {
                EntryKind::Sql => self.add_sql_entry(&entry, index, &doc_path, &doc_display)?,
                EntryKind::Yaml => {
                    let matched = self.match_includes(&entry, index, &doc_path, &doc_display)?;
                    if let Some(frame) = self.stack.last_mut() {
                        frame.queued.extend(matched);
                    }
                }
            }
        }
    }

    /// Expand an included document, unless it is already expanded or on the stack
    fn include(&mut self, path: PathBuf) -> CoreResult<()> {
        if let Some(pos) = self.stack.iter().position(|f| f.path == path) {
            let mut cycle: Vec<&str> = self.stack[pos..]
                .iter()
                .map(|f| f.display.as_str())
                .collect();
            cycle.push(self.stack[pos].display.as_str());
            return Err(CoreError::CyclicInclude {
                cycle: cycle.join(" -> "),
            });
        }
        if self.expanded.contains(&path) {
            log::debug!(
                "Skipping {}: already expanded earlier in the changelog",
                display_path(self.root, &path)
            );
            return Ok(());
        }
        self.push_document(path)
    }

    fn push_document(&mut self, path: PathBuf) -> CoreResult<()> {
        let display = display_path(self.root, &path);
        let doc = ChangelogDocument::load(&path, &display)?;
        log::debug!(
            "Expanding changelog {} ({} entries)",
            display,
            doc.changes.len()
        );
        self.expanded.insert(path.clone());
        self.documents.push(path.clone());
        self.stack.push(Frame {
            path,
            display,
            entries: doc.changes,
            next: 0,
            queued: VecDeque::new(),
        });
        Ok(())
    }

    fn match_includes(
        &self,
        entry: &ChangelogEntry,
        index: usize,
        doc_path: &Path,
        doc_display: &str,
    ) -> CoreResult<Vec<PathBuf>> {
        let invalid = |reason: &str| CoreError::InvalidEntry {
            changelog: doc_display.to_string(),
            index,
            reason: reason.to_string(),
        };
        if entry.sql.is_some() || entry.id.is_some() || !entry.depends_on.is_empty() {
            return Err(invalid(
                "include entries take only `file` and `description`",
            ));
        }
        let file = entry
            .file
            .as_deref()
            .ok_or_else(|| invalid("include entry is missing `file`"))?;

        if entry.is_wildcard() {
            return self.expand_pattern(file, index, doc_path, doc_display);
        }

        let path = document_dir(doc_path).join(file);
        if !path.is_file() {
            return Err(CoreError::ChangelogNotFound {
                path: display_path(self.root, &path),
                included_from: Some(doc_display.to_string()),
            });
        }
        Ok(vec![canonical(&path, Some(doc_display), self.root)?])
    }

    fn add_sql_entry(
        &mut self,
        entry: &ChangelogEntry,
        index: usize,
        doc_path: &Path,
        doc_display: &str,
    ) -> CoreResult<()> {
        let invalid = |reason: &str| CoreError::InvalidEntry {
            changelog: doc_display.to_string(),
            index,
            reason: reason.to_string(),
        };

        match (&entry.file, &entry.sql) {
            (Some(_), Some(_)) => Err(invalid("`file` and `sql` are mutually exclusive")),
            (None, None) => Err(invalid("sql entry needs either `file` or `sql`")),
            (None, Some(sql)) => {
                let id = entry
                    .id
                    .clone()
                    .ok_or_else(|| invalid("inline sql entry requires an `id`"))?;
                let source = format!("{} (inline #{})", doc_display, index);
                self.push_unit(
                    id,
                    doc_path.to_path_buf(),
                    doc_display.to_string(),
                    source,
                    entry,
                    doc_display,
                    sql.clone(),
                )
            }
            (Some(file), None) => {
                let paths = if entry.is_wildcard() {
                    if entry.id.is_some() {
                        return Err(invalid("`id` cannot be combined with a wildcard `file`"));
                    }
                    self.expand_pattern(file, index, doc_path, doc_display)?
                } else {
                    let path = document_dir(doc_path).join(file);
                    if !path.is_file() {
                        return Err(CoreError::ChangeUnitFileNotFound {
                            path: display_path(self.root, &path),
                            changelog: doc_display.to_string(),
                        });
                    }
                    vec![canonical(&path, Some(doc_display), self.root)?]
                };

                for path in paths {
                    let relative = display_path(self.root, &path);
                    let id = match &entry.id {
                        Some(id) => id.clone(),
                        None => ChangeId::try_new(relative.clone())
                            .ok_or_else(|| invalid("file path is not a valid change id"))?,
                    };
                    let content =
                        std::fs::read_to_string(&path).map_err(|e| CoreError::IoWithPath {
                            path: relative.clone(),
                            source: e,
                        })?;
                    self.push_unit(
                        id,
                        path,
                        relative.clone(),
                        relative,
                        entry,
                        doc_display,
                        content,
                    )?;
                }
                Ok(())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn push_unit(
        &mut self,
        id: ChangeId,
        source_path: PathBuf,
        relative_path: String,
        source_label: String,
        entry: &ChangelogEntry,
        doc_display: &str,
        raw_content: String,
    ) -> CoreResult<()> {
        if let Some(first) = self.declared.get(&id) {
            return Err(CoreError::DuplicateChangeUnit {
                id: id.to_string(),
                first: first.clone(),
                second: source_label,
            });
        }
        if let Some(missing) = entry
            .depends_on
            .iter()
            .find(|dep| !self.declared.contains_key(*dep))
        {
            return Err(CoreError::UnresolvedDependency {
                id: id.to_string(),
                dependency: missing.to_string(),
            });
        }

        log::debug!("Change unit #{} {}", self.units.len() + 1, id);
        self.declared.insert(id.clone(), source_label);
        self.units.push(ChangeUnit {
            id,
            source_path,
            relative_path,
            changelog_path: doc_display.to_string(),
            description: entry.description.clone().unwrap_or_default(),
            depends_on: entry.depends_on.clone(),
            raw_content,
            position: self.units.len(),
        });
        Ok(())
    }

    /// Expand a glob relative to the declaring document, sorted lexically
    fn expand_pattern(
        &self,
        pattern: &str,
        index: usize,
        doc_path: &Path,
        doc_display: &str,
    ) -> CoreResult<Vec<PathBuf>> {
        let full = document_dir(doc_path).join(pattern);
        let full = full.to_string_lossy();
        let paths = glob::glob(&full).map_err(|e| CoreError::InvalidEntry {
            changelog: doc_display.to_string(),
            index,
            reason: format!("invalid pattern '{}': {}", pattern, e),
        })?;

        let mut matched: Vec<PathBuf> = paths
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .map(|p| canonical(&p, Some(doc_display), self.root))
            .collect::<CoreResult<_>>()?;
        matched.sort_by_key(|p| display_path(self.root, p));
        matched.dedup();

        if matched.is_empty() {
            return Err(CoreError::EmptyWildcard {
                pattern: pattern.to_string(),
                changelog: doc_display.to_string(),
            });
        }
        log::debug!(
            "Pattern '{}' in {} matched {} files",
            pattern,
            doc_display,
            matched.len()
        );
        Ok(matched)
    }
}

fn document_dir(doc_path: &Path) -> &Path {
    doc_path.parent().unwrap_or_else(|| Path::new("."))
}

fn canonical(path: &Path, included_from: Option<&str>, root: &Path) -> CoreResult<PathBuf> {
    path.canonicalize().map_err(|_| CoreError::ChangelogNotFound {
        path: display_path(root, path),
        included_from: included_from.map(String::from),
    })
}

/// Path relative to the project root with `/` separators, or the full path
/// when it lies outside the root
fn display_path(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.display().to_string(),
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
