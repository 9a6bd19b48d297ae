use super::*;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        Self { _dir: dir, root }
    }

    fn write(&self, rel: &str, content: &str) -> &Self {
        let path = self.root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
        self
    }

    fn resolve(&self, master: &str) -> CoreResult<ResolvedChangelog> {
        resolve(&self.root, &self.root.join(master))
    }
}

fn ids(resolved: &ResolvedChangelog) -> Vec<String> {
    resolved.units.iter().map(|u| u.id.to_string()).collect()
}

#[test]
fn test_nested_three_levels_keep_declared_order() {
    let fx = Fixture::new();
    fx.write(
        "master-changelogs.yaml",
        r#"
changes:
  - type: yaml
    file: level1/changelog.yaml
  - type: sql
    file: 00_after.sql
"#,
    )
    .write(
        "level1/changelog.yaml",
        r#"
changes:
  - type: sql
    file: z_first.sql
  - type: include
    file: level2/changelog.yaml
  - type: sql
    file: m_last.sql
"#,
    )
    .write(
        "level1/level2/changelog.yaml",
        r#"
changes:
  - type: sql
    file: b.sql
  - type: yaml
    file: level3/changelog.yaml
"#,
    )
    .write(
        "level1/level2/level3/changelog.yaml",
        "changes:\n  - type: sql\n    file: a.sql\n",
    )
    .write("00_after.sql", "SELECT 5")
    .write("level1/z_first.sql", "SELECT 1")
    .write("level1/m_last.sql", "SELECT 4")
    .write("level1/level2/b.sql", "SELECT 2")
    .write("level1/level2/level3/a.sql", "SELECT 3");

    let resolved = fx.resolve("master-changelogs.yaml").unwrap();
    assert_eq!(
        ids(&resolved),
        vec![
            "level1/z_first.sql",
            "level1/level2/b.sql",
            "level1/level2/level3/a.sql",
            "level1/m_last.sql",
            "00_after.sql",
        ]
    );
    let positions: Vec<usize> = resolved.units.iter().map(|u| u.position).collect();
    assert_eq!(positions, vec![0, 1, 2, 3, 4]);
    assert_eq!(resolved.documents.len(), 4);
    assert_eq!(resolved.units[2].raw_content, "SELECT 3");
    assert_eq!(
        resolved.units[2].changelog_path,
        "level1/level2/level3/changelog.yaml"
    );
}

#[test]
fn test_explicit_id_and_metadata() {
    let fx = Fixture::new();
    fx.write(
        "master.yaml",
        r#"
changes:
  - type: sql
    file: ods/create_table.sql
    id: ods-create
    description: Create ODS table
"#,
    )
    .write("ods/create_table.sql", "CREATE TABLE t (id INT)");

    let resolved = fx.resolve("master.yaml").unwrap();
    let unit = resolved.get("ods-create").unwrap();
    assert_eq!(unit.relative_path, "ods/create_table.sql");
    assert_eq!(unit.description, "Create ODS table");
    assert_eq!(unit.source_path, fx.root.join("ods/create_table.sql"));
}

#[test]
fn test_cycle_is_named() {
    let fx = Fixture::new();
    fx.write("a.yaml", "changes:\n  - type: yaml\n    file: b.yaml\n")
        .write("b.yaml", "changes:\n  - type: yaml\n    file: a.yaml\n");

    let err = fx.resolve("a.yaml").unwrap_err();
    match &err {
        CoreError::CyclicInclude { cycle } => assert_eq!(cycle, "a.yaml -> b.yaml -> a.yaml"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_resolution());
}

#[test]
fn test_self_include_is_a_cycle() {
    let fx = Fixture::new();
    fx.write("a.yaml", "changes:\n  - type: yaml\n    file: ./a.yaml\n");
    let err = fx.resolve("a.yaml").unwrap_err();
    assert!(matches!(err, CoreError::CyclicInclude { .. }));
}

#[test]
fn test_diamond_expands_once_at_first_position() {
    let fx = Fixture::new();
    fx.write(
        "master.yaml",
        r#"
changes:
  - type: yaml
    file: x.yaml
  - type: yaml
    file: y.yaml
"#,
    )
    .write(
        "x.yaml",
        "changes:\n  - type: yaml\n    file: shared.yaml\n  - type: sql\n    file: x.sql\n",
    )
    .write(
        "y.yaml",
        "changes:\n  - type: yaml\n    file: shared.yaml\n  - type: sql\n    file: y.sql\n",
    )
    .write("shared.yaml", "changes:\n  - type: sql\n    file: s.sql\n")
    .write("s.sql", "SELECT 's'")
    .write("x.sql", "SELECT 'x'")
    .write("y.sql", "SELECT 'y'");

    let resolved = fx.resolve("master.yaml").unwrap();
    assert_eq!(ids(&resolved), vec!["s.sql", "x.sql", "y.sql"]);
}

#[test]
fn test_wildcard_sorted_lexically() {
    let fx = Fixture::new();
    fx.write("master.yaml", "changes:\n  - type: sql\n    file: \"edw/*.sql\"\n")
        .write("edw/10_grants.sql", "SELECT 10")
        .write("edw/02_view.sql", "SELECT 2")
        .write("edw/01_table.sql", "SELECT 1")
        .write("edw/notes.txt", "ignored");

    let resolved = fx.resolve("master.yaml").unwrap();
    assert_eq!(
        ids(&resolved),
        vec!["edw/01_table.sql", "edw/02_view.sql", "edw/10_grants.sql"]
    );
}

#[test]
fn test_wildcard_include() {
    let fx = Fixture::new();
    fx.write(
        "master.yaml",
        "changes:\n  - type: include\n    file: \"modules/*.yaml\"\n",
    )
    .write("modules/b.yaml", "changes:\n  - type: sql\n    file: b.sql\n")
    .write("modules/a.yaml", "changes:\n  - type: sql\n    file: a.sql\n")
    .write("modules/a.sql", "SELECT 1")
    .write("modules/b.sql", "SELECT 2");

    let resolved = fx.resolve("master.yaml").unwrap();
    assert_eq!(ids(&resolved), vec!["modules/a.sql", "modules/b.sql"]);
}

#[test]
fn test_empty_wildcard_is_error() {
    let fx = Fixture::new();
    fx.write("master.yaml", "changes:\n  - type: sql\n    file: \"none/*.sql\"\n");
    let err = fx.resolve("master.yaml").unwrap_err();
    assert!(matches!(err, CoreError::EmptyWildcard { .. }));
}

#[test]
fn test_wildcard_with_id_rejected() {
    let fx = Fixture::new();
    fx.write(
        "master.yaml",
        "changes:\n  - type: sql\n    file: \"*.sql\"\n    id: all\n",
    )
    .write("a.sql", "SELECT 1");
    let err = fx.resolve("master.yaml").unwrap_err();
    assert!(matches!(err, CoreError::InvalidEntry { index: 0, .. }));
}

#[test]
fn test_duplicate_ids_name_both_sources() {
    let fx = Fixture::new();
    fx.write(
        "master.yaml",
        r#"
changes:
  - type: sql
    file: a.sql
    id: same
  - type: yaml
    file: sub/changelog.yaml
"#,
    )
    .write(
        "sub/changelog.yaml",
        "changes:\n  - type: sql\n    file: b.sql\n    id: same\n",
    )
    .write("a.sql", "SELECT 1")
    .write("sub/b.sql", "SELECT 2");

    let err = fx.resolve("master.yaml").unwrap_err();
    match err {
        CoreError::DuplicateChangeUnit { id, first, second } => {
            assert_eq!(id, "same");
            assert_eq!(first, "a.sql");
            assert_eq!(second, "sub/b.sql");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_same_file_listed_twice_is_duplicate() {
    let fx = Fixture::new();
    fx.write(
        "master.yaml",
        "changes:\n  - type: sql\n    file: a.sql\n  - type: sql\n    file: ./a.sql\n",
    )
    .write("a.sql", "SELECT 1");
    let err = fx.resolve("master.yaml").unwrap_err();
    assert!(matches!(err, CoreError::DuplicateChangeUnit { .. }));
}

#[test]
fn test_missing_sql_file_names_changelog() {
    let fx = Fixture::new();
    fx.write(
        "sub/changelog.yaml",
        "changes:\n  - type: sql\n    file: missing.sql\n",
    )
    .write("master.yaml", "changes:\n  - type: yaml\n    file: sub/changelog.yaml\n");

    let err = fx.resolve("master.yaml").unwrap_err();
    match err {
        CoreError::ChangeUnitFileNotFound { path, changelog } => {
            assert_eq!(path, "sub/missing.sql");
            assert_eq!(changelog, "sub/changelog.yaml");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_include_names_parent() {
    let fx = Fixture::new();
    fx.write("master.yaml", "changes:\n  - type: yaml\n    file: gone.yaml\n");
    let err = fx.resolve("master.yaml").unwrap_err();
    match err {
        CoreError::ChangelogNotFound {
            path,
            included_from,
        } => {
            assert_eq!(path, "gone.yaml");
            assert_eq!(included_from.as_deref(), Some("master.yaml"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_inline_sql_requires_id() {
    let fx = Fixture::new();
    fx.write(
        "master.yaml",
        "changes:\n  - type: sql\n    sql: \"SELECT 1\"\n",
    );
    let err = fx.resolve("master.yaml").unwrap_err();
    assert!(matches!(err, CoreError::InvalidEntry { .. }));

    fx.write(
        "master.yaml",
        "changes:\n  - type: sql\n    id: grant-reader\n    sql: \"GRANT SELECT ON t TO reader\"\n",
    );
    let resolved = fx.resolve("master.yaml").unwrap();
    let unit = resolved.get("grant-reader").unwrap();
    assert_eq!(unit.raw_content, "GRANT SELECT ON t TO reader");
    assert_eq!(unit.relative_path, "master.yaml");
}

#[test]
fn test_depends_on_must_be_earlier() {
    let fx = Fixture::new();
    fx.write("a.sql", "SELECT 1").write("b.sql", "SELECT 2");

    fx.write(
        "ok.yaml",
        r#"
changes:
  - type: sql
    file: a.sql
  - type: sql
    file: b.sql
    depends_on: [a.sql]
"#,
    );
    let resolved = fx.resolve("ok.yaml").unwrap();
    assert_eq!(resolved.units[1].depends_on, vec![ChangeId::try_new("a.sql").unwrap()]);

    fx.write(
        "bad.yaml",
        r#"
changes:
  - type: sql
    file: b.sql
    depends_on: [a.sql]
  - type: sql
    file: a.sql
"#,
    );
    let err = fx.resolve("bad.yaml").unwrap_err();
    match err {
        CoreError::UnresolvedDependency { id, dependency } => {
            assert_eq!(id, "b.sql");
            assert_eq!(dependency, "a.sql");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_resolution_is_deterministic() {
    let fx = Fixture::new();
    fx.write("master.yaml", "changes:\n  - type: sql\n    file: \"*.sql\"\n")
        .write("b.sql", "SELECT 2")
        .write("a.sql", "SELECT 1");
    let first = fx.resolve("master.yaml").unwrap();
    let second = fx.resolve("master.yaml").unwrap();
    assert_eq!(first.units, second.units);
}
