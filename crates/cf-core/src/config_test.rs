use super::*;
use serial_test::serial;
use tempfile::TempDir;

#[test]
fn test_parse_minimal_config() {
    let config: Config = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config.history_table, "changelog_state");
    assert_eq!(config.database.db_type, DbType::DuckDb);
    assert!(config.database.is_in_memory());
    let root = PathBuf::from("/tmp/project");
    assert_eq!(config.macros_dir_absolute(&root), root.join("macros"));
    assert_eq!(config.variables_dir_absolute(&root), root.join("variables"));
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
database:
  type: duckdb
  path: warehouse.duckdb
history_table: ops.changelog_state
default_environment: dev
macros_dir: sql_macros
variables_dir: vars
environments:
  prd:
    database:
      path: /data/prd.duckdb
  uat: {}
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    config.validate().unwrap();
    assert_eq!(config.history_table, "ops.changelog_state");
    assert_eq!(config.default_environment.as_deref(), Some("dev"));
    assert_eq!(config.database_for("dev").path, "warehouse.duckdb");
    assert_eq!(config.database_for("uat").path, "warehouse.duckdb");
    assert_eq!(config.database_for("prd").path, "/data/prd.duckdb");
}

#[test]
fn test_unknown_field_rejected() {
    let result: Result<Config, _> = serde_yaml::from_str("databse:\n  path: x.duckdb\n");
    assert!(result.is_err());
}

#[test]
fn test_resolved_path() {
    let root = Path::new("/srv/project");
    let relative = DatabaseConfig {
        db_type: DbType::DuckDb,
        path: "dev.duckdb".to_string(),
    };
    assert_eq!(relative.resolved_path(root), "/srv/project/dev.duckdb");
    assert_eq!(DatabaseConfig::default().resolved_path(root), ":memory:");
}

#[test]
fn test_invalid_history_table_rejected() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.yaml"),
        "history_table: \"state; DROP TABLE x\"\n",
    )
    .unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
    assert!(err.is_config());
}

#[test]
fn test_table_name_validation() {
    assert!(is_valid_table_name("changelog_state"));
    assert!(is_valid_table_name("ops.changelog_state"));
    assert!(is_valid_table_name("_t1"));
    assert!(!is_valid_table_name(""));
    assert!(!is_valid_table_name("1table"));
    assert!(!is_valid_table_name("a.b.c"));
    assert!(!is_valid_table_name("a-b"));
}

#[test]
fn test_load_from_dir_missing() {
    let dir = TempDir::new().unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_load_from_dir_yml_fallback() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.yml"), "default_environment: uat\n").unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.default_environment.as_deref(), Some("uat"));
}

#[test]
fn test_parse_error_names_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.yaml"), "database: [unclosed\n").unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    match err {
        CoreError::ConfigParseError { path, .. } => assert!(path.ends_with("config.yaml")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
#[serial]
fn test_resolve_environment_cli_wins() {
    std::env::set_var(ENV_VAR, "uat");
    let config = Config {
        default_environment: Some("dev".to_string()),
        ..Config::default()
    };
    assert_eq!(config.resolve_environment(Some("prd")).unwrap(), "prd");
    std::env::remove_var(ENV_VAR);
}

#[test]
#[serial]
fn test_resolve_environment_env_var_then_default() {
    let config = Config {
        default_environment: Some("dev".to_string()),
        ..Config::default()
    };
    std::env::set_var(ENV_VAR, "uat");
    assert_eq!(config.resolve_environment(None).unwrap(), "uat");
    std::env::remove_var(ENV_VAR);
    assert_eq!(config.resolve_environment(None).unwrap(), "dev");
}

#[test]
#[serial]
fn test_resolve_environment_none() {
    std::env::remove_var(ENV_VAR);
    let err = Config::default().resolve_environment(None).unwrap_err();
    assert!(matches!(err, CoreError::EnvironmentNotSelected));
}
