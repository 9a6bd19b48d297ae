//! Shared fixtures for runner integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use cf_core::{AppliedRecord, HistoryTable, LockInfo, Project, DEFAULT_CHANGELOG_FILE};
use cf_db::{Database, DbError, DbResult, DuckDbBackend};
use cf_runner::{Migrator, RunContext};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// A project directory on disk
pub struct ProjectFixture {
    _dir: TempDir,
    pub root: PathBuf,
}

impl ProjectFixture {
    /// Empty project with a default config and `dev` variables
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let fixture = Self { _dir: dir, root };
        fixture
            .write("config.yaml", "history_table: changelog_state\n")
            .write("variables/common.yaml", "{}\n")
            .write("variables/dev.yaml", "{}\n");
        fixture
    }

    /// The two-table project: `ods/create_table.sql` then the EDW summary
    pub fn two_tables() -> Self {
        let fixture = Self::new();
        fixture
            .write(
                DEFAULT_CHANGELOG_FILE,
                r#"
changes:
  - type: sql
    file: ods/create_table.sql
    description: ODS customer table
  - type: sql
    file: edw/01_customer_summary_create_table.sql
    depends_on: [ods/create_table.sql]
"#,
            )
            .write(
                "variables/common.yaml",
                "ods_schema: ods\nedw_schema: edw\n",
            )
            .write("variables/dev.yaml", "table_suffix: _dev\n")
            .write(
                "macros/ddl.sql",
                "{% macro create_schema(name) %}CREATE SCHEMA IF NOT EXISTS {{ name }}{% endmacro %}\n",
            )
            .write(
                "ods/create_table.sql",
                "{{ create_schema(ods_schema) }};\nCREATE TABLE IF NOT EXISTS {{ ods_schema }}.customer{{ table_suffix }} (id INTEGER, name VARCHAR);\n",
            )
            .write(
                "edw/01_customer_summary_create_table.sql",
                "{{ create_schema(edw_schema) }};\nCREATE TABLE IF NOT EXISTS {{ edw_schema }}.customer_summary{{ var('table_suffix') }} AS SELECT COUNT(*) AS customers FROM {{ ods_schema }}.customer{{ table_suffix }};\n",
            );
        fixture
    }

    pub fn write(&self, rel: &str, content: &str) -> &Self {
        let path = self.root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
        self
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn project(&self) -> Project {
        Project::load(&self.path(DEFAULT_CHANGELOG_FILE), None).unwrap()
    }

    pub fn context(&self, env: &str) -> RunContext {
        RunContext::for_environment(self.project(), env).unwrap()
    }

    /// Migrator over a shared gateway, rebuilt from disk like a fresh run
    pub fn migrator(&self, env: &str, db: Arc<dyn Database>) -> Migrator {
        Migrator::new(self.context(env), db)
    }
}

/// Gateway wrapper that records executed SQL and can fail on a marker
pub struct RecordingGateway {
    inner: DuckDbBackend,
    executed: Mutex<Vec<String>>,
    fail_marker: Mutex<Option<String>>,
    history_writes: AtomicUsize,
}

impl RecordingGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: DuckDbBackend::in_memory().unwrap(),
            executed: Mutex::new(Vec::new()),
            fail_marker: Mutex::new(None),
            history_writes: AtomicUsize::new(0),
        })
    }

    /// Fail any `execute` whose SQL contains `marker`
    pub fn fail_on(&self, marker: Option<&str>) {
        *self.fail_marker.lock().unwrap() = marker.map(String::from);
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn execution_count(&self) -> usize {
        self.executed.lock().unwrap().len()
    }

    pub fn history_writes(&self) -> usize {
        self.history_writes.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.executed.lock().unwrap().clear();
        self.history_writes.store(0, Ordering::SeqCst);
    }

    /// Run SQL directly against the backing database, bypassing recording
    pub async fn raw(&self, sql: &str) -> DbResult<()> {
        self.inner.execute(sql).await
    }
}

#[async_trait]
impl Database for RecordingGateway {
    async fn execute(&self, sql: &str) -> DbResult<()> {
        self.executed.lock().unwrap().push(sql.to_string());
        let marker = self.fail_marker.lock().unwrap().clone();
        if let Some(marker) = marker {
            if sql.contains(&marker) {
                return Err(DbError::ExecutionError(format!(
                    "injected failure on '{}'",
                    marker
                )));
            }
        }
        self.inner.execute(sql).await
    }

    async fn ping(&self) -> DbResult<()> {
        self.inner.ping().await
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.inner.relation_exists(name).await
    }

    async fn query_count(&self, sql: &str) -> DbResult<usize> {
        self.inner.query_count(sql).await
    }

    async fn ensure_history_table(&self, table: &HistoryTable) -> DbResult<()> {
        self.inner.ensure_history_table(table).await
    }

    async fn load_history(
        &self,
        table: &HistoryTable,
        environment: &str,
    ) -> DbResult<Vec<AppliedRecord>> {
        self.inner.load_history(table, environment).await
    }

    async fn append_history(&self, table: &HistoryTable, record: &AppliedRecord) -> DbResult<()> {
        self.history_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.append_history(table, record).await
    }

    async fn try_acquire_lock(
        &self,
        table: &HistoryTable,
        lock: &LockInfo,
    ) -> DbResult<Option<LockInfo>> {
        self.inner.try_acquire_lock(table, lock).await
    }

    async fn release_lock(
        &self,
        table: &HistoryTable,
        environment: &str,
        owner: &str,
    ) -> DbResult<bool> {
        self.inner.release_lock(table, environment, owner).await
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

/// Ids of the ledger rows of `env`, in sequence order
pub async fn ledger_ids(db: &Arc<dyn Database>, env: &str) -> Vec<String> {
    let table = HistoryTable::new("changelog_state").unwrap();
    db.load_history(&table, env)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.change_id.into_inner())
        .collect()
}
