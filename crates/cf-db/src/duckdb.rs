//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use async_trait::async_trait;
use cf_core::{AppliedRecord, ChangeId, HistoryTable, LockInfo, RecordStatus};
use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const TIMESTAMP_WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const TIMESTAMP_READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn relation_exists_sync(&self, name: &str) -> DbResult<bool> {
        let conn = self.conn()?;
        let (schema, table) = match name.rsplit_once('.') {
            Some((schema, table)) => (schema, table),
            None => ("main", name),
        };
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
                params![schema, table],
                |row| row.get(0),
            )
            .map_err(|e| DbError::ExecutionError(e.to_string()))?;
        Ok(count > 0)
    }

    fn ensure_history_table_sync(&self, table: &HistoryTable) -> DbResult<()> {
        let mut ddl = String::new();
        if let Some(schema) = table.schema() {
            ddl.push_str(&format!("CREATE SCHEMA IF NOT EXISTS {};\n", schema));
        }
        ddl.push_str(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                change_id VARCHAR NOT NULL,
                environment VARCHAR NOT NULL,
                checksum VARCHAR NOT NULL,
                sequence_number BIGINT NOT NULL,
                applied_at TIMESTAMP NOT NULL,
                status VARCHAR NOT NULL,
                changelog_path VARCHAR,
                source_path VARCHAR,
                description VARCHAR
            );\n",
            table.name()
        ));
        ddl.push_str(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                environment VARCHAR PRIMARY KEY,
                owner VARCHAR NOT NULL,
                acquired_at TIMESTAMP NOT NULL
            );",
            table.lock_table()
        ));

        let conn = self.conn()?;
        conn.execute_batch(&ddl)
            .map_err(|e| DbError::ExecutionError(format!("creating {}: {}", table, e)))
    }

    fn load_history_sync(
        &self,
        table: &HistoryTable,
        environment: &str,
    ) -> DbResult<Vec<AppliedRecord>> {
        if !self.relation_exists_sync(table.name())? {
            return Ok(Vec::new());
        }

        let conn = self.conn()?;
        let sql = format!(
            "SELECT change_id, environment, checksum, sequence_number, CAST(applied_at AS VARCHAR), \
             status, COALESCE(changelog_path, ''), COALESCE(source_path, ''), COALESCE(description, '') \
             FROM {} WHERE environment = ? ORDER BY sequence_number, applied_at",
            table.name()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![environment], |row| {
            Ok(RawRecord {
                change_id: row.get(0)?,
                environment: row.get(1)?,
                checksum: row.get(2)?,
                sequence_number: row.get(3)?,
                applied_at: row.get(4)?,
                status: row.get(5)?,
                changelog_path: row.get(6)?,
                source_path: row.get(7)?,
                description: row.get(8)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }

    fn append_history_sync(&self, table: &HistoryTable, record: &AppliedRecord) -> DbResult<()> {
        let conn = self.conn()?;
        let sql = format!(
            "INSERT INTO {} (change_id, environment, checksum, sequence_number, applied_at, \
             status, changelog_path, source_path, description) \
             VALUES (?, ?, ?, ?, CAST(? AS TIMESTAMP), ?, ?, ?, ?)",
            table.name()
        );
        conn.execute(
            &sql,
            params![
                record.change_id.as_str(),
                record.environment,
                record.checksum,
                record.sequence_number,
                format_timestamp(&record.applied_at),
                record.status.as_str(),
                record.changelog_path,
                record.source_path,
                record.description,
            ],
        )
        .map_err(|e| {
            DbError::ExecutionError(format!(
                "recording '{}' in {}: {}",
                record.change_id, table, e
            ))
        })?;
        Ok(())
    }

    fn try_acquire_lock_sync(
        &self,
        table: &HistoryTable,
        lock: &LockInfo,
    ) -> DbResult<Option<LockInfo>> {
        let conn = self.conn()?;
        let lock_table = table.lock_table();
        let inserted = conn.execute(
            &format!(
                "INSERT INTO {} (environment, owner, acquired_at) VALUES (?, ?, CAST(? AS TIMESTAMP)) \
                 ON CONFLICT DO NOTHING",
                lock_table
            ),
            params![
                lock.environment,
                lock.owner,
                format_timestamp(&lock.acquired_at)
            ],
        )?;
        if inserted > 0 {
            return Ok(None);
        }

        let (owner, acquired_at): (String, String) = conn.query_row(
            &format!(
                "SELECT owner, CAST(acquired_at AS VARCHAR) FROM {} WHERE environment = ?",
                lock_table
            ),
            params![lock.environment],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(Some(LockInfo {
            environment: lock.environment.clone(),
            owner,
            acquired_at: parse_timestamp(&acquired_at)?,
        }))
    }

    fn release_lock_sync(
        &self,
        table: &HistoryTable,
        environment: &str,
        owner: &str,
    ) -> DbResult<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            &format!(
                "DELETE FROM {} WHERE environment = ? AND owner = ?",
                table.lock_table()
            ),
            params![environment, owner],
        )?;
        Ok(deleted > 0)
    }
}

/// Row shape as stored, before validation
struct RawRecord {
    change_id: String,
    environment: String,
    checksum: String,
    sequence_number: i64,
    applied_at: String,
    status: String,
    changelog_path: String,
    source_path: String,
    description: String,
}

impl RawRecord {
    fn into_record(self) -> DbResult<AppliedRecord> {
        let change_id = ChangeId::try_new(self.change_id)
            .ok_or_else(|| DbError::InvalidRecord("blank or malformed change_id".to_string()))?;
        let status = RecordStatus::parse(&self.status).ok_or_else(|| {
            DbError::InvalidRecord(format!(
                "unknown status '{}' for '{}'",
                self.status, change_id
            ))
        })?;
        Ok(AppliedRecord {
            change_id,
            environment: self.environment,
            checksum: self.checksum,
            sequence_number: self.sequence_number,
            applied_at: parse_timestamp(&self.applied_at)?,
            status,
            changelog_path: self.changelog_path,
            source_path: self.source_path,
            description: self.description,
        })
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.naive_utc().format(TIMESTAMP_WRITE_FORMAT).to_string()
}

fn parse_timestamp(s: &str) -> DbResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_READ_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| DbError::InvalidRecord(format!("bad timestamp '{}': {}", s, e)))
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(e.to_string()))
    }

    async fn ping(&self) -> DbResult<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0))
            .map(|_| ())
            .map_err(|e| DbError::ConnectionError(e.to_string()))
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.relation_exists_sync(name)
    }

    async fn query_count(&self, sql: &str) -> DbResult<usize> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM ({})", sql), [], |row| {
                row.get(0)
            })
            .map_err(|e| DbError::ExecutionError(e.to_string()))?;
        Ok(count as usize)
    }

    async fn ensure_history_table(&self, table: &HistoryTable) -> DbResult<()> {
        self.ensure_history_table_sync(table)
    }

    async fn load_history(
        &self,
        table: &HistoryTable,
        environment: &str,
    ) -> DbResult<Vec<AppliedRecord>> {
        self.load_history_sync(table, environment)
    }

    async fn append_history(&self, table: &HistoryTable, record: &AppliedRecord) -> DbResult<()> {
        self.append_history_sync(table, record)
    }

    async fn try_acquire_lock(
        &self,
        table: &HistoryTable,
        lock: &LockInfo,
    ) -> DbResult<Option<LockInfo>> {
        self.try_acquire_lock_sync(table, lock)
    }

    async fn release_lock(
        &self,
        table: &HistoryTable,
        environment: &str,
        owner: &str,
    ) -> DbResult<bool> {
        self.release_lock_sync(table, environment, owner)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
