//! Database gateway trait

use crate::error::DbResult;
use async_trait::async_trait;
use cf_core::{AppliedRecord, HistoryTable, LockInfo};

/// Gateway to the target database
///
/// Everything changeflow does to a database goes through this trait:
/// executing rendered change units, and reading or appending the history
/// and lock tables. Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute one rendered change unit (may hold several statements)
    async fn execute(&self, sql: &str) -> DbResult<()>;

    /// Cheap round trip to verify the connection
    async fn ping(&self) -> DbResult<()>;

    /// Check if a table or view exists
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Count the rows a query returns
    async fn query_count(&self, sql: &str) -> DbResult<usize>;

    /// Create the history table and its lock table if missing
    async fn ensure_history_table(&self, table: &HistoryTable) -> DbResult<()>;

    /// History rows for one environment, in sequence order.
    ///
    /// A missing history table reads as no rows.
    async fn load_history(
        &self,
        table: &HistoryTable,
        environment: &str,
    ) -> DbResult<Vec<AppliedRecord>>;

    /// Append one history row; returns once the write is durable
    async fn append_history(&self, table: &HistoryTable, record: &AppliedRecord) -> DbResult<()>;

    /// Insert the lock row for `lock.environment` unless one exists.
    ///
    /// Returns `None` when acquired, or the current holder otherwise.
    async fn try_acquire_lock(
        &self,
        table: &HistoryTable,
        lock: &LockInfo,
    ) -> DbResult<Option<LockInfo>>;

    /// Delete the lock row held by `owner`; returns whether a row was removed
    async fn release_lock(
        &self,
        table: &HistoryTable,
        environment: &str,
        owner: &str,
    ) -> DbResult<bool>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
