//! Checksum and state store for one environment.

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use cf_core::{AppliedRecord, HistoryTable, Ledger, LockInfo, RecordStatus, RenderedUnit};
use chrono::Utc;
use std::sync::Arc;

/// Reads and appends the ledger of one (history table, environment) pair.
///
/// Holds no cached state: every `load_applied` reads the table again.
#[derive(Clone)]
pub struct HistoryStore {
    db: Arc<dyn Database>,
    table: HistoryTable,
    environment: String,
}

impl HistoryStore {
    pub fn new(db: Arc<dyn Database>, table: HistoryTable, environment: &str) -> Self {
        Self {
            db,
            table,
            environment: environment.to_string(),
        }
    }

    pub fn table(&self) -> &HistoryTable {
        &self.table
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Create the history and lock tables if missing
    pub async fn ensure_table(&self) -> DbResult<()> {
        self.db.ensure_history_table(&self.table).await?;
        log::debug!(
            "History table {} ready on {}",
            self.table,
            self.db.db_type()
        );
        Ok(())
    }

    /// Fresh read of this environment's ledger
    pub async fn load_applied(&self) -> DbResult<Ledger> {
        let records = self.db.load_history(&self.table, &self.environment).await?;
        Ok(Ledger::new(&self.environment, records))
    }

    /// Raw rows for this environment, in sequence order
    pub async fn history(&self) -> DbResult<Vec<AppliedRecord>> {
        self.db.load_history(&self.table, &self.environment).await
    }

    /// Append the success record for a unit that just executed
    pub async fn record_applied(
        &self,
        unit: &RenderedUnit,
        sequence_number: i64,
    ) -> DbResult<AppliedRecord> {
        let record = AppliedRecord {
            change_id: unit.id().clone(),
            environment: self.environment.clone(),
            checksum: unit.checksum.clone(),
            sequence_number,
            applied_at: Utc::now(),
            status: RecordStatus::Success,
            changelog_path: unit.unit.changelog_path.clone(),
            source_path: unit.unit.relative_path.clone(),
            description: unit.unit.description.clone(),
        };
        self.db.append_history(&self.table, &record).await?;
        Ok(record)
    }

    /// Acquire the run lock for this environment, or fail naming the holder
    pub async fn acquire_lock(&self, owner: &str) -> DbResult<LockInfo> {
        let lock = LockInfo {
            environment: self.environment.clone(),
            owner: owner.to_string(),
            acquired_at: Utc::now(),
        };
        match self.db.try_acquire_lock(&self.table, &lock).await? {
            None => {
                log::debug!(
                    "Acquired run lock for '{}' as {}",
                    self.environment,
                    owner
                );
                Ok(lock)
            }
            Some(holder) => Err(DbError::LockHeld {
                environment: holder.environment,
                owner: holder.owner,
                acquired_at: holder.acquired_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            }),
        }
    }

    /// Release the run lock held by `owner`
    pub async fn release_lock(&self, owner: &str) -> DbResult<bool> {
        let released = self
            .db
            .release_lock(&self.table, &self.environment, owner)
            .await?;
        if released {
            log::debug!("Released run lock for '{}'", self.environment);
        } else {
            log::warn!(
                "Run lock for '{}' was not held by {}",
                self.environment,
                owner
            );
        }
        Ok(released)
    }
}
