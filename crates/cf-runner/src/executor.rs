//! Executor: applies pending units in order and checkpoints each one.

use crate::error::{RunError, RunResult};
use crate::report::DryRunReport;
use cf_core::{AppliedRecord, MigrationPlan};
use cf_db::{Database, HistoryStore};
use std::sync::Arc;
use std::time::Instant;

/// Runs a [`MigrationPlan`] against the gateway
pub struct Executor {
    db: Arc<dyn Database>,
    store: HistoryStore,
}

impl Executor {
    pub fn new(db: Arc<dyn Database>, store: HistoryStore) -> Self {
        Self { db, store }
    }

    /// Execute every pending unit in order.
    ///
    /// Each success is recorded before the next unit starts. The first
    /// failure stops the run: the failing unit gets no record and records
    /// written earlier in the run stay.
    pub async fn apply(&self, plan: &MigrationPlan) -> RunResult<Vec<AppliedRecord>> {
        let total = plan.pending_count();
        let mut applied = Vec::with_capacity(total);
        let mut sequence = plan.next_sequence;

        for (idx, unit) in plan.pending().enumerate() {
            let start = Instant::now();
            self.db
                .execute(&unit.sql)
                .await
                .map_err(|source| RunError::ExecutionFailed {
                    id: unit.id().to_string(),
                    path: unit.unit.relative_path.clone(),
                    source,
                })?;

            let record = self
                .store
                .record_applied(unit, sequence)
                .await
                .map_err(|source| RunError::CheckpointFailed {
                    id: unit.id().to_string(),
                    source,
                })?;
            sequence += 1;

            log::info!(
                "[{}/{}] Applied {} ({}ms)",
                idx + 1,
                total,
                unit.id(),
                start.elapsed().as_millis()
            );
            applied.push(record);
        }

        Ok(applied)
    }

    /// Describe the plan's pending SQL without executing or recording anything
    pub fn dry_run(plan: &MigrationPlan, connection_checked: bool) -> DryRunReport {
        DryRunReport::from_plan(plan, connection_checked)
    }
}
