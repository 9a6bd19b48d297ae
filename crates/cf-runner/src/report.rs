//! Results of runner commands, printable as text or serializable as JSON.

use cf_core::{AppliedRecord, ChangeId, MigrationPlan, StepAction};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of a successful `update`
#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub environment: String,
    /// Records written by this run, in apply order
    pub applied: Vec<AppliedRecord>,
    /// Units already applied with unchanged content
    pub skipped: usize,
    pub orphaned: Vec<ChangeId>,
}

impl UpdateReport {
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }
}

/// One unit a dry run would execute
#[derive(Debug, Clone, Serialize)]
pub struct PendingSql {
    pub id: ChangeId,
    pub source_path: String,
    pub checksum: String,
    pub sql: String,
}

/// What `update` would do, computed without writing anything
#[derive(Debug, Clone, Serialize)]
pub struct DryRunReport {
    pub environment: String,
    pub pending: Vec<PendingSql>,
    pub skipped: usize,
    pub orphaned: Vec<ChangeId>,
    /// Whether a connectivity check ran before planning
    pub connection_checked: bool,
}

impl DryRunReport {
    pub(crate) fn from_plan(plan: &MigrationPlan, connection_checked: bool) -> Self {
        let pending: Vec<PendingSql> = plan
            .pending()
            .map(|unit| PendingSql {
                id: unit.id().clone(),
                source_path: unit.unit.relative_path.clone(),
                checksum: unit.checksum.clone(),
                sql: unit.sql.clone(),
            })
            .collect();
        Self {
            environment: plan.environment.clone(),
            skipped: plan.applied_count(),
            pending,
            orphaned: plan.orphaned.clone(),
            connection_checked,
        }
    }

    /// Pending SQL as one script, each unit preceded by a comment header
    pub fn to_sql_script(&self) -> String {
        let mut out = String::new();
        for p in &self.pending {
            out.push_str(&format!("-- {} ({})\n", p.id, p.source_path));
            out.push_str(p.sql.trim_end());
            if !p.sql.trim_end().ends_with(';') {
                out.push(';');
            }
            out.push_str("\n\n");
        }
        out
    }
}

/// State of one unit as reported by `status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitState {
    Applied,
    Pending,
}

impl std::fmt::Display for UnitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitState::Applied => write!(f, "applied"),
            UnitState::Pending => write!(f, "pending"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusEntry {
    pub id: ChangeId,
    pub source_path: String,
    pub state: UnitState,
    pub applied_at: Option<DateTime<Utc>>,
    pub checksum: String,
}

/// Applied, pending, and orphaned units of one environment
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub environment: String,
    pub units: Vec<StatusEntry>,
    pub orphaned: Vec<ChangeId>,
}

impl StatusReport {
    pub(crate) fn from_plan(plan: &MigrationPlan) -> Self {
        let units = plan
            .steps
            .iter()
            .map(|step| {
                let (state, applied_at) = match &step.action {
                    StepAction::Pending => (UnitState::Pending, None),
                    StepAction::Skip(record) => (UnitState::Applied, Some(record.applied_at)),
                };
                StatusEntry {
                    id: step.unit.id().clone(),
                    source_path: step.unit.unit.relative_path.clone(),
                    state,
                    applied_at,
                    checksum: step.unit.checksum.clone(),
                }
            })
            .collect();
        Self {
            environment: plan.environment.clone(),
            units,
            orphaned: plan.orphaned.clone(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.units
            .iter()
            .filter(|u| u.state == UnitState::Pending)
            .count()
    }

    pub fn applied_count(&self) -> usize {
        self.units.len() - self.pending_count()
    }
}
