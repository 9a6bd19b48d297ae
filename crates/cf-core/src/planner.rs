//! Migration planning: compare rendered units against the ledger.

use crate::change_id::ChangeId;
use crate::error::{CoreError, CoreResult};
use crate::history::{AppliedRecord, Ledger};
use crate::unit::RenderedUnit;
use std::collections::HashSet;

/// What a run will do with one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// No success record yet; will be executed
    Pending,
    /// Applied earlier with identical content
    Skip(AppliedRecord),
}

/// One unit in declared order, with its planned action
#[derive(Debug, Clone)]
pub struct PlanStep {
    pub unit: RenderedUnit,
    pub action: StepAction,
}

impl PlanStep {
    pub fn is_pending(&self) -> bool {
        self.action == StepAction::Pending
    }
}

/// Result of planning one run for one environment
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    pub environment: String,
    pub steps: Vec<PlanStep>,
    /// Ledger ids that no longer appear in the changelog
    pub orphaned: Vec<ChangeId>,
    /// Sequence number for the first record this run writes
    pub next_sequence: i64,
}

impl MigrationPlan {
    /// Pending units in apply order
    pub fn pending(&self) -> impl Iterator<Item = &RenderedUnit> {
        self.steps
            .iter()
            .filter(|s| s.is_pending())
            .map(|s| &s.unit)
    }

    pub fn pending_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_pending()).count()
    }

    pub fn applied_count(&self) -> usize {
        self.steps.len() - self.pending_count()
    }

    /// Whether the run has nothing to execute
    pub fn is_up_to_date(&self) -> bool {
        self.pending_count() == 0
    }
}

/// Build the plan for `units` (declared order) against `ledger`.
///
/// A unit whose recorded checksum differs from its current checksum aborts
/// planning with [`CoreError::ChecksumMismatch`]; no partial plan is returned.
pub fn plan(units: Vec<RenderedUnit>, ledger: &Ledger) -> CoreResult<MigrationPlan> {
    let mut steps = Vec::with_capacity(units.len());
    for unit in units {
        let action = match ledger.applied(unit.id()) {
            None => StepAction::Pending,
            Some(record) if record.checksum == unit.checksum => StepAction::Skip(record.clone()),
            Some(record) => {
                return Err(CoreError::ChecksumMismatch {
                    id: unit.id().to_string(),
                    recorded: record.checksum.clone(),
                    current: unit.checksum.clone(),
                });
            }
        };
        steps.push(PlanStep { unit, action });
    }

    let known: HashSet<&str> = steps.iter().map(|s| s.unit.id().as_str()).collect();
    let orphaned: Vec<ChangeId> = ledger
        .applied_ids()
        .into_iter()
        .filter(|id| !known.contains(id.as_str()))
        .cloned()
        .collect();
    for id in &orphaned {
        log::warn!(
            "Change unit '{}' is recorded for environment '{}' but no longer in the changelog",
            id,
            ledger.environment()
        );
    }

    let plan = MigrationPlan {
        environment: ledger.environment().to_string(),
        steps,
        orphaned,
        next_sequence: ledger.next_sequence(),
    };
    log::debug!(
        "Plan for '{}': {} pending, {} already applied",
        plan.environment,
        plan.pending_count(),
        plan.applied_count()
    );
    Ok(plan)
}

#[cfg(test)]
#[path = "planner_test.rs"]
mod tests;
