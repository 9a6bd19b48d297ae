//! Ledger types: applied records, the history table name, and run locks.
//!
//! The ledger is append-only. Records are written once, after a unit's SQL
//! succeeded, and are never updated or deleted by changeflow.

use crate::change_id::ChangeId;
use crate::config::is_valid_table_name;
use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Status column of an applied record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Statement executed and checkpointed
    Success,
    /// Written by older tooling before execution finished
    Pending,
    /// Written by older tooling after a failed execution
    Failed,
}

impl RecordStatus {
    /// Parse the persisted status string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Some(RecordStatus::Success),
            "pending" => Some(RecordStatus::Pending),
            "failed" => Some(RecordStatus::Failed),
            _ => None,
        }
    }

    /// Persisted representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Success => "success",
            RecordStatus::Pending => "pending",
            RecordStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the history table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRecord {
    pub change_id: ChangeId,
    pub environment: String,
    pub checksum: String,
    pub sequence_number: i64,
    pub applied_at: DateTime<Utc>,
    pub status: RecordStatus,
    pub changelog_path: String,
    pub source_path: String,
    pub description: String,
}

impl AppliedRecord {
    /// Whether this record marks its unit as satisfied
    pub fn is_success(&self) -> bool {
        self.status == RecordStatus::Success
    }
}

/// Validated name of the history table (and its companion lock table)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTable {
    name: String,
}

impl HistoryTable {
    /// Validate and wrap a table name (`table` or `schema.table`)
    pub fn new(name: &str) -> CoreResult<Self> {
        if !is_valid_table_name(name) {
            return Err(CoreError::ConfigInvalid {
                message: format!("invalid history table name '{}'", name),
            });
        }
        Ok(Self {
            name: name.to_string(),
        })
    }

    /// Fully qualified history table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the companion run-lock table
    pub fn lock_table(&self) -> String {
        format!("{}_lock", self.name)
    }

    /// Schema part of a qualified name, if any
    pub fn schema(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(schema, _)| schema)
    }

    /// Unqualified table name
    pub fn table(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map(|(_, table)| table)
            .unwrap_or(&self.name)
    }
}

impl std::fmt::Display for HistoryTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Holder of the advisory run lock for one environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    pub environment: String,
    pub owner: String,
    pub acquired_at: DateTime<Utc>,
}

/// The applied records of one environment, loaded fresh for a run
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    environment: String,
    records: Vec<AppliedRecord>,
    applied: HashMap<ChangeId, usize>,
}

impl Ledger {
    /// Build a ledger from records in sequence order.
    ///
    /// Records of other environments are ignored. Only success records
    /// satisfy a unit; when an id has several, the first one wins.
    pub fn new(environment: &str, records: Vec<AppliedRecord>) -> Self {
        let records: Vec<AppliedRecord> = records
            .into_iter()
            .filter(|r| r.environment == environment)
            .collect();
        let mut applied = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            if record.is_success() {
                applied.entry(record.change_id.clone()).or_insert(idx);
            }
        }
        Self {
            environment: environment.to_string(),
            records,
            applied,
        }
    }

    /// Environment this ledger belongs to
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Success record for a change id, if any
    pub fn applied(&self, id: &str) -> Option<&AppliedRecord> {
        self.applied.get(id).map(|&idx| &self.records[idx])
    }

    /// Ids with a success record, in sequence order
    pub fn applied_ids(&self) -> Vec<&ChangeId> {
        self.records
            .iter()
            .enumerate()
            .filter(|(idx, r)| self.applied.get(r.change_id.as_str()) == Some(idx))
            .map(|(_, r)| &r.change_id)
            .collect()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the ledger has no rows
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sequence number for the next record
    pub fn next_sequence(&self) -> i64 {
        self.records
            .iter()
            .map(|r| r.sequence_number)
            .max()
            .unwrap_or(0)
            + 1
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
