//! cf-core - Core library for changeflow
//!
//! Project configuration, environment variables, changelog resolution,
//! ledger types and migration planning.

pub mod change_id;
pub mod changelog;
pub mod checksum;
pub mod config;
pub mod error;
pub mod history;
pub mod planner;
pub mod project;
pub mod unit;
pub mod variables;

pub use change_id::ChangeId;
pub use changelog::{resolve, ResolvedChangelog};
pub use checksum::compute_checksum;
pub use config::{Config, DatabaseConfig, DbType};
pub use error::{CoreError, CoreResult};
pub use history::{AppliedRecord, HistoryTable, Ledger, LockInfo, RecordStatus};
pub use planner::{plan, MigrationPlan, PlanStep, StepAction};
pub use project::{Project, DEFAULT_CHANGELOG_FILE};
pub use unit::{ChangeUnit, RenderedUnit};
pub use variables::{merge_values, VariableSet};
