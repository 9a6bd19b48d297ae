//! cf-runner - Migration runner for changeflow
//!
//! Ties the pieces together for one run: builds the [`RunContext`]
//! (environment, variables, macros, renderer), resolves and renders the
//! changelog, plans against the ledger, and applies pending change units
//! under the environment's run lock.

pub mod context;
pub mod error;
pub mod executor;
pub mod lock;
pub mod migrator;
pub mod render;
pub mod report;

pub use context::RunContext;
pub use error::{ErrorCategory, RunError, RunResult};
pub use executor::Executor;
pub use lock::RunLock;
pub use migrator::Migrator;
pub use report::{DryRunReport, PendingSql, StatusEntry, StatusReport, UnitState, UpdateReport};
