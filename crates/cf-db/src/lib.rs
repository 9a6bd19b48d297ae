//! cf-db - Database layer for changeflow
//!
//! This crate provides the `Database` gateway trait, its DuckDB
//! implementation, and the `HistoryStore` that reads and appends the
//! applied-change ledger of one environment.

pub mod duckdb;
pub mod error;
pub mod history;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use history::HistoryStore;
pub use traits::Database;
