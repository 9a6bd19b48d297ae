//! CLI command implementations

pub(crate) mod common;
pub(crate) mod dry_run;
pub(crate) mod history;
pub(crate) mod init;
pub(crate) mod status;
pub(crate) mod update;
