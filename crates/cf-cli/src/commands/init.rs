//! Init command implementation - creates the history table

use anyhow::{Context, Result};

use crate::cli::GlobalArgs;
use crate::context::RuntimeContext;

/// Execute the init command
pub(crate) async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    ctx.migrator
        .init()
        .await
        .context("Failed to create history table")?;
    println!(
        "History table {} is ready for environment '{}'",
        ctx.migrator.context().history_table,
        ctx.environment()
    );
    Ok(())
}
