//! Update command implementation - applies pending change units

use anyhow::{Context, Result};
use std::time::Instant;

use crate::cli::GlobalArgs;
use crate::context::RuntimeContext;

/// Execute the update command
pub(crate) async fn execute(global: &GlobalArgs) -> Result<()> {
    let start = Instant::now();
    let ctx = RuntimeContext::new(global)?;
    ctx.verbose(&format!("Run id {}", ctx.migrator.context().run_id));

    let report = ctx.migrator.update().await.context("Update failed")?;

    for record in &report.applied {
        println!("  applied  {}", record.change_id);
    }
    for id in &report.orphaned {
        println!("  orphaned {} (recorded but no longer declared)", id);
    }
    println!(
        "\n{}: {} applied, {} already up to date in {:.2}s",
        report.environment,
        report.applied_count(),
        report.skipped,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
