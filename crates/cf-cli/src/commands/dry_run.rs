//! Dry-run command implementation - prints pending SQL without writing

use anyhow::{Context, Result};

use crate::cli::{DryRunArgs, GlobalArgs, OutputFormat};
use crate::context::RuntimeContext;

/// Execute the dry-run command
pub(crate) async fn execute(args: &DryRunArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let report = ctx
        .migrator
        .dry_run(args.check_connection)
        .await
        .context("Dry run failed")?;

    match args.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            print!("{}", report.to_sql_script());
            eprintln!(
                "-- {}: {} pending, {} already applied{}",
                report.environment,
                report.pending.len(),
                report.skipped,
                if report.connection_checked {
                    ", connection ok"
                } else {
                    ""
                }
            );
        }
    }
    Ok(())
}
