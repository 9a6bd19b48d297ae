//! Status command implementation - applied, pending and orphaned units

use anyhow::{Context, Result};
use cf_runner::StatusReport;

use crate::cli::{GlobalArgs, OutputFormat, ReportArgs};
use crate::commands::common::{column_width, format_timestamp};
use crate::context::RuntimeContext;

/// Execute the status command
pub(crate) async fn execute(args: &ReportArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let report = ctx.migrator.status().await.context("Status failed")?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_table(&report),
    }
    Ok(())
}

fn print_table(report: &StatusReport) {
    let id_width = column_width(report.units.iter().map(|u| u.id.as_str()), 2);

    println!("{:<id_width$}  {:<8}  APPLIED_AT", "ID", "STATE");
    println!("{:-<id_width$}  {:-<8}  {}", "", "", "-".repeat(19));
    for unit in &report.units {
        let applied_at = unit
            .applied_at
            .as_ref()
            .map(format_timestamp)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<id_width$}  {:<8}  {}",
            unit.id.as_str(),
            unit.state.to_string(),
            applied_at
        );
    }

    for id in &report.orphaned {
        println!("{:<id_width$}  {:<8}  -", id.as_str(), "orphaned");
    }

    println!(
        "\n{}: {} applied, {} pending, {} orphaned",
        report.environment,
        report.applied_count(),
        report.pending_count(),
        report.orphaned.len()
    );
}
