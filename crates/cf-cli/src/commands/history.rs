//! History command implementation - ledger rows of the environment

use anyhow::{Context, Result};
use cf_core::AppliedRecord;

use crate::cli::{GlobalArgs, OutputFormat, ReportArgs};
use crate::commands::common::{column_width, format_timestamp};
use crate::context::RuntimeContext;

/// Execute the history command
pub(crate) async fn execute(args: &ReportArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let records = ctx.migrator.history().await.context("History failed")?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No change units applied to '{}'", ctx.environment());
            } else {
                print_table(&records);
            }
        }
    }
    Ok(())
}

fn print_table(records: &[AppliedRecord]) {
    let id_width = column_width(records.iter().map(|r| r.change_id.as_str()), 2);

    println!(
        "{:>4}  {:<id_width$}  {:<19}  {:<7}  CHECKSUM",
        "SEQ", "ID", "APPLIED_AT", "STATUS"
    );
    println!(
        "{:->4}  {:-<id_width$}  {:-<19}  {:-<7}  {}",
        "",
        "",
        "",
        "",
        "-".repeat(12)
    );
    for record in records {
        println!(
            "{:>4}  {:<id_width$}  {:<19}  {:<7}  {}",
            record.sequence_number,
            record.change_id.as_str(),
            format_timestamp(&record.applied_at),
            record.status.as_str(),
            &record.checksum[..record.checksum.len().min(12)]
        );
    }
}
