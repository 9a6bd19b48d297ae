//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// changeflow - templated, checksummed SQL schema migrations
#[derive(Parser, Debug)]
#[command(name = "changeflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Target environment (dev, uat, prd, ...)
    #[arg(short, long, global = true, env = "CF_ENV")]
    pub env: Option<String>,

    /// Path to the master changelog
    #[arg(
        short = 'f',
        long = "change-log-file",
        global = true,
        default_value = "master-changelogs.yaml"
    )]
    pub change_log_file: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the history table for the environment
    Init,

    /// Apply every pending change unit
    Update,

    /// Show the SQL an update would execute, without writing anything
    DryRun(DryRunArgs),

    /// Show applied, pending and orphaned change units
    Status(ReportArgs),

    /// Show the history rows of the environment
    History(ReportArgs),
}

/// Arguments for the dry-run command
#[derive(Args, Debug)]
pub struct DryRunArgs {
    /// Verify the database is reachable before planning
    #[arg(long)]
    pub check_connection: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the read-only report commands
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output formats for reports
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
