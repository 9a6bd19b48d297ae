//! changeflow CLI - templated, checksummed SQL schema migrations

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod context;
mod logger;

use cli::Cli;
use commands::common::{error_category, exit_code_for};
use commands::{dry_run, history, init, status, update};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logger::init(cli.global.verbose);

    if let Err(err) = run(&cli).await {
        let category = error_category(&err);
        match category {
            Some(category) => eprintln!("{}: {:#}", category, err),
            None => eprintln!("Error: {:#}", err),
        }
        std::process::exit(exit_code_for(category));
    }
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        cli::Commands::Init => init::execute(&cli.global).await,
        cli::Commands::Update => update::execute(&cli.global).await,
        cli::Commands::DryRun(args) => dry_run::execute(args, &cli.global).await,
        cli::Commands::Status(args) => status::execute(args, &cli.global).await,
        cli::Commands::History(args) => history::execute(args, &cli.global).await,
    }
}
