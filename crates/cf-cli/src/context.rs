//! Runtime context for CLI commands

use anyhow::{Context, Result};
use cf_core::Project;
use cf_runner::{Migrator, RunContext, RunError};
use std::path::Path;

use crate::cli::GlobalArgs;

/// Loaded project, selected environment and its database
pub(crate) struct RuntimeContext {
    pub migrator: Migrator,

    /// Verbose output enabled
    pub verbose: bool,
}

impl RuntimeContext {
    /// Load the project and select the environment; the database opens on first use
    pub(crate) fn new(args: &GlobalArgs) -> Result<Self> {
        let changelog = Path::new(&args.change_log_file);
        let config = args.config.as_deref().map(Path::new);

        let project = Project::load(changelog, config)
            .map_err(RunError::from)
            .context("Failed to load project")?;
        let ctx = RunContext::load(project, args.env.as_deref())
            .context("Failed to prepare run context")?;
        let migrator = Migrator::connect(ctx);

        let ctx = Self {
            migrator,
            verbose: args.verbose,
        };
        ctx.verbose(&format!(
            "Project root {} (environment '{}', history table {})",
            ctx.migrator.context().project.root.display(),
            ctx.migrator.context().environment,
            ctx.migrator.context().history_table
        ));
        Ok(ctx)
    }

    /// Environment this run targets
    pub(crate) fn environment(&self) -> &str {
        &self.migrator.context().environment
    }

    /// Print verbose output if enabled
    pub(crate) fn verbose(&self, msg: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", msg);
        }
    }
}
