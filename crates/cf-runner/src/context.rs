//! Run context: everything a run needs, built once and passed explicitly.

use crate::error::RunResult;
use cf_core::{DatabaseConfig, HistoryTable, Project, VariableSet};
use cf_jinja::{MacroLibrary, TemplateRenderer};
use std::sync::Arc;

/// Immutable inputs of one run for one environment
#[derive(Debug)]
pub struct RunContext {
    pub project: Project,
    pub environment: String,
    pub variables: Arc<VariableSet>,
    pub macros: MacroLibrary,
    pub renderer: TemplateRenderer,
    pub history_table: HistoryTable,
    /// Unique id of this run, used as the run lock owner
    pub run_id: String,
}

impl RunContext {
    /// Build the context for `cli_env` (or `CF_ENV`, or the configured default)
    pub fn load(project: Project, cli_env: Option<&str>) -> RunResult<Self> {
        let environment = project.config.resolve_environment(cli_env)?;
        Self::for_environment(project, &environment)
    }

    /// Build the context for an already-selected environment
    pub fn for_environment(project: Project, environment: &str) -> RunResult<Self> {
        let history_table = HistoryTable::new(&project.config.history_table)?;
        let variables = Arc::new(VariableSet::load(&project.variables_dir(), environment)?);
        let macros = MacroLibrary::load(&project.macros_dir())?;
        let renderer = TemplateRenderer::new(&variables, &macros)?;

        let run_id = format!(
            "{} (pid {})",
            uuid::Uuid::new_v4(),
            std::process::id()
        );
        log::info!(
            "Environment '{}': {} variables, {} macros",
            environment,
            variables.len(),
            macros.len()
        );

        Ok(Self {
            project,
            environment: environment.to_string(),
            variables,
            macros,
            renderer,
            history_table,
            run_id,
        })
    }

    /// Database connection settings for this environment
    pub fn database(&self) -> &DatabaseConfig {
        self.project.config.database_for(&self.environment)
    }
}
