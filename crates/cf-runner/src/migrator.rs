//! Operator commands over one run context and one database.

use crate::context::RunContext;
use crate::error::{RunError, RunResult};
use crate::executor::Executor;
use crate::lock::RunLock;
use crate::render::render_units;
use crate::report::{DryRunReport, StatusReport, UpdateReport};
use cf_core::{plan, AppliedRecord, DbType, MigrationPlan, RenderedUnit};
use cf_db::{Database, DbError, DuckDbBackend, HistoryStore};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Runs `init`, `update`, `dry-run`, `status` and `history` for one environment
pub struct Migrator {
    ctx: RunContext,
    backend: OnceCell<Backend>,
}

struct Backend {
    db: Arc<dyn Database>,
    store: HistoryStore,
}

impl Backend {
    fn new(ctx: &RunContext, db: Arc<dyn Database>) -> Self {
        let store = HistoryStore::new(db.clone(), ctx.history_table.clone(), &ctx.environment);
        Self { db, store }
    }
}

impl Migrator {
    /// Use an existing database gateway
    pub fn new(ctx: RunContext, db: Arc<dyn Database>) -> Self {
        let backend = Backend::new(&ctx, db);
        Self {
            ctx,
            backend: OnceCell::from(backend),
        }
    }

    /// Use the database configured for the context's environment.
    ///
    /// The database is opened on first use, so a run that fails to resolve
    /// or render never creates the database file.
    pub fn connect(ctx: RunContext) -> Self {
        Self {
            ctx,
            backend: OnceCell::new(),
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// History store of this environment, opening the database if needed
    pub async fn store(&self) -> RunResult<&HistoryStore> {
        Ok(&self.backend().await?.store)
    }

    async fn backend(&self) -> RunResult<&Backend> {
        self.backend
            .get_or_try_init(|| async {
                let db_config = self.ctx.database();
                let db: Arc<dyn Database> = match db_config.db_type {
                    DbType::DuckDb => {
                        let path = db_config.resolved_path(&self.ctx.project.root);
                        log::debug!("Connecting to duckdb at {}", path);
                        Arc::new(DuckDbBackend::new(&path)?)
                    }
                };
                Ok::<_, RunError>(Backend::new(&self.ctx, db))
            })
            .await
    }

    /// Resolve and render every unit, without database access
    pub fn render(&self) -> RunResult<Vec<RenderedUnit>> {
        render_units(&self.ctx)
    }

    /// Create the history table for this environment if missing
    pub async fn init(&self) -> RunResult<()> {
        self.store().await?.ensure_table().await?;
        log::info!(
            "History table {} ready for environment '{}'",
            self.ctx.history_table,
            self.ctx.environment
        );
        Ok(())
    }

    /// Resolve, render, plan and apply under the run lock.
    ///
    /// Everything that can fail without the database fails before the
    /// database is touched. The lock is released on every exit path once
    /// acquired.
    pub async fn update(&self) -> RunResult<UpdateReport> {
        let units = self.render()?;
        let backend = self.backend().await?;
        backend.store.ensure_table().await?;

        let lock = RunLock::acquire(backend.store.clone(), &self.ctx.run_id).await?;
        let outcome = self.plan_and_apply(backend, units).await;
        let released = lock.release().await;

        match (outcome, released) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), released) => {
                if let Err(release_err) = released {
                    log::warn!("Failed to release run lock: {}", release_err);
                }
                Err(e)
            }
        }
    }

    async fn plan_and_apply(
        &self,
        backend: &Backend,
        units: Vec<RenderedUnit>,
    ) -> RunResult<UpdateReport> {
        let plan = self.plan(units).await?;
        if plan.is_up_to_date() {
            log::info!(
                "Environment '{}' is up to date ({} change units applied)",
                self.ctx.environment,
                plan.applied_count()
            );
        } else {
            log::info!(
                "Applying {} of {} change units to '{}'",
                plan.pending_count(),
                plan.steps.len(),
                self.ctx.environment
            );
        }

        let executor = Executor::new(backend.db.clone(), backend.store.clone());
        let applied = executor.apply(&plan).await?;
        Ok(UpdateReport {
            environment: self.ctx.environment.clone(),
            skipped: plan.applied_count(),
            applied,
            orphaned: plan.orphaned,
        })
    }

    /// Plan without writing: no lock, no table creation, no execution
    pub async fn dry_run(&self, check_connection: bool) -> RunResult<DryRunReport> {
        let units = self.render()?;
        if check_connection {
            let db = &self.backend().await?.db;
            db.ping().await.map_err(|e| match e {
                DbError::ConnectionError(_) => RunError::Db(e),
                other => RunError::Db(DbError::ConnectionError(other.to_string())),
            })?;
            log::info!("Connection to {} ok", db.db_type());
        }
        let plan = self.plan(units).await?;
        Ok(Executor::dry_run(&plan, check_connection))
    }

    /// Applied, pending and orphaned units, read-only
    pub async fn status(&self) -> RunResult<StatusReport> {
        let units = self.render()?;
        let plan = self.plan(units).await?;
        Ok(StatusReport::from_plan(&plan))
    }

    /// Ledger rows of this environment in sequence order, read-only
    pub async fn history(&self) -> RunResult<Vec<AppliedRecord>> {
        Ok(self.store().await?.history().await?)
    }

    async fn plan(&self, units: Vec<RenderedUnit>) -> RunResult<MigrationPlan> {
        let ledger = self.store().await?.load_applied().await?;
        Ok(plan(units, &ledger)?)
    }
}
