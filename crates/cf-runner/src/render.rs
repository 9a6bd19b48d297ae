//! Resolve the changelog and render every unit, without touching the database.

use crate::context::RunContext;
use crate::error::RunResult;
use cf_core::{resolve, RenderedUnit};

/// Resolve the master changelog and render all units in apply order.
///
/// Fails on the first resolution or render error, before any database work.
pub fn render_units(ctx: &RunContext) -> RunResult<Vec<RenderedUnit>> {
    let resolved = resolve(&ctx.project.root, &ctx.project.changelog)?;

    let mut rendered = Vec::with_capacity(resolved.units.len());
    for unit in resolved.units {
        let sql = ctx.renderer.render(&unit.source_name(), &unit.raw_content)?;
        let unit = RenderedUnit::new(unit, sql);
        log::debug!("Rendered {} ({})", unit.id(), &unit.checksum[..12]);
        rendered.push(unit);
    }
    Ok(rendered)
}
