//! cf-jinja - Jinja templating layer for changeflow
//!
//! Renders change unit templates with a strict environment: the merged
//! variables of one environment (as top-level names and through `var()`),
//! a `target` object, and every macro of the project's macro library
//! imported into each unit's scope.

pub mod error;
pub mod functions;
pub mod macros;
pub mod renderer;

pub use error::{JinjaError, JinjaResult};
pub use macros::{MacroFile, MacroLibrary};
pub use renderer::{TargetContext, TemplateRenderer};
