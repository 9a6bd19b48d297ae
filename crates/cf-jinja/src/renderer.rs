//! Template renderer for change units.

use crate::error::{JinjaError, JinjaResult};
use crate::functions::{make_var_fn, yaml_to_value};
use crate::macros::MacroLibrary;
use cf_core::VariableSet;
use minijinja::{Environment, Error, ErrorKind, UndefinedBehavior, Value};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Names the engine resolves without a variable behind them
const ENGINE_GLOBALS: &[&str] = &[
    "var", "target", "range", "dict", "namespace", "debug", "cycler", "joiner", "loop", "self",
];

/// The `target` object exposed to templates
#[derive(Debug, Clone, Serialize)]
pub struct TargetContext {
    /// Environment name (`dev`, `uat`, `prd`, ...)
    pub name: String,
}

/// Renders change unit templates for one environment.
///
/// Built once per run from the environment's variables and the macro
/// library; rendering does not mutate it, so the same input always yields
/// the same SQL.
pub struct TemplateRenderer {
    env: Environment<'static>,
    context: Value,
    variable_names: HashSet<String>,
    prelude: String,
    environment: String,
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("environment", &self.environment)
            .field("variables", &self.variable_names.len())
            .field("prelude", &self.prelude)
            .finish()
    }
}

impl TemplateRenderer {
    /// Build the rendering environment.
    pub fn new(vars: &VariableSet, macros: &MacroLibrary) -> JinjaResult<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        let values: BTreeMap<String, Value> = vars
            .iter()
            .map(|(name, value)| (name.clone(), yaml_to_value(value)))
            .collect();
        let variable_names = values.keys().cloned().collect();

        env.add_function("var", make_var_fn(Arc::new(values.clone())));
        env.add_global(
            "target",
            Value::from_serialize(&TargetContext {
                name: vars.environment().to_string(),
            }),
        );

        for file in macros.files() {
            env.add_template_owned(file.name.clone(), file.source.clone())
                .map_err(|e| JinjaError::MacroSyntax {
                    path: file.path.display().to_string(),
                    message: e.to_string(),
                })?;
        }

        Ok(Self {
            env,
            context: Value::from_iter(values),
            variable_names,
            prelude: import_prelude(macros),
            environment: vars.environment().to_string(),
        })
    }

    /// Environment this renderer was built for
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Render one change unit.
    ///
    /// `source_name` identifies the unit in errors (its relative path).
    pub fn render(&self, source_name: &str, raw: &str) -> JinjaResult<String> {
        // The prelude is one line ending in a newline that trim_blocks eats,
        // so the unit's own text renders the same with or without macros.
        let source = format!("{}{}", self.prelude, raw);
        self.env
            .render_named_str(source_name, &source, &self.context)
            .map_err(|err| self.classify(source_name, &source, err))
    }

    fn classify(&self, source_name: &str, source: &str, err: Error) -> JinjaError {
        if err.kind() == ErrorKind::UndefinedError {
            let reference = self
                .undeclared_reference(source)
                .or_else(|| err.detail().map(String::from))
                .unwrap_or_else(|| {
                    format!(
                        "{}:{}",
                        err.name().unwrap_or(source_name),
                        self.unit_line(source_name, &err).unwrap_or(0)
                    )
                });
            return JinjaError::UndefinedVariable {
                path: source_name.to_string(),
                reference,
            };
        }

        let detail = match err.detail() {
            Some(detail) => format!("{}: {}", err.kind(), detail),
            None => err.kind().to_string(),
        };
        let detail = match err.name() {
            Some(name) if name != source_name => format!("{} (in {})", detail, name),
            _ => detail,
        };
        JinjaError::RenderError {
            path: source_name.to_string(),
            line: self.unit_line(source_name, &err),
            detail,
        }
    }

    /// Error line as counted in the unit file, past the prelude line
    fn unit_line(&self, source_name: &str, err: &Error) -> Option<usize> {
        let line = err.line()?;
        let in_unit = err.name().map_or(true, |name| name == source_name);
        if in_unit && !self.prelude.is_empty() {
            Some(line.saturating_sub(1).max(1))
        } else {
            Some(line)
        }
    }

    /// First name the template reads that neither the variables nor the
    /// engine define
    fn undeclared_reference(&self, source: &str) -> Option<String> {
        let scanner = Environment::new();
        let template = scanner.template_from_str(source).ok()?;
        let mut names: Vec<String> = template
            .undeclared_variables(false)
            .into_iter()
            .filter(|name| {
                !self.variable_names.contains(name) && !ENGINE_GLOBALS.contains(&name.as_str())
            })
            .collect();
        names.sort();
        names.into_iter().next()
    }
}

/// `{% from "file" import a, b %}` for every macro file, on one line
/// closed by a newline; empty when no file defines a macro
fn import_prelude(macros: &MacroLibrary) -> String {
    let imports: String = macros
        .files()
        .iter()
        .filter(|file| !file.macros.is_empty())
        .map(|file| {
            format!(
                "{{% from \"{}\" import {} %}}",
                file.name,
                file.macros.join(", ")
            )
        })
        .collect();
    if imports.is_empty() {
        imports
    } else {
        imports + "\n"
    }
}

#[cfg(test)]
#[path = "renderer_test.rs"]
mod tests;
