//! Error types for cf-jinja

use thiserror::Error;

/// Templating errors
#[derive(Error, Debug)]
pub enum JinjaError {
    /// Template failed to render (J001)
    #[error("[J001] Failed to render {path}{}: {detail}", line_suffix(.line))]
    RenderError {
        path: String,
        line: Option<usize>,
        detail: String,
    },

    /// Template references a name the environment does not define (J002)
    #[error("[J002] Undefined variable '{reference}' in {path}. Define it in variables/common.yaml or the environment's variables file")]
    UndefinedVariable { path: String, reference: String },

    /// Two macro definitions share a name (J003)
    #[error("[J003] Duplicate macro '{name}' defined in {first} and {second}")]
    DuplicateMacro {
        name: String,
        first: String,
        second: String,
    },

    /// Macro file does not compile (J004)
    #[error("[J004] Syntax error in macro file {path}: {message}")]
    MacroSyntax { path: String, message: String },

    /// Macro directory or file could not be read (J005)
    #[error("[J005] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" (line {})", line),
        None => String::new(),
    }
}

/// Result type alias for JinjaError
pub type JinjaResult<T> = Result<T, JinjaError>;
