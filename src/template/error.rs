//! Template error types

use thiserror::Error;

/// Errors raised by namespace operations and rendering.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template: redefinition of template {name:?}")]
    Redefinition { name: String },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("template: invalid function {name:?}: {reason}")]
    InvalidFunction { name: String, reason: String },

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("template: failed to convert data: {0}")]
    Data(#[from] serde_json::Error),

    #[error("template: write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// The parser rejected source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template: {name}:{line}: {message}")]
pub struct ParseError {
    pub name: String,
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(name: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            line,
            message: message.into(),
        }
    }
}

/// Rendering failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template: {name}:{line}: executing {name:?}: {message}")]
pub struct ExecError {
    pub name: String,
    pub line: usize,
    pub message: String,
}

impl ExecError {
    pub fn new(name: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            line,
            message: message.into(),
        }
    }
}
