//! Error types for spicedeck-expr.

use thiserror::Error;

/// Errors produced while parsing an expression string.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at position {position}")]
pub struct ExprError {
    pub message: String,
    pub position: usize,
}

impl ExprError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Errors produced while evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{name}' expects {expected} arguments, got {got}")]
    WrongArgumentCount {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("expression syntax error: {0}")]
    Syntax(ExprError),

    #[error("recursion limit of {0} exceeded")]
    RecursionLimit(usize),
}

pub type Result<T> = std::result::Result<T, EvalError>;
