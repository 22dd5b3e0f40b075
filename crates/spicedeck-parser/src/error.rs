//! Error types for spicedeck-parser.

use thiserror::Error;

/// Errors produced while turning raw text into tokens.
///
/// Lex errors are always fatal to the current parse; the lexer never
/// silently drops characters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("malformed numeric literal '{lexeme}' at line {line}")]
    MalformedNumber { lexeme: String, line: usize },

    #[error("unterminated {what} at line {line}")]
    Unterminated { what: &'static str, line: usize },

    #[error("unexpected character '{ch}' at line {line}")]
    UnexpectedChar { ch: char, line: usize },
}

/// Errors produced by the grammar-driven parser and the tree evaluator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("unexpected {found} '{lexeme}' at line {line}, expected {expected}")]
    UnexpectedToken {
        found: String,
        lexeme: String,
        expected: String,
        line: usize,
    },

    #[error("unexpected end of input at line {line}, expected {expected}")]
    UnexpectedEnd { expected: String, line: usize },

    #[error("missing .END statement at end of netlist")]
    MissingEnd,

    #[error(".ENDS name '{found}' at line {line} does not close subcircuit '{expected}'")]
    MismatchedEnds {
        found: String,
        expected: String,
        line: usize,
    },

    #[error("malformed parse tree while reducing {context}")]
    Tree { context: &'static str },
}

pub type Result<T> = std::result::Result<T, ParseError>;
