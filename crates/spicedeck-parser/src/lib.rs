//! SPICE netlist parser for spicedeck.
//!
//! Text flows through three stages: the lexer produces a typed token
//! stream, the grammar-driven parser builds a parse tree on an explicit
//! node stack, and the tree evaluator folds the tree into the
//! [`Netlist`](spicedeck_core::Netlist) object model.
//!
//! # Example
//!
//! ```
//! use spicedeck_parser::parse;
//!
//! let netlist = parse(
//!     "Voltage Divider\n\
//!      V1 1 0 10\n\
//!      R1 1 2 1k\n\
//!      R2 2 0 1k\n\
//!      .END\n",
//! )
//! .unwrap();
//!
//! assert_eq!(netlist.title(), Some("Voltage Divider"));
//! assert_eq!(netlist.len(), 3);
//! ```

pub mod error;
pub mod eval;
pub mod grammar;
pub mod lexer;
pub mod token;
pub mod tree;

pub use error::{LexError, ParseError, Result};
pub use grammar::ParserOptions;
pub use lexer::LexerOptions;
pub use token::{Token, TokenKind};
pub use tree::{ParseNode, ParseTree, Symbol};

use spicedeck_core::Netlist;

/// Parse a netlist with explicit options.
pub fn parse_netlist(input: &str, options: &ParserOptions) -> Result<Netlist> {
    let lexer_options = LexerOptions {
        has_title: options.has_title,
        dot_case_sensitive: options.dot_case_sensitive,
    };
    let tokens = lexer::tokenize(input, &lexer_options)?;
    let tree = grammar::parse(&tokens, options)?;
    eval::evaluate(&tree)
}

/// Parse a netlist with default options (title line expected, `.END`
/// optional, dot commands case-insensitive).
pub fn parse(input: &str) -> Result<Netlist> {
    parse_netlist(input, &ParserOptions::default())
}
