//! # spicedeck
//!
//! A SPICE-dialect netlist front end: a grammar-driven parser that folds
//! netlist text into a typed object model, and an expression engine for the
//! numeric micro-language embedded in parameters (`{2*R1 + 5}`).
//!
//! Spicedeck stops where simulation starts: the object model it produces is
//! meant to be translated into a simulation engine's own component types by
//! the consumer, which can call back into the expression engine to resolve
//! parameter values.
//!
//! ## Quick start
//!
//! ```rust
//! use spicedeck::prelude::*;
//!
//! let netlist = spicedeck::parse(
//!     "Voltage Divider\n\
//!      V1 1 0 10\n\
//!      R1 1 2 1k\n\
//!      R2 2 0 1k\n\
//!      .OP\n\
//!      .END\n",
//! )
//! .unwrap();
//!
//! assert_eq!(netlist.title(), Some("Voltage Divider"));
//! assert_eq!(netlist.components().count(), 3);
//! ```
//!
//! ## Evaluating embedded expressions
//!
//! ```rust
//! use spicedeck::prelude::*;
//!
//! let scope = Scope::root();
//! scope.set_constant("RBASE", 1e3);
//!
//! let evaluator = Evaluator::new(Dialect::spice3());
//! let value = evaluator.evaluate_text("2*RBASE + 50", &scope).unwrap();
//! assert_eq!(value, 2050.0);
//! ```

// Re-export the component crates
pub use spicedeck_core as core;
pub use spicedeck_expr as expr;
pub use spicedeck_parser as parser;

pub use spicedeck_parser::{parse, parse_netlist};

/// Commonly used types, for glob import.
pub mod prelude {
    pub use spicedeck_core::{
        CaseSensitivity, Netlist, Parameter, Parameters, Statement, SubcircuitDef, Warning,
    };
    pub use spicedeck_expr::{
        CustomFunction, DependencyRegistry, Dialect, EvalError, EvaluableExpression, Evaluator,
        ExprError, Scope,
    };
    pub use spicedeck_parser::{
        LexError, LexerOptions, ParseError, ParserOptions, Token, TokenKind,
    };
}
