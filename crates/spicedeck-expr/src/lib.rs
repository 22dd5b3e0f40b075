//! Numeric expression micro-language for SPICE netlist parameters.
//!
//! Supports expressions like:
//! - `{2*R1 + 5}` - parameter arithmetic
//! - `sqrt(A*A + B*B)` - built-in functions
//! - `W < 2u ? 2u : W` - conditionals
//! - `lazy(#fib(n-1)#)` - deferred blocks for safe recursion
//!
//! Expressions parse once into an [`EvaluableExpression`] carrying their
//! free parameter names, then evaluate any number of times against a
//! [`Scope`] chain under an explicit [`Dialect`].
//!
//! # Example
//!
//! ```
//! use spicedeck_expr::{Dialect, Evaluator, Scope, parse_expression};
//!
//! let scope = Scope::root();
//! scope.set_constant("R1", 1000.0);
//!
//! let expr = parse_expression("2*R1 + 5", &Dialect::default()).unwrap();
//! let evaluator = Evaluator::default();
//! assert_eq!(evaluator.evaluate(&expr, &scope).unwrap(), 2005.0);
//! ```

pub mod ast;
pub mod dialect;
pub mod error;
pub mod eval;
mod functions;
pub mod parser;
pub mod registry;
pub mod scope;

pub use ast::{BinaryOp, EvaluableExpression, Expr, UnaryOp};
pub use dialect::{DbBehavior, Dialect, PowBehavior, PwrBehavior, SqrtBehavior};
pub use error::{EvalError, ExprError, Result};
pub use eval::Evaluator;
pub use parser::parse_expression;
pub use registry::DependencyRegistry;
pub use scope::{CustomFunction, Scope};
