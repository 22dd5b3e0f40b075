//! Expression AST types.

use std::collections::BTreeSet;

/// Expression AST node.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Expr {
    /// Numeric constant, unit suffix already folded.
    Number(f64),
    /// Named parameter, resolved through the scope chain at evaluation.
    Parameter(String),
    /// Unary operation.
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Binary operation.
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `cond ? then : otherwise`. Only the selected branch is evaluated.
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// Function call; the name resolves against the function tables at
    /// evaluation time, so forward references are legal.
    Call { name: String, args: Vec<Expr> },
    /// `lazy(#...#)` block: the raw text is kept unparsed until a
    /// conditional branch actually selects it.
    Lazy(String),
    /// `@name[prop]` property reference, resolved by the caller through the
    /// scope (under its full `@name[prop]` key).
    Property { name: String, property: String },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum UnaryOp {
    Neg,
}

/// A parsed expression: source text, AST root, and the free parameter
/// names it references. Built once per distinct string and reused across
/// evaluations.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluableExpression {
    /// Original source text.
    pub text: String,
    /// AST root.
    pub root: Expr,
    /// Free parameter names (uppercase), excluding function names and
    /// anything hidden inside unparsed `lazy` blocks.
    pub free: BTreeSet<String>,
}
