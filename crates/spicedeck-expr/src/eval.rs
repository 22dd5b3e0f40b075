//! Expression evaluation against a scoped parameter environment.

use std::cell::Cell;
use std::rc::Rc;

use crate::ast::{BinaryOp, EvaluableExpression, Expr, UnaryOp};
use crate::dialect::Dialect;
use crate::error::{EvalError, Result};
use crate::functions::eval_builtin;
use crate::parser::parse_expression;
use crate::scope::Scope;

/// Expression evaluator for one dialect.
///
/// Holds no parameter state of its own; every call takes the scope to
/// resolve against. Recursion through custom functions is bounded by
/// `max_depth` and fails with [`EvalError::RecursionLimit`] instead of
/// overflowing the native stack.
#[derive(Debug)]
pub struct Evaluator {
    dialect: Dialect,
    max_depth: usize,
    rng_seed: u64,
    rng_counter: Cell<u64>,
}

impl Evaluator {
    /// Create an evaluator for the given dialect.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            max_depth: 256,
            rng_seed: 0x5eed_cafe_f00d_u64,
            rng_counter: Cell::new(0),
        }
    }

    /// Override the recursion depth bound.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Seed the `flat()` random stream for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// The dialect this evaluator applies.
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Evaluate a parsed expression against a scope.
    pub fn evaluate(&self, expression: &EvaluableExpression, scope: &Rc<Scope>) -> Result<f64> {
        self.eval(&expression.root, scope, 0)
    }

    /// Parse and evaluate in one step.
    pub fn evaluate_text(&self, text: &str, scope: &Rc<Scope>) -> Result<f64> {
        let parsed = parse_expression(text, &self.dialect).map_err(EvalError::Syntax)?;
        self.evaluate(&parsed, scope)
    }

    fn eval(&self, expr: &Expr, scope: &Rc<Scope>, depth: usize) -> Result<f64> {
        if depth > self.max_depth {
            return Err(EvalError::RecursionLimit(self.max_depth));
        }

        match expr {
            Expr::Number(v) => Ok(*v),
            Expr::Parameter(name) => {
                let bound = scope
                    .lookup(name)
                    .ok_or_else(|| EvalError::UnknownParameter(name.clone()))?;
                self.eval(&bound.root, scope, depth + 1)
            }
            Expr::Unary { op, operand } => {
                let v = self.eval(operand, scope, depth + 1)?;
                match op {
                    UnaryOp::Neg => Ok(-v),
                }
            }
            Expr::Binary { op, left, right } => {
                let l = self.eval(left, scope, depth + 1)?;
                let r = self.eval(right, scope, depth + 1)?;
                Ok(self.apply_binary(*op, l, r))
            }
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => {
                // Only the selected branch is ever evaluated
                let selected = if self.eval(cond, scope, depth + 1)? != 0.0 {
                    then
                } else {
                    otherwise
                };
                self.eval(selected, scope, depth + 1)
            }
            Expr::Lazy(text) => {
                // Deferred: the text is parsed only now that the block has
                // actually been selected
                let parsed = parse_expression(text, &self.dialect).map_err(EvalError::Syntax)?;
                self.eval(&parsed.root, scope, depth + 1)
            }
            Expr::Call { name, args } => self.eval_call(name, args, scope, depth),
            Expr::Property { name, property } => {
                let key = format!("@{}[{}]", name, property);
                let bound = scope
                    .lookup(&key)
                    .ok_or(EvalError::UnknownParameter(key))?;
                self.eval(&bound.root, scope, depth + 1)
            }
        }
    }

    fn apply_binary(&self, op: BinaryOp, l: f64, r: f64) -> f64 {
        match op {
            BinaryOp::Add => l + r,
            BinaryOp::Sub => l - r,
            BinaryOp::Mul => l * r,
            BinaryOp::Div => {
                // Saturate instead of dividing by (near-)zero
                if r.abs() < 1e-30 {
                    if l >= 0.0 {
                        1e30
                    } else {
                        -1e30
                    }
                } else {
                    l / r
                }
            }
            BinaryOp::Pow => self.dialect.pow(l, r),
            BinaryOp::Lt => bool_value(l < r),
            BinaryOp::Le => bool_value(l <= r),
            BinaryOp::Gt => bool_value(l > r),
            BinaryOp::Ge => bool_value(l >= r),
            BinaryOp::Eq => bool_value(l == r),
            BinaryOp::Ne => bool_value(l != r),
        }
    }

    fn eval_call(
        &self,
        name: &str,
        args: &[Expr],
        scope: &Rc<Scope>,
        depth: usize,
    ) -> Result<f64> {
        let upper = name.to_uppercase();

        // Special forms evaluate their arguments selectively
        match upper.as_str() {
            "IF" => {
                if args.len() != 3 {
                    return Err(EvalError::WrongArgumentCount {
                        name: upper,
                        expected: 3,
                        got: args.len(),
                    });
                }
                let selected = if self.eval(&args[0], scope, depth + 1)? != 0.0 {
                    &args[1]
                } else {
                    &args[2]
                };
                return self.eval(selected, scope, depth + 1);
            }
            "DEF" => {
                if args.len() != 1 {
                    return Err(EvalError::WrongArgumentCount {
                        name: upper,
                        expected: 1,
                        got: args.len(),
                    });
                }
                return Ok(match &args[0] {
                    Expr::Parameter(param) => bool_value(scope.is_defined(param)),
                    _ => 0.0,
                });
            }
            "FLAT" => {
                let bound = match args.first() {
                    Some(arg) => self.eval(arg, scope, depth + 1)?,
                    None => 1.0,
                };
                return Ok(self.next_flat(bound));
            }
            _ => {}
        }

        // Custom functions shadow built-ins
        if let Some(function) = scope.lookup_function(&upper) {
            if function.params.len() != args.len() {
                return Err(EvalError::WrongArgumentCount {
                    name: function.name.clone(),
                    expected: function.params.len(),
                    got: args.len(),
                });
            }

            let body = {
                let mut cache = function.parsed.borrow_mut();
                match cache.as_ref() {
                    Some(parsed) => Rc::clone(parsed),
                    None => {
                        let parsed = parse_expression(&function.body, &self.dialect)
                            .map_err(EvalError::Syntax)?;
                        let parsed = Rc::new(parsed);
                        *cache = Some(Rc::clone(&parsed));
                        parsed
                    }
                }
            };

            // Arguments are evaluated in the caller's scope, then bound as
            // constants in a fresh child scope for the body
            let frame = Scope::child(scope);
            for (param, arg) in function.params.iter().zip(args) {
                let value = self.eval(arg, scope, depth + 1)?;
                frame.set_constant(param, value);
            }
            return self.eval(&body.root, &frame, depth + 1);
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg, scope, depth + 1)?);
        }
        eval_builtin(&self.dialect, &upper, &values).ok_or(EvalError::UnknownFunction(upper))
    }

    /// Bounded uniform random value in `[-bound, bound]`, SplitMix64 over
    /// (seed, call index) so runs are reproducible per seed.
    fn next_flat(&self, bound: f64) -> f64 {
        let index = self.rng_counter.get();
        self.rng_counter.set(index.wrapping_add(1));
        let hash = splitmix64(self.rng_seed ^ index.wrapping_mul(0x517c_c1b7_2722_0a95));
        let unit = (hash >> 11) as f64 / (1u64 << 53) as f64;
        (2.0 * unit - 1.0) * bound
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(Dialect::default())
    }
}

fn bool_value(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// SplitMix64 mixing function.
#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}
