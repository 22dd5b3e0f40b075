//! Parse-tree evaluator: a bottom-up fold into the netlist object model.
//!
//! The fold is post-order and iterative. Each non-terminal reduces using
//! only its children's already-reduced values; terminals reduce to their
//! bound token. Statement order and line numbers survive the fold exactly.

use std::collections::VecDeque;

use spicedeck_core::{Netlist, Parameter, Parameters, Statement, SubcircuitDef};

use crate::error::{ParseError, Result};
use crate::token::{Token, TokenKind};
use crate::tree::{ParseNode, ParseTree, Symbol};

/// Intermediate value a tree node reduces to.
#[derive(Debug)]
enum Reduced {
    Empty,
    Token(Token),
    Param(Parameter),
    Params(VecDeque<Parameter>),
    Stmt(Statement),
    Stmts(VecDeque<Statement>),
    Net(Netlist),
    EndsName(Option<Token>),
}

/// Fold a parse tree into a [`Netlist`].
pub fn evaluate(tree: &ParseTree) -> Result<Netlist> {
    enum Visit {
        Enter(usize),
        Exit(usize),
    }

    let mut results: Vec<Option<Reduced>> = Vec::with_capacity(tree.len());
    results.resize_with(tree.len(), || None);

    let mut stack = vec![Visit::Enter(tree.root())];
    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(id) => match tree.node(id) {
                ParseNode::Terminal { token, .. } => {
                    results[id] = Some(match token {
                        Some(t) => Reduced::Token(t.clone()),
                        None => Reduced::Empty,
                    });
                }
                ParseNode::NonTerminal { children, .. } => {
                    stack.push(Visit::Exit(id));
                    for &child in children.iter().rev() {
                        stack.push(Visit::Enter(child));
                    }
                }
            },
            Visit::Exit(id) => {
                let (symbol, children) = match tree.node(id) {
                    ParseNode::NonTerminal { symbol, children } => (*symbol, children),
                    ParseNode::Terminal { .. } => continue,
                };
                let kids: Vec<Reduced> = children
                    .iter()
                    .map(|&c| results[c].take().unwrap_or(Reduced::Empty))
                    .collect();
                results[id] = Some(reduce(symbol, kids)?);
            }
        }
    }

    match results[tree.root()].take() {
        Some(Reduced::Net(netlist)) => Ok(netlist),
        _ => Err(shape("netlist root")),
    }
}

fn shape(context: &'static str) -> ParseError {
    ParseError::Tree { context }
}

fn reduce(symbol: Symbol, mut kids: Vec<Reduced>) -> Result<Reduced> {
    match symbol {
        Symbol::Netlist => {
            let title = take_token(&mut kids, 0, "title")?;
            let statements = take_statements(&mut kids, 2, "title netlist body")?;
            let mut netlist = Netlist::with_title(title.lexeme);
            for s in statements {
                netlist.push(s);
            }
            Ok(Reduced::Net(netlist))
        }
        Symbol::NetlistWithoutTitle => {
            let statements = take_statements(&mut kids, 0, "netlist body")?;
            let mut netlist = Netlist::new();
            for s in statements {
                netlist.push(s);
            }
            Ok(Reduced::Net(netlist))
        }
        Symbol::NetlistEnding => Ok(Reduced::Empty),
        Symbol::Statements => {
            match kids.len() {
                0 => Ok(Reduced::Stmts(VecDeque::new())),
                // blank line: Newline Statements
                2 if matches!(kids[0], Reduced::Token(_)) => {
                    Ok(Reduced::Stmts(take_statements(&mut kids, 1, "statements")?))
                }
                // Statement Statements
                2 => {
                    let mut rest = take_statements(&mut kids, 1, "statements")?;
                    match std::mem::replace(&mut kids[0], Reduced::Empty) {
                        Reduced::Stmt(s) => {
                            rest.push_front(s);
                            Ok(Reduced::Stmts(rest))
                        }
                        _ => Err(shape("statement list head")),
                    }
                }
                _ => Err(shape("statement list")),
            }
        }
        Symbol::Statement => match kids.pop() {
            Some(Reduced::Stmt(s)) => Ok(Reduced::Stmt(s)),
            _ => Err(shape("statement")),
        },
        Symbol::CommentLine => {
            let comment = take_token(&mut kids, 0, "comment")?;
            Ok(Reduced::Stmt(Statement::Comment {
                text: comment.lexeme,
                line: comment.line,
            }))
        }
        Symbol::Component => {
            let name = take_token(&mut kids, 0, "component name")?;
            let params = take_parameters(&mut kids, 1, "component parameters")?;
            Ok(Reduced::Stmt(Statement::Component {
                line: name.line,
                name: name.lexeme,
                params,
            }))
        }
        Symbol::Control => {
            let dot = take_token(&mut kids, 0, "control dot")?;
            let word = take_token(&mut kids, 1, "control word")?;
            let params = take_parameters(&mut kids, 2, "control parameters")?;
            Ok(Reduced::Stmt(Statement::Control {
                name: word.lexeme,
                params,
                line: dot.line,
            }))
        }
        Symbol::Model => {
            let dot = take_token(&mut kids, 0, "model dot")?;
            let name = take_token(&mut kids, 2, "model name")?;
            let kind = take_token(&mut kids, 3, "model type")?;
            let params = take_parameters(&mut kids, 4, "model parameters")?;
            Ok(Reduced::Stmt(Statement::Model {
                name: name.lexeme,
                kind: kind.lexeme,
                params,
                line: dot.line,
            }))
        }
        Symbol::Subckt => {
            let dot = take_token(&mut kids, 0, "subckt dot")?;
            let name = take_token(&mut kids, 2, "subckt name")?;
            let header = take_parameters(&mut kids, 3, "subckt header")?;
            let body = take_statements(&mut kids, 5, "subckt body")?;
            let ends_name = match kids.get_mut(6) {
                Some(slot) => match std::mem::replace(slot, Reduced::Empty) {
                    Reduced::EndsName(n) => n,
                    _ => return Err(shape("subckt ending")),
                },
                None => None,
            };

            if let Some(ends) = &ends_name {
                if !ends.lexeme.eq_ignore_ascii_case(&name.lexeme) {
                    return Err(ParseError::MismatchedEnds {
                        found: ends.lexeme.clone(),
                        expected: name.lexeme.clone(),
                        line: ends.line,
                    });
                }
            }

            let (pins, defaults) = split_subckt_header(header);
            Ok(Reduced::Stmt(Statement::Subcircuit(SubcircuitDef {
                name: name.lexeme,
                pins,
                defaults,
                statements: body.into(),
                line: dot.line,
            })))
        }
        Symbol::SubcktEnding => {
            // [Ends, Newline] or [Ends, name, Newline]
            if kids.len() == 3 {
                Ok(Reduced::EndsName(Some(take_token(&mut kids, 1, "ends name")?)))
            } else {
                Ok(Reduced::EndsName(None))
            }
        }
        Symbol::Parameters => match kids.len() {
            0 => Ok(Reduced::Params(VecDeque::new())),
            // Parameter Parameters
            2 => {
                let mut rest = take_params(&mut kids, 1, "parameter list")?;
                match std::mem::replace(&mut kids[0], Reduced::Empty) {
                    Reduced::Param(p) => rest.push_front(p),
                    _ => return Err(shape("parameter list head")),
                }
                Ok(Reduced::Params(rest))
            }
            // ( Parameters ) Parameters
            4 => {
                let mut inner = take_params(&mut kids, 1, "parenthesized parameters")?;
                let rest = take_params(&mut kids, 3, "parameter list tail")?;
                inner.extend(rest);
                Ok(Reduced::Params(inner))
            }
            _ => Err(shape("parameters")),
        },
        Symbol::Parameter | Symbol::ParameterEqualSingle => match kids.pop() {
            Some(Reduced::Token(t)) => Ok(Reduced::Param(token_to_parameter(t))),
            Some(Reduced::Param(p)) => Ok(Reduced::Param(p)),
            _ => Err(shape("parameter")),
        },
        Symbol::Vector => {
            // first , second VectorContinue
            let first = take_token(&mut kids, 0, "vector head")?;
            let second = take_token(&mut kids, 2, "vector second")?;
            let rest = take_params(&mut kids, 3, "vector tail")?;
            let mut items = vec![token_to_parameter(first), token_to_parameter(second)];
            items.extend(rest);
            Ok(Reduced::Param(Parameter::Vector(items)))
        }
        Symbol::VectorContinue => {
            if kids.is_empty() {
                return Ok(Reduced::Params(VecDeque::new()));
            }
            // , value VectorContinue
            let value = take_token(&mut kids, 1, "vector continuation")?;
            let mut rest = take_params(&mut kids, 2, "vector continuation tail")?;
            rest.push_front(token_to_parameter(value));
            Ok(Reduced::Params(rest))
        }
        Symbol::ParameterBracket => {
            let name = take_token(&mut kids, 0, "bracket name")?;
            let args = take_params(&mut kids, 2, "bracket arguments")?;
            Ok(Reduced::Param(Parameter::Bracket {
                name: name.lexeme,
                args: args.into(),
            }))
        }
        Symbol::ParameterBracketContent => match kids.pop() {
            Some(Reduced::Params(p)) => Ok(Reduced::Params(p)),
            _ => Err(shape("bracket content")),
        },
        Symbol::ParameterEqual => {
            let name = take_token(&mut kids, 0, "assignment name")?;
            let (display_name, value_idx) = if kids.len() > 3 {
                // name ( args ) = value
                let args = take_params(&mut kids, 2, "assignment arguments")?;
                let rendered = args
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                (format!("{}({})", name.lexeme, rendered), 5)
            } else {
                (name.lexeme, 2)
            };
            let value = match kids.get_mut(value_idx) {
                Some(slot) => match std::mem::replace(slot, Reduced::Empty) {
                    Reduced::Param(p) => p,
                    _ => return Err(shape("assignment value")),
                },
                None => return Err(shape("assignment value")),
            };
            let values = match value {
                Parameter::Vector(items) => items,
                single => vec![single],
            };
            Ok(Reduced::Param(Parameter::Assignment {
                name: display_name,
                values,
            }))
        }
    }
}

fn take_token(kids: &mut [Reduced], index: usize, context: &'static str) -> Result<Token> {
    match kids.get_mut(index) {
        Some(slot) => match std::mem::replace(slot, Reduced::Empty) {
            Reduced::Token(t) => Ok(t),
            _ => Err(shape(context)),
        },
        None => Err(shape(context)),
    }
}

fn take_params(
    kids: &mut [Reduced],
    index: usize,
    context: &'static str,
) -> Result<VecDeque<Parameter>> {
    match kids.get_mut(index) {
        Some(slot) => match std::mem::replace(slot, Reduced::Empty) {
            Reduced::Params(p) => Ok(p),
            _ => Err(shape(context)),
        },
        None => Err(shape(context)),
    }
}

fn take_parameters(kids: &mut [Reduced], index: usize, context: &'static str) -> Result<Parameters> {
    let deque = take_params(kids, index, context)?;
    Ok(Vec::from(deque).into())
}

fn take_statements(
    kids: &mut [Reduced],
    index: usize,
    context: &'static str,
) -> Result<VecDeque<Statement>> {
    match kids.get_mut(index) {
        Some(slot) => match std::mem::replace(slot, Reduced::Empty) {
            Reduced::Stmts(s) => Ok(s),
            _ => Err(shape(context)),
        },
        None => Err(shape(context)),
    }
}

fn token_to_parameter(t: Token) -> Parameter {
    match t.kind {
        TokenKind::Value => Parameter::Value {
            value: t.value.unwrap_or_default(),
            image: t.lexeme,
        },
        TokenKind::Identifier => Parameter::Identifier(t.lexeme),
        TokenKind::Expression => Parameter::Expression(t.lexeme),
        TokenKind::Reference => {
            let parts = t
                .reference_parts()
                .map(|(name, property)| (name.to_string(), property.to_string()));
            match parts {
                Some((name, property)) => Parameter::Reference { name, property },
                None => Parameter::Single(t.lexeme),
            }
        }
        _ => Parameter::Single(t.lexeme),
    }
}

/// Split a subcircuit header parameter list into pins and default
/// parameters. A bare `PARAMS:` marker separates the two regions but is
/// otherwise dropped.
fn split_subckt_header(header: Parameters) -> (Vec<String>, Vec<(String, String)>) {
    let mut pins = Vec::new();
    let mut defaults = Vec::new();

    for param in header {
        match param {
            Parameter::Assignment { name, values } => {
                let rendered = values
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                defaults.push((name, rendered));
            }
            Parameter::Single(s) if s.eq_ignore_ascii_case("PARAMS:") || s.eq_ignore_ascii_case("PARAMS") => {}
            other => {
                if let Some(image) = other.image() {
                    pins.push(image.to_string());
                } else {
                    pins.push(other.to_string());
                }
            }
        }
    }

    (pins, defaults)
}
