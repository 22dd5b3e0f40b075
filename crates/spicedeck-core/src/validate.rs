//! Non-fatal validation diagnostics.
//!
//! A statement that parses but cannot be fully interpreted (for example a
//! `.SAVE I(R9)` naming a component that was never declared) is reported as
//! a [`Warning`] rather than aborting the parse.

use thiserror::Error;

use crate::parameter::Parameter;
use crate::statement::{Netlist, Statement};

/// A non-fatal diagnostic attached to a source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct Warning {
    /// Human-readable description.
    pub message: String,
    /// 1-based source line.
    pub line: usize,
}

/// Case-sensitivity switches for name matching.
///
/// SPICE is historically case-insensitive; both switches default to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaseSensitivity {
    /// Component/model/subcircuit names match exactly when set.
    pub entity_names: bool,
    /// Dot-command words match exactly when set.
    pub dot_statements: bool,
}

impl CaseSensitivity {
    fn entity_eq(&self, a: &str, b: &str) -> bool {
        if self.entity_names {
            a == b
        } else {
            a.eq_ignore_ascii_case(b)
        }
    }
}

/// Check entity references in control statements against declared names.
///
/// Validates `I(<name>)`-style bracket references and `@name[prop]`
/// property references at the netlist top level. Subcircuit bodies are
/// self-contained and validated against their own declarations.
pub fn validate_entity_references(netlist: &Netlist, case: &CaseSensitivity) -> Vec<Warning> {
    let mut warnings = Vec::new();
    validate_scope(netlist.statements(), case, &mut warnings);
    warnings
}

fn validate_scope(statements: &[Statement], case: &CaseSensitivity, out: &mut Vec<Warning>) {
    let declared: Vec<&str> = statements
        .iter()
        .filter_map(|s| match s {
            Statement::Component { name, .. } => Some(name.as_str()),
            Statement::Model { name, .. } => Some(name.as_str()),
            Statement::Subcircuit(def) => Some(def.name.as_str()),
            _ => None,
        })
        .collect();

    for statement in statements {
        match statement {
            Statement::Control { params, line, .. } => {
                for param in params {
                    check_parameter(param, &declared, case, *line, out);
                }
            }
            Statement::Subcircuit(def) => {
                validate_scope(&def.statements, case, out);
            }
            _ => {}
        }
    }
}

fn check_parameter(
    param: &Parameter,
    declared: &[&str],
    case: &CaseSensitivity,
    line: usize,
    out: &mut Vec<Warning>,
) {
    match param {
        // Branch-current references name a component: I(R1)
        Parameter::Bracket { name, args } if name.eq_ignore_ascii_case("i") => {
            for arg in args {
                if let Some(entity) = arg.image() {
                    if !declared.iter().any(|d| case.entity_eq(d, entity)) {
                        out.push(Warning {
                            message: format!("reference to undeclared component '{}'", entity),
                            line,
                        });
                    }
                }
            }
        }
        Parameter::Reference { name, .. } => {
            if !declared.iter().any(|d| case.entity_eq(d, name)) {
                out.push(Warning {
                    message: format!("reference to undeclared entity '{}'", name),
                    line,
                });
            }
        }
        Parameter::Vector(items) => {
            for item in items {
                check_parameter(item, declared, case, line, out);
            }
        }
        Parameter::Assignment { values, .. } => {
            for value in values {
                check_parameter(value, declared, case, line, out);
            }
        }
        _ => {}
    }
}
