//! Core object model for spicedeck.
//!
//! This crate provides the data structures a parsed netlist folds into:
//! statements, their parameter lists, and the engineering-unit helpers used
//! to interpret numeric values. It performs no parsing itself; see
//! `spicedeck-parser` for the grammar engine and `spicedeck-expr` for the
//! expression micro-language.

pub mod parameter;
pub mod statement;
pub mod units;
pub mod validate;

pub use parameter::{Parameter, Parameters};
pub use statement::{Netlist, Statement, SubcircuitDef};
pub use validate::{CaseSensitivity, Warning};
