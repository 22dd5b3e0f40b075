//! Netlist statements: the object model a parse folds into.

use crate::parameter::Parameters;

/// A parsed netlist: optional title plus statements in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Netlist {
    title: Option<String>,
    statements: Vec<Statement>,
}

impl Netlist {
    /// Create an empty netlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a netlist with a title.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Get the netlist title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Append a statement, preserving source order.
    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    /// Statements in source order.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Number of top-level statements.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether the netlist has no statements.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Iterate over component statements at the top level.
    pub fn components(&self) -> impl Iterator<Item = &Statement> {
        self.statements
            .iter()
            .filter(|s| matches!(s, Statement::Component { .. }))
    }

    /// Iterate over control (dot-command) statements at the top level.
    pub fn controls(&self) -> impl Iterator<Item = &Statement> {
        self.statements
            .iter()
            .filter(|s| matches!(s, Statement::Control { .. }))
    }
}

/// A single netlist statement.
///
/// Every variant carries the 1-based source line it started on.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Statement {
    /// Circuit element line: `R1 1 0 10`.
    Component {
        name: String,
        params: Parameters,
        line: usize,
    },
    /// Dot command other than `.MODEL`/`.SUBCKT`: `.OP`, `.SAVE I(R1)`.
    Control {
        name: String,
        params: Parameters,
        line: usize,
    },
    /// `.MODEL <name> <type> (<params>)`.
    Model {
        name: String,
        kind: String,
        params: Parameters,
        line: usize,
    },
    /// `.SUBCKT ... .ENDS` block with its body statements.
    Subcircuit(SubcircuitDef),
    /// Full-line `*` comment, text preserved.
    Comment { text: String, line: usize },
}

impl Statement {
    /// The 1-based source line this statement started on.
    pub fn line(&self) -> usize {
        match self {
            Statement::Component { line, .. }
            | Statement::Control { line, .. }
            | Statement::Model { line, .. }
            | Statement::Comment { line, .. } => *line,
            Statement::Subcircuit(def) => def.line,
        }
    }

    /// The statement name, where the variant has one.
    ///
    /// Comments have no name; controls report the command word without the
    /// leading dot.
    pub fn name(&self) -> Option<&str> {
        match self {
            Statement::Component { name, .. }
            | Statement::Control { name, .. }
            | Statement::Model { name, .. } => Some(name),
            Statement::Subcircuit(def) => Some(&def.name),
            Statement::Comment { .. } => None,
        }
    }
}

/// A subcircuit definition.
///
/// The body is a self-contained statement list; nothing leaks in or out
/// except through the pin names and default parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SubcircuitDef {
    /// Subcircuit name.
    pub name: String,
    /// Formal pin names, in declaration order.
    pub pins: Vec<String>,
    /// Default parameters as `(name, value_image)` pairs, in source order.
    pub defaults: Vec<(String, String)>,
    /// Body statements, in source order.
    pub statements: Vec<Statement>,
    /// Source line of the `.SUBCKT` header.
    pub line: usize,
}
