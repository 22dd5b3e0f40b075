//! Parameter scopes with parent/child inheritance.
//!
//! Scopes form a tree whose lifetime follows subcircuit-instance
//! generation: a child scope is created per instantiation and dropped when
//! that instance is done. Parent links are non-owning (`Weak`), so a child
//! never keeps its parent's scope alive.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::ast::{EvaluableExpression, Expr};

/// A user-defined function: named, with ordered formal parameters and an
/// unparsed body. The body is parsed on first use and cached.
#[derive(Debug, Clone)]
pub struct CustomFunction {
    pub name: String,
    pub params: Vec<String>,
    pub body: String,
    pub(crate) parsed: RefCell<Option<Rc<EvaluableExpression>>>,
}

impl CustomFunction {
    pub fn new(
        name: impl Into<String>,
        params: Vec<impl Into<String>>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
            body: body.into(),
            parsed: RefCell::new(None),
        }
    }
}

/// A parameter/function environment with optional parent fallback.
#[derive(Debug, Default)]
pub struct Scope {
    parameters: RefCell<IndexMap<String, Rc<EvaluableExpression>>>,
    functions: RefCell<IndexMap<String, Rc<CustomFunction>>>,
    parent: Option<Weak<Scope>>,
}

impl Scope {
    /// Create a root scope.
    pub fn root() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Create a child scope whose lookups fall back to `parent`.
    pub fn child(parent: &Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            parameters: RefCell::new(IndexMap::new()),
            functions: RefCell::new(IndexMap::new()),
            parent: Some(Rc::downgrade(parent)),
        })
    }

    /// Bind a parameter to an expression. Names are case-insensitive.
    pub fn set_parameter(&self, name: &str, expression: EvaluableExpression) {
        self.parameters
            .borrow_mut()
            .insert(name.to_uppercase(), Rc::new(expression));
    }

    /// Bind a parameter to a plain constant.
    pub fn set_constant(&self, name: &str, value: f64) {
        let expression = EvaluableExpression {
            text: value.to_string(),
            root: Expr::Number(value),
            free: Default::default(),
        };
        self.set_parameter(name, expression);
    }

    /// Register a custom function. Names are case-insensitive.
    pub fn define_function(&self, function: CustomFunction) {
        self.functions
            .borrow_mut()
            .insert(function.name.to_uppercase(), Rc::new(function));
    }

    /// Look up a parameter, walking the parent chain.
    pub fn lookup(&self, name: &str) -> Option<Rc<EvaluableExpression>> {
        let key = name.to_uppercase();
        if let Some(found) = self.parameters.borrow().get(&key) {
            return Some(Rc::clone(found));
        }
        self.parent
            .as_ref()
            .and_then(Weak::upgrade)
            .and_then(|parent| parent.lookup(&key))
    }

    /// Look up a custom function, walking the parent chain.
    pub fn lookup_function(&self, name: &str) -> Option<Rc<CustomFunction>> {
        let key = name.to_uppercase();
        if let Some(found) = self.functions.borrow().get(&key) {
            return Some(Rc::clone(found));
        }
        self.parent
            .as_ref()
            .and_then(Weak::upgrade)
            .and_then(|parent| parent.lookup_function(&key))
    }

    /// Whether a parameter is defined anywhere in the chain.
    pub fn is_defined(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Locally defined parameter names, in insertion order.
    pub fn local_names(&self) -> Vec<String> {
        self.parameters.borrow().keys().cloned().collect()
    }
}
