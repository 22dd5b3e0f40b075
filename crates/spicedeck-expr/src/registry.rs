//! Dependency registry: index expressions by the parameters they reference.
//!
//! When a parameter changes, the caller re-evaluates only the expressions
//! registered under that name instead of re-parsing the whole netlist.

use std::collections::{BTreeSet, HashSet};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::EvaluableExpression;

/// Registration-ordered index from parameter name to dependent expressions.
#[derive(Debug, Default)]
pub struct DependencyRegistry {
    expressions: Vec<Rc<EvaluableExpression>>,
    by_name: IndexMap<String, Vec<usize>>,
    /// Dedupe key: (source text, sorted dependency names). Registering the
    /// same pair twice is a no-op.
    seen: HashSet<(String, Vec<String>)>,
}

impl DependencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an expression under every parameter name it depends on.
    pub fn register(&mut self, expression: Rc<EvaluableExpression>, depends_on: &BTreeSet<String>) {
        let key = (
            expression.text.clone(),
            depends_on.iter().map(|n| n.to_uppercase()).collect(),
        );
        if !self.seen.insert(key) {
            return;
        }

        let id = self.expressions.len();
        self.expressions.push(expression);
        for name in depends_on {
            self.by_name
                .entry(name.to_uppercase())
                .or_default()
                .push(id);
        }
    }

    /// Register an expression under its own free parameter names.
    pub fn register_parsed(&mut self, expression: Rc<EvaluableExpression>) {
        let free = expression.free.clone();
        self.register(expression, &free);
    }

    /// Every distinct expression depending on `name`, in registration order.
    pub fn dependents_of(&self, name: &str) -> impl Iterator<Item = &Rc<EvaluableExpression>> {
        self.by_name
            .get(&name.to_uppercase())
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|&id| &self.expressions[id])
    }

    /// Number of distinct registered expressions.
    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::parser::parse_expression;

    fn parsed(text: &str) -> Rc<EvaluableExpression> {
        Rc::new(parse_expression(text, &Dialect::default()).unwrap())
    }

    #[test]
    fn test_dependents_by_name() {
        let mut registry = DependencyRegistry::new();
        let e1 = parsed("x * 2");
        let e2 = parsed("x + y");
        registry.register_parsed(Rc::clone(&e1));
        registry.register_parsed(Rc::clone(&e2));

        let for_x: Vec<_> = registry.dependents_of("x").map(|e| e.text.as_str()).collect();
        assert_eq!(for_x, vec!["x * 2", "x + y"]);

        let for_y: Vec<_> = registry.dependents_of("y").map(|e| e.text.as_str()).collect();
        assert_eq!(for_y, vec!["x + y"]);

        assert_eq!(registry.dependents_of("z").count(), 0);
    }

    #[test]
    fn test_duplicate_registration_collapses() {
        let mut registry = DependencyRegistry::new();
        let expression = parsed("x * 2");
        registry.register_parsed(Rc::clone(&expression));
        registry.register_parsed(Rc::clone(&expression));
        registry.register_parsed(parsed("x * 2"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.dependents_of("x").count(), 1);
    }

    #[test]
    fn test_same_text_different_deps_is_distinct() {
        let mut registry = DependencyRegistry::new();
        let expression = parsed("x * 2");
        registry.register_parsed(Rc::clone(&expression));
        // Same text, explicitly wider dependency set
        let wider: BTreeSet<String> = ["X".to_string(), "K".to_string()].into();
        registry.register(Rc::clone(&expression), &wider);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.dependents_of("x").count(), 2);
        assert_eq!(registry.dependents_of("k").count(), 1);
    }

    #[test]
    fn test_registration_order_preserved() {
        let mut registry = DependencyRegistry::new();
        registry.register_parsed(parsed("a + 1"));
        registry.register_parsed(parsed("a + 2"));
        registry.register_parsed(parsed("a + 3"));

        let order: Vec<_> = registry.dependents_of("A").map(|e| e.text.as_str()).collect();
        assert_eq!(order, vec!["a + 1", "a + 2", "a + 3"]);
    }

    #[test]
    fn test_name_lookup_is_case_insensitive() {
        let mut registry = DependencyRegistry::new();
        registry.register_parsed(parsed("Rload / 2"));
        assert_eq!(registry.dependents_of("rload").count(), 1);
        assert_eq!(registry.dependents_of("RLOAD").count(), 1);
    }
}
