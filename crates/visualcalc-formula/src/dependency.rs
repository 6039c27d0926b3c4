//! Dependency tracking for element formulas

use crate::ast::{Callee, FormulaExpr};
use crate::evaluator::parse_number;
use crate::parser::parse_formula;
use ahash::{AHashMap, AHashSet};
use std::collections::BTreeSet;
use visualcalc_core::{CONDITIONAL_FUNCTION, MATH_NAMESPACE};

/// Free names referenced by `content`
///
/// Every identifier counts, including the callee of a bare call (`abs(1)`
/// yields `abs`). Total: numeric content and content that fails to parse
/// both yield the empty set. `math` and `IF` are never included.
///
/// # Example
/// ```rust
/// use visualcalc_formula::dependencies;
///
/// let deps = dependencies("IF(E1 > 0, math.sqrt(E2), E1)");
/// assert_eq!(deps.into_iter().collect::<Vec<_>>(), vec!["E1", "E2"]);
/// assert!(dependencies("42").is_empty());
/// assert!(dependencies("E1 +").is_empty());
/// ```
pub fn dependencies(content: &str) -> BTreeSet<String> {
    if parse_number(content).is_some() {
        return BTreeSet::new();
    }

    match parse_formula(content) {
        Ok(ast) => references(&ast),
        Err(_) => BTreeSet::new(),
    }
}

/// Free names referenced by a parsed expression
pub fn references(expr: &FormulaExpr) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    collect_references(expr, &mut names);
    names
}

fn is_element_name(name: &str) -> bool {
    name != MATH_NAMESPACE && name != CONDITIONAL_FUNCTION
}

fn collect_references(expr: &FormulaExpr, names: &mut BTreeSet<String>) {
    match expr {
        FormulaExpr::Number(_) | FormulaExpr::Boolean(_) => {}
        FormulaExpr::Name(name) | FormulaExpr::Attribute { base: name, .. } => {
            if is_element_name(name) {
                names.insert(name.clone());
            }
        }
        FormulaExpr::BinaryOp { left, right, .. } => {
            collect_references(left, names);
            collect_references(right, names);
        }
        FormulaExpr::UnaryOp { operand, .. } => collect_references(operand, names),
        FormulaExpr::Compare { first, rest } => {
            collect_references(first, names);
            for (_, operand) in rest {
                collect_references(operand, names);
            }
        }
        FormulaExpr::Call { callee, args } => {
            let name = match callee {
                Callee::Name(name) | Callee::Attribute { base: name, .. } => name,
            };
            if is_element_name(name) {
                names.insert(name.clone());
            }
            for arg in args {
                collect_references(arg, names);
            }
        }
    }
}

/// Dependency graph between elements
///
/// Tracks which elements depend on which others, keyed by name.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Element → elements that depend on it (dependents)
    dependents: AHashMap<String, AHashSet<String>>,
    /// Element → elements it depends on (precedents)
    precedents: AHashMap<String, AHashSet<String>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency: `dependent` depends on `precedent`
    pub fn add_dependency(&mut self, precedent: &str, dependent: &str) {
        self.dependents
            .entry(precedent.to_string())
            .or_default()
            .insert(dependent.to_string());
        self.precedents
            .entry(dependent.to_string())
            .or_default()
            .insert(precedent.to_string());
    }

    /// Elements that depend directly on `name`, sorted
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        Self::sorted(self.dependents.get(name))
    }

    /// Elements `name` depends on directly, sorted
    pub fn precedents(&self, name: &str) -> Vec<&str> {
        Self::sorted(self.precedents.get(name))
    }

    fn sorted(set: Option<&AHashSet<String>>) -> Vec<&str> {
        let mut names: Vec<&str> = set
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
            .collect();
        names.sort_unstable();
        names
    }

    /// Whether `name` can reach itself through its precedents
    pub fn is_in_cycle(&self, name: &str) -> bool {
        let mut visited = AHashSet::new();
        let mut stack: Vec<&str> = self.precedents(name);

        while let Some(current) = stack.pop() {
            if current == name {
                return true;
            }
            if visited.insert(current) {
                stack.extend(self.precedents(current));
            }
        }

        false
    }

    /// Every element that lies on some cycle
    pub fn cycle_members(&self) -> BTreeSet<&str> {
        self.precedents
            .keys()
            .map(String::as_str)
            .filter(|name| self.is_in_cycle(name))
            .collect()
    }

    /// Whether `a` and `b` lie on one cycle together
    pub fn share_cycle(&self, a: &str, b: &str) -> bool {
        self.reaches(a, b) && self.reaches(b, a)
    }

    fn reaches(&self, from: &str, to: &str) -> bool {
        let mut visited = AHashSet::new();
        let mut stack = vec![from];

        while let Some(current) = stack.pop() {
            for next in self.precedents(current) {
                if next == to {
                    return true;
                }
                if visited.insert(next) {
                    stack.push(next);
                }
            }
        }

        false
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(content: &str) -> Vec<String> {
        dependencies(content).into_iter().collect()
    }

    #[test]
    fn test_dependencies() {
        assert_eq!(names("E1 + 2"), vec!["E1"]);
        assert_eq!(names("E2 * E1 - E2"), vec!["E1", "E2"]);
        assert_eq!(names("IF(E3, math.sqrt(E1), math.pi)"), vec!["E1", "E3"]);
        assert_eq!(names("total / count"), vec!["count", "total"]);
    }

    #[test]
    fn test_dependencies_exclude_reserved() {
        assert!(names("math.floor(2.5)").is_empty());
        assert!(names("IF(1, 2, 3)").is_empty());
        assert!(names("True + False").is_empty());
        assert!(names("math").is_empty());
    }

    #[test]
    fn test_dependencies_of_numbers_and_garbage() {
        assert!(names("5").is_empty());
        assert!(names(" -1.5e3 ").is_empty());
        assert!(names("").is_empty());
        assert!(names("E1 +").is_empty());
        assert!(names("E1 = E2").is_empty());
    }

    #[test]
    fn test_dependencies_callee_and_attribute_bases() {
        // Callees are free names like any other
        assert_eq!(names("foo(1)"), vec!["foo"]);
        assert_eq!(names("abs(-1)"), vec!["abs"]);
        assert_eq!(names("foo(E4)"), vec!["E4", "foo"]);
        assert_eq!(names("IF(E4, 1, 2)"), vec!["E4"]);
        // Other attribute bases are references (which evaluation then rejects)
        assert_eq!(names("E1.real"), vec!["E1"]);
        assert_eq!(names("E2.conjugate()"), vec!["E2"]);
    }

    #[test]
    fn test_add_dependency() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("E1", "E2");
        graph.add_dependency("E1", "E3");

        assert_eq!(graph.dependents("E1"), vec!["E2", "E3"]);
        assert_eq!(graph.precedents("E2"), vec!["E1"]);
        assert!(graph.precedents("E1").is_empty());
    }

    #[test]
    fn test_circular_reference() {
        let mut graph = DependencyGraph::new();

        // E1 -> E2 -> E3 -> E1, plus E4 hanging off the cycle
        graph.add_dependency("E1", "E2");
        graph.add_dependency("E2", "E3");
        graph.add_dependency("E3", "E1");
        graph.add_dependency("E3", "E4");

        assert!(graph.is_in_cycle("E1"));
        assert!(graph.is_in_cycle("E2"));
        assert!(graph.is_in_cycle("E3"));
        assert!(!graph.is_in_cycle("E4"));
        assert_eq!(
            graph.cycle_members().into_iter().collect::<Vec<_>>(),
            vec!["E1", "E2", "E3"]
        );
        assert!(graph.share_cycle("E1", "E3"));
        assert!(!graph.share_cycle("E3", "E4"));
    }

    #[test]
    fn test_self_reference() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("E1", "E1");
        assert!(graph.is_in_cycle("E1"));
        assert!(graph.share_cycle("E1", "E1"));

        graph.clear();
        assert!(!graph.is_in_cycle("E1"));
    }
}
