//! Registry calculation engine
//!
//! Full recalculation of every element with memoized depth-first resolution
//! and circular reference detection. Failures stay local to the element that
//! hit them: its display result becomes the error message and the pass
//! carries on.
//!
//! # Example
//!
//! ```rust
//! use visualcalc::prelude::*;
//!
//! let mut registry = ElementRegistry::new();
//! registry.insert("E1", "5").unwrap();
//! registry.insert("E2", "E1 + 2").unwrap();
//!
//! let stats = registry.recalculate(&FormatSetting::default());
//! assert_eq!(stats.calculated, 2);
//! assert_eq!(registry.get("E2").unwrap().display_result(), "7.0");
//! ```

use crate::{
    evaluate, format_result, parse_formula, parse_number, references, CalcValue, DependencyGraph,
    ElementRegistry, Environment, EvaluationContext, FormatSetting, FormulaError, FormulaResult,
};
use ahash::{AHashMap, AHashSet};

/// Longest chain of elements resolved through one another in a single
/// resolution; deeper chains fail with an evaluation error
pub const MAX_CHAIN_DEPTH: usize = 512;

/// Statistics from a calculation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationStats {
    /// Number of elements in the registry
    pub elements: usize,
    /// Number of elements that produced a value
    pub calculated: usize,
    /// Number of elements whose calculation failed
    pub errors: usize,
    /// Number of failures that were circular dependencies
    pub circular_references: usize,
}

/// A dependency arrow: `target`'s formula references `source`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Connection {
    pub source: String,
    pub target: String,
}

/// Extension trait for ElementRegistry to add calculation methods
pub trait RegistryCalculationExt {
    /// Recalculate every element and format the results
    fn recalculate(&mut self, setting: &FormatSetting) -> CalculationStats;

    /// Re-format every stored result without recalculating
    fn reformat(&mut self, setting: &FormatSetting);

    /// Dependency arrows between elements
    fn connections(&self) -> Vec<Connection>;

    /// Dependency graph between elements
    fn dependency_graph(&self) -> DependencyGraph;
}

impl RegistryCalculationExt for ElementRegistry {
    fn recalculate(&mut self, setting: &FormatSetting) -> CalculationStats {
        recalculate_all(self, setting)
    }

    fn reformat(&mut self, setting: &FormatSetting) {
        reformat_all(self, setting)
    }

    fn connections(&self) -> Vec<Connection> {
        connections(self)
    }

    fn dependency_graph(&self) -> DependencyGraph {
        dependency_graph(self)
    }
}

/// State of one recalculation pass
///
/// `computed` memoizes successful results; `in_progress` holds the chain of
/// elements currently being resolved.
pub struct CalculationSession<'r> {
    registry: &'r ElementRegistry,
    computed: AHashMap<String, CalcValue>,
    in_progress: AHashSet<String>,
}

impl<'r> CalculationSession<'r> {
    /// Start a pass over `registry`
    pub fn new(registry: &'r ElementRegistry) -> Self {
        Self {
            registry,
            computed: AHashMap::with_capacity(registry.len()),
            in_progress: AHashSet::new(),
        }
    }

    /// Value already resolved for `name` in this pass
    pub fn computed(&self, name: &str) -> Option<CalcValue> {
        self.computed.get(name).copied()
    }

    /// Resolve `name` as the root of a new resolution chain
    pub fn evaluate_element(&mut self, name: &str) -> FormulaResult<CalcValue> {
        self.in_progress.clear();
        self.resolve(name)
    }

    fn resolve(&mut self, name: &str) -> FormulaResult<CalcValue> {
        if let Some(value) = self.computed(name) {
            return Ok(value);
        }
        if self.in_progress.contains(name) {
            return Err(FormulaError::CircularDependency(name.to_string()));
        }
        // `in_progress` holds exactly the chain above this element
        if self.in_progress.len() >= MAX_CHAIN_DEPTH {
            return Err(FormulaError::Evaluation(format!(
                "dependency chain deeper than {} elements",
                MAX_CHAIN_DEPTH
            )));
        }

        let registry = self.registry;
        let element = registry
            .get(name)
            .ok_or_else(|| FormulaError::UnknownVariable(name.to_string()))?;

        tracing::trace!(element = name, content = element.content(), "resolving");

        self.in_progress.insert(name.to_string());
        let outcome = self.evaluate_content(element.content());
        self.in_progress.remove(name);

        if let Ok(value) = outcome {
            self.computed.insert(name.to_string(), value);
        }
        outcome
    }

    fn evaluate_content(&mut self, content: &str) -> FormulaResult<CalcValue> {
        if let Some(n) = parse_number(content) {
            return Ok(CalcValue::Number(n));
        }

        let ast = parse_formula(content)?;
        let deps = references(&ast);

        if let Some(missing) = deps.iter().find(|dep| !self.registry.contains(dep)) {
            return Err(FormulaError::UnknownVariable(missing.clone()));
        }

        let mut env = Environment::with_capacity(deps.len());
        for dep in deps {
            let value = self.resolve(&dep)?;
            env.insert(dep, value);
        }

        evaluate(&ast, &EvaluationContext::new(&env))
    }
}

/// Recalculate every element in `registry`
///
/// Each element gets either a value and its formatted display string, or
/// no value and the error message as display string.
pub fn recalculate_all(registry: &mut ElementRegistry, setting: &FormatSetting) -> CalculationStats {
    let mut stats = CalculationStats {
        elements: registry.len(),
        ..Default::default()
    };

    // Phase 1: resolve every element against the unchanged registry
    let outcomes: Vec<FormulaResult<CalcValue>> = {
        let mut session = CalculationSession::new(registry);
        registry
            .names()
            .map(|name| match session.computed(name) {
                Some(value) => Ok(value),
                None => session.evaluate_element(name),
            })
            .collect()
    };

    // Phase 2: store results
    for (element, outcome) in registry.iter_mut().zip(outcomes) {
        match outcome {
            Ok(value) => {
                element.set_value(value);
                stats.calculated += 1;
            }
            Err(e) => {
                tracing::debug!(element = element.name(), error = %e, "calculation failed");
                if e.is_circular() {
                    stats.circular_references += 1;
                }
                element.set_error(e.to_string());
                stats.errors += 1;
            }
        }
    }

    // Phase 3: format
    reformat_all(registry, setting);

    tracing::debug!(
        elements = stats.elements,
        calculated = stats.calculated,
        errors = stats.errors,
        circular = stats.circular_references,
        "recalculation finished"
    );

    stats
}

/// Apply `setting` to every stored result
///
/// Elements without a value keep their error message.
pub fn reformat_all(registry: &mut ElementRegistry, setting: &FormatSetting) {
    for element in registry.iter_mut() {
        if let Some(display) = format_result(element.raw_result().as_ref(), setting) {
            element.set_display(display);
        }
    }
}

/// Dependency arrows, in registry order then dependency order
///
/// References to names that are not elements produce no arrow.
pub fn connections(registry: &ElementRegistry) -> Vec<Connection> {
    let mut result = Vec::new();

    for element in registry.iter() {
        for dep in crate::dependencies(element.content()) {
            if registry.contains(&dep) {
                result.push(Connection {
                    source: dep,
                    target: element.name().to_string(),
                });
            }
        }
    }

    result
}

/// Build the dependency graph of `registry`
pub fn dependency_graph(registry: &ElementRegistry) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for connection in connections(registry) {
        graph.add_dependency(&connection.source, &connection.target);
    }
    graph
}
