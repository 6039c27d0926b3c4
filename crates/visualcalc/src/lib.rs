//! # visualcalc
//!
//! Formula engine for a canvas of named elements.
//!
//! Each element holds either a number or a formula that references other
//! elements by name. A recalculation pass resolves every element in
//! dependency order, detects circular references and formats the results
//! for display.
//!
//! ## Features
//!
//! - Sandboxed formula language: arithmetic, `^` exponentiation,
//!   comparisons, `IF(cond, a, b)` and allow-listed `math.*` calls
//! - Memoized full recalculation with per-element error messages
//! - Plain, fixed-point and scientific display formatting
//! - Dependency arrows for drawing connections between elements
//!
//! ## Example
//!
//! ```rust
//! use visualcalc::prelude::*;
//!
//! let mut registry = ElementRegistry::new();
//! let first = registry.add_element();
//! registry.set_content(&first, "2 ^ 3").unwrap();
//! registry.insert("E2", "math.sqrt(E1) * 2").unwrap();
//! registry.insert("E3", "E3 + 1").unwrap();
//!
//! let setting = FormatSetting::new(FormatMode::Fixed, 3);
//! registry.recalculate(&setting);
//!
//! assert_eq!(registry.get("E1").unwrap().display_result(), "8.000");
//! assert_eq!(registry.get("E2").unwrap().display_result(), "5.657");
//! assert_eq!(
//!     registry.get("E3").unwrap().display_result(),
//!     "Circular dependency detected for element: E3"
//! );
//! ```

pub mod calculation;
pub mod prelude;

// Re-export calculation types
pub use calculation::{
    connections, dependency_graph, recalculate_all, reformat_all, CalculationSession,
    CalculationStats, Connection, RegistryCalculationExt,
};

// Re-export core types
pub use visualcalc_core::{
    format_result, format_value, validate_name, CalcValue, Element, ElementRegistry, Error,
    FormatMode, FormatSetting, Result, CONDITIONAL_FUNCTION, ELEMENT_NAME_PREFIX, MATH_NAMESPACE,
    RESERVED_NAMES,
};

// Re-export formula types
pub use visualcalc_formula::{
    dependencies, evaluate, evaluate_content, parse_formula, parse_number, references,
    DependencyGraph, Environment, EvaluationContext, FormulaError, FormulaExpr, FormulaResult,
    MathLibrary,
};
