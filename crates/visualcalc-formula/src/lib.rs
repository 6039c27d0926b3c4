//! # visualcalc-formula
//!
//! Formula parser and evaluator for visualcalc.
//!
//! This crate provides:
//! - Formula parsing (text → AST) over a small sandboxed grammar
//! - Formula evaluation (AST → value) against an explicit environment
//! - The allow-listed `math.*` functions and constants
//! - Dependency extraction for element formulas
//!
//! ## Example
//!
//! ```rust
//! use visualcalc_formula::{dependencies, evaluate_content, Environment};
//! use visualcalc_core::CalcValue;
//!
//! let mut env = Environment::new();
//! env.insert("E1".to_string(), CalcValue::Number(9.0));
//!
//! let formula = "math.sqrt(E1) ^ 2";
//! assert_eq!(dependencies(formula).len(), 1);
//! assert_eq!(evaluate_content(formula, &env).unwrap(), CalcValue::Number(9.0));
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;

pub use ast::{BinaryOperator, Callee, CompareOperator, FormulaExpr, UnaryOperator};
pub use dependency::{dependencies, references, DependencyGraph};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, evaluate_content, parse_number, Environment, EvaluationContext};
pub use functions::MathLibrary;
pub use parser::parse_formula;
