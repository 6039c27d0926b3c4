//! # visualcalc-core
//!
//! Core data structures for the visualcalc formula canvas.
//!
//! This crate provides the fundamental types used throughout visualcalc:
//! - [`Element`] and [`CalcValue`] - A named cell and its computed value
//! - [`ElementRegistry`] - The canvas's name → element collection
//! - [`FormatSetting`] and [`format_value`] - Result display formatting
//!
//! ## Example
//!
//! ```rust
//! use visualcalc_core::ElementRegistry;
//!
//! let mut registry = ElementRegistry::new();
//! let name = registry.add_element();
//! registry.set_content(&name, "math.sqrt(16)").unwrap();
//! assert_eq!(registry.get("E1").unwrap().content(), "math.sqrt(16)");
//! ```

pub mod element;
pub mod error;
pub mod format;
pub mod registry;

// Re-exports for convenience
pub use element::{CalcValue, Element};
pub use error::{Error, Result};
pub use format::{format_result, format_value, FormatMode, FormatSetting};
pub use registry::{validate_name, ElementRegistry};

/// Prefix of generated element names (`E1`, `E2`, ...)
pub const ELEMENT_NAME_PREFIX: &str = "E";

/// Namespace for math library calls in formulas
pub const MATH_NAMESPACE: &str = "math";

/// Name of the conditional function in formulas
pub const CONDITIONAL_FUNCTION: &str = "IF";

/// Names formulas reserve; elements cannot use them
pub const RESERVED_NAMES: &[&str] = &[MATH_NAMESPACE, CONDITIONAL_FUNCTION, "True", "False"];
