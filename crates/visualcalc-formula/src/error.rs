//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
///
/// The `Display` text of each variant is what an element shows when its
/// calculation fails.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FormulaError {
    /// Content is neither a number nor a valid expression
    #[error("Parse error: {0}")]
    Parse(String),

    /// A referenced name is not an element (or not in the environment)
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// The element was reached again while it was still being resolved
    #[error("Circular dependency detected for element: {0}")]
    CircularDependency(String),

    /// Expression uses a function, attribute or name outside the allow-list
    #[error("Disallowed expression: {0}")]
    Disallowed(String),

    /// Division (or a zero base raised to a negative power) by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Math domain or range failure
    #[error("Evaluation error: {0}")]
    Evaluation(String),
}

impl FormulaError {
    /// Check if this is a circular dependency
    pub fn is_circular(&self) -> bool {
        matches!(self, FormulaError::CircularDependency(_))
    }
}
