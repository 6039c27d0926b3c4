//! Error types for visualcalc-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when editing an element registry
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Name is not usable as a formula identifier
    #[error("Invalid element name: {0}")]
    InvalidName(String),

    /// Another element already uses this name
    #[error("Element name already exists: {0}")]
    DuplicateName(String),

    /// No element with this name
    #[error("Element not found: {0}")]
    ElementNotFound(String),
}
