//! Prelude module - common imports for visualcalc users
//!
//! ```rust
//! use visualcalc::prelude::*;
//! ```

pub use crate::{
    // Calculation types
    CalculationStats,
    Connection,
    // Extension traits
    RegistryCalculationExt,

    // Element types
    CalcValue,
    Element,
    ElementRegistry,

    // Formatting
    FormatMode,
    FormatSetting,

    // Error types
    Error,
    FormulaError,
    Result,
};
