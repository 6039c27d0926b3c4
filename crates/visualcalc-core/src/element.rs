//! Element and value types

use std::fmt;

/// A computed element value
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum CalcValue {
    /// Numeric value (all numbers are f64)
    Number(f64),
    /// Boolean value, produced by comparisons
    Boolean(bool),
}

impl CalcValue {
    /// Convert to number for arithmetic (`True` is 1, `False` is 0)
    pub fn as_number(&self) -> f64 {
        match self {
            CalcValue::Number(n) => *n,
            CalcValue::Boolean(true) => 1.0,
            CalcValue::Boolean(false) => 0.0,
        }
    }

    /// Truthiness used by conditionals: any nonzero number is true
    pub fn is_truthy(&self) -> bool {
        match self {
            CalcValue::Number(n) => *n != 0.0,
            CalcValue::Boolean(b) => *b,
        }
    }

    /// Check if this is a boolean
    pub fn is_boolean(&self) -> bool {
        matches!(self, CalcValue::Boolean(_))
    }
}

impl From<f64> for CalcValue {
    fn from(n: f64) -> Self {
        CalcValue::Number(n)
    }
}

impl From<bool> for CalcValue {
    fn from(b: bool) -> Self {
        CalcValue::Boolean(b)
    }
}

impl fmt::Display for CalcValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::format::format_value(self, crate::FormatMode::Plain, 0))
    }
}

/// A named cell on the canvas
///
/// Holds raw content text (a literal number or a formula) plus the result of
/// the most recent recalculation pass. `raw_result` is `None` when the last
/// pass failed for this element; `display_result` then holds the error message.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Element {
    name: String,
    content: String,
    #[cfg_attr(feature = "serde", serde(default))]
    raw_result: Option<CalcValue>,
    #[cfg_attr(feature = "serde", serde(default))]
    display_result: String,
}

impl Element {
    /// Content given to freshly added elements
    pub const DEFAULT_CONTENT: &'static str = "0";

    /// Create an element that has not been calculated yet
    pub fn new<N: Into<String>, C: Into<String>>(name: N, content: C) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            raw_result: None,
            display_result: String::new(),
        }
    }

    /// Element name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw content text
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the content text. Results stay stale until the next pass.
    pub fn set_content<C: Into<String>>(&mut self, content: C) {
        self.content = content.into();
    }

    /// Value from the last pass, `None` if it failed
    pub fn raw_result(&self) -> Option<CalcValue> {
        self.raw_result
    }

    /// Formatted value or error message from the last pass
    pub fn display_result(&self) -> &str {
        &self.display_result
    }

    /// Store a successful result
    pub fn set_value(&mut self, value: CalcValue) {
        self.raw_result = Some(value);
    }

    /// Store a failed result, keeping the message as the display string
    pub fn set_error<S: Into<String>>(&mut self, message: S) {
        self.raw_result = None;
        self.display_result = message.into();
    }

    /// Overwrite the display string
    pub fn set_display<S: Into<String>>(&mut self, display: S) {
        self.display_result = display.into();
    }

    /// Check if the last pass failed for this element
    pub fn is_error(&self) -> bool {
        self.raw_result.is_none() && !self.display_result.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_element() {
        let element = Element::new("E1", Element::DEFAULT_CONTENT);
        assert_eq!(element.name(), "E1");
        assert_eq!(element.content(), "0");
        assert_eq!(element.raw_result(), None);
        assert_eq!(element.display_result(), "");
        assert!(!element.is_error());
    }

    #[test]
    fn test_error_clears_value() {
        let mut element = Element::new("E1", "1/0");
        element.set_value(CalcValue::Number(1.0));
        element.set_error("Division by zero");
        assert_eq!(element.raw_result(), None);
        assert_eq!(element.display_result(), "Division by zero");
        assert!(element.is_error());
    }

    #[test]
    fn test_value_coercion() {
        assert_eq!(CalcValue::Boolean(true).as_number(), 1.0);
        assert_eq!(CalcValue::Boolean(false).as_number(), 0.0);
        assert!(CalcValue::Number(-0.5).is_truthy());
        assert!(!CalcValue::Number(0.0).is_truthy());
        assert!(CalcValue::Number(f64::NAN).is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(CalcValue::Number(7.0).to_string(), "7.0");
        assert_eq!(CalcValue::Boolean(false).to_string(), "False");
    }
}
