//! Result formatting
//!
//! Converts computed values into display strings under a [`FormatSetting`].

use crate::element::CalcValue;
use std::fmt;
use std::str::FromStr;

/// Numeric display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FormatMode {
    /// Shortest round-trip representation (default)
    #[default]
    Plain,
    /// Fixed-point with a set number of decimals
    Fixed,
    /// Normalized scientific notation
    Scientific,
}

impl FormatMode {
    /// Lowercase name used on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatMode::Plain => "plain",
            FormatMode::Fixed => "fixed",
            FormatMode::Scientific => "scientific",
        }
    }
}

impl fmt::Display for FormatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "plain" => Ok(FormatMode::Plain),
            "fixed" => Ok(FormatMode::Fixed),
            "scientific" | "sci" => Ok(FormatMode::Scientific),
            other => Err(format!(
                "unknown format mode '{}' (expected plain, fixed or scientific)",
                other
            )),
        }
    }
}

/// Display setting shared by every element
///
/// Owned by the caller and passed into formatting; nothing in the engine
/// keeps a copy between passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormatSetting {
    /// Display mode
    pub mode: FormatMode,
    /// Digits after the decimal point (Fixed) or in the mantissa (Scientific)
    pub decimals: usize,
}

impl FormatSetting {
    /// Create a new setting
    pub fn new(mode: FormatMode, decimals: usize) -> Self {
        Self { mode, decimals }
    }
}

impl Default for FormatSetting {
    fn default() -> Self {
        Self {
            mode: FormatMode::Plain,
            decimals: 2,
        }
    }
}

/// Format a raw result for display
///
/// Returns `None` for "no value" so the caller keeps the error message it
/// already stored.
pub fn format_result(raw: Option<&CalcValue>, setting: &FormatSetting) -> Option<String> {
    raw.map(|value| format_value(value, setting.mode, setting.decimals))
}

/// Format a value
///
/// # Example
/// ```rust
/// use visualcalc_core::{format_value, CalcValue, FormatMode};
///
/// let pi = CalcValue::Number(3.14159);
/// assert_eq!(format_value(&pi, FormatMode::Fixed, 2), "3.14");
/// assert_eq!(format_value(&pi, FormatMode::Scientific, 2), "3.14e+00");
/// assert_eq!(format_value(&pi, FormatMode::Plain, 2), "3.14159");
/// ```
pub fn format_value(value: &CalcValue, mode: FormatMode, decimals: usize) -> String {
    let n = match value {
        CalcValue::Boolean(true) => return "True".to_string(),
        CalcValue::Boolean(false) => return "False".to_string(),
        CalcValue::Number(n) => *n,
    };

    if !n.is_finite() {
        return format_non_finite(n);
    }

    match mode {
        FormatMode::Plain => format_plain(n),
        FormatMode::Fixed => format!("{:.*}", decimals, n),
        FormatMode::Scientific => {
            let formatted = format!("{:.*e}", decimals, n);
            normalize_exponent(&formatted)
        }
    }
}

fn format_non_finite(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n > 0.0 {
        "inf".to_string()
    } else {
        "-inf".to_string()
    }
}

/// Shortest representation that round-trips, always showing a decimal point
/// or an exponent. Switches to exponent form outside `1e-4 <= |n| < 1e16`.
fn format_plain(n: f64) -> String {
    if n == 0.0 {
        return if n.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let shortest = format!("{:e}", n);
    let exponent = match shortest.split_once('e').map(|(_, e)| e.parse::<i32>()) {
        Some(Ok(exp)) => exp,
        _ => return format!("{}", n),
    };

    if (-4..16).contains(&exponent) {
        let s = format!("{}", n);
        if s.contains('.') {
            s
        } else {
            format!("{}.0", s)
        }
    } else {
        normalize_exponent(&shortest)
    }
}

/// Rewrite Rust's `1.5e-5` exponent into `1.5e-05`
fn normalize_exponent(formatted: &str) -> String {
    let Some((mantissa, exponent)) = formatted.split_once('e') else {
        return formatted.to_string();
    };
    match exponent.parse::<i32>() {
        Ok(exp) => {
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.unsigned_abs())
        }
        Err(_) => formatted.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn num(n: f64, mode: FormatMode, decimals: usize) -> String {
        format_value(&CalcValue::Number(n), mode, decimals)
    }

    #[test]
    fn test_plain() {
        assert_eq!(num(5.0, FormatMode::Plain, 2), "5.0");
        assert_eq!(num(3.14159, FormatMode::Plain, 0), "3.14159");
        assert_eq!(num(-7.25, FormatMode::Plain, 2), "-7.25");
        assert_eq!(num(0.0001, FormatMode::Plain, 2), "0.0001");
        assert_eq!(num(0.00001, FormatMode::Plain, 2), "1e-05");
        assert_eq!(num(1.5e-7, FormatMode::Plain, 2), "1.5e-07");
        assert_eq!(num(1e15, FormatMode::Plain, 2), "1000000000000000.0");
        assert_eq!(num(1e16, FormatMode::Plain, 2), "1e+16");
        assert_eq!(num(0.1 + 0.2, FormatMode::Plain, 2), "0.30000000000000004");
        assert_eq!(num(0.0, FormatMode::Plain, 2), "0.0");
    }

    #[test]
    fn test_fixed() {
        assert_eq!(num(3.14159, FormatMode::Fixed, 2), "3.14");
        assert_eq!(num(2.0, FormatMode::Fixed, 3), "2.000");
        assert_eq!(num(2.6, FormatMode::Fixed, 0), "3");
        assert_eq!(num(-1.005, FormatMode::Fixed, 1), "-1.0");
    }

    #[test]
    fn test_scientific() {
        assert_eq!(num(3.14159, FormatMode::Scientific, 2), "3.14e+00");
        assert_eq!(num(12346.0, FormatMode::Scientific, 3), "1.235e+04");
        assert_eq!(num(0.00042, FormatMode::Scientific, 1), "4.2e-04");
        assert_eq!(num(1e100, FormatMode::Scientific, 0), "1e+100");
    }

    #[test]
    fn test_booleans_ignore_mode() {
        for mode in [FormatMode::Plain, FormatMode::Fixed, FormatMode::Scientific] {
            assert_eq!(format_value(&CalcValue::Boolean(true), mode, 4), "True");
            assert_eq!(format_value(&CalcValue::Boolean(false), mode, 4), "False");
        }
    }

    #[test]
    fn test_non_finite() {
        assert_eq!(num(f64::INFINITY, FormatMode::Fixed, 2), "inf");
        assert_eq!(num(f64::NEG_INFINITY, FormatMode::Scientific, 2), "-inf");
        assert_eq!(num(f64::NAN, FormatMode::Plain, 2), "nan");
    }

    #[test]
    fn test_no_value_is_left_alone() {
        let setting = FormatSetting::new(FormatMode::Fixed, 2);
        assert_eq!(format_result(None, &setting), None);
        assert_eq!(
            format_result(Some(&CalcValue::Number(1.0)), &setting),
            Some("1.00".to_string())
        );
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("Fixed".parse::<FormatMode>(), Ok(FormatMode::Fixed));
        assert_eq!("sci".parse::<FormatMode>(), Ok(FormatMode::Scientific));
        assert!("engineering".parse::<FormatMode>().is_err());
    }
}
