//! Math functions

use crate::error::{FormulaError, FormulaResult};

pub(crate) fn domain_error() -> FormulaError {
    FormulaError::Evaluation("math domain error".into())
}

pub(crate) fn range_error() -> FormulaError {
    FormulaError::Evaluation("math range error".into())
}

/// NaN from non-NaN input is a domain error; infinity from finite input
/// is a range error.
fn finish(result: f64, args: &[f64]) -> FormulaResult<f64> {
    if result.is_nan() && !args.iter().any(|a| a.is_nan()) {
        return Err(domain_error());
    }
    if result.is_infinite() && args.iter().all(|a| a.is_finite()) {
        return Err(range_error());
    }
    Ok(result)
}

fn unary(args: &[f64], f: fn(f64) -> f64) -> FormulaResult<f64> {
    finish(f(args[0]), args)
}

fn to_integral(x: f64, f: fn(f64) -> f64) -> FormulaResult<f64> {
    if x.is_nan() {
        return Err(FormulaError::Evaluation(
            "cannot convert float NaN to integer".into(),
        ));
    }
    if x.is_infinite() {
        return Err(FormulaError::Evaluation(
            "cannot convert float infinity to integer".into(),
        ));
    }
    Ok(f(x))
}

fn checked_log(x: f64, f: fn(f64) -> f64) -> FormulaResult<f64> {
    // log(0) is -inf in IEEE terms but undefined here
    if x <= 0.0 {
        return Err(domain_error());
    }
    Ok(f(x))
}

/// math.sqrt(x)
pub fn fn_sqrt(args: &[f64]) -> FormulaResult<f64> {
    unary(args, f64::sqrt)
}

/// math.exp(x)
pub fn fn_exp(args: &[f64]) -> FormulaResult<f64> {
    unary(args, f64::exp)
}

/// math.log(x) or math.log(x, base)
pub fn fn_log(args: &[f64]) -> FormulaResult<f64> {
    let ln = checked_log(args[0], f64::ln)?;
    match args.get(1) {
        None => Ok(ln),
        Some(&base) => {
            let ln_base = checked_log(base, f64::ln)?;
            if ln_base == 0.0 {
                return Err(FormulaError::DivisionByZero);
            }
            finish(ln / ln_base, args)
        }
    }
}

/// math.log10(x)
pub fn fn_log10(args: &[f64]) -> FormulaResult<f64> {
    checked_log(args[0], f64::log10)
}

/// math.log2(x)
pub fn fn_log2(args: &[f64]) -> FormulaResult<f64> {
    checked_log(args[0], f64::log2)
}

/// math.pow(x, y)
pub fn fn_pow(args: &[f64]) -> FormulaResult<f64> {
    let (base, exponent) = (args[0], args[1]);
    if base == 0.0 && exponent < 0.0 {
        return Err(domain_error());
    }
    finish(base.powf(exponent), args)
}

/// math.sin(x)
pub fn fn_sin(args: &[f64]) -> FormulaResult<f64> {
    unary(args, f64::sin)
}

/// math.cos(x)
pub fn fn_cos(args: &[f64]) -> FormulaResult<f64> {
    unary(args, f64::cos)
}

/// math.tan(x)
pub fn fn_tan(args: &[f64]) -> FormulaResult<f64> {
    unary(args, f64::tan)
}

/// math.asin(x)
pub fn fn_asin(args: &[f64]) -> FormulaResult<f64> {
    unary(args, f64::asin)
}

/// math.acos(x)
pub fn fn_acos(args: &[f64]) -> FormulaResult<f64> {
    unary(args, f64::acos)
}

/// math.atan(x)
pub fn fn_atan(args: &[f64]) -> FormulaResult<f64> {
    unary(args, f64::atan)
}

/// math.atan2(y, x)
pub fn fn_atan2(args: &[f64]) -> FormulaResult<f64> {
    finish(args[0].atan2(args[1]), args)
}

/// math.sinh(x)
pub fn fn_sinh(args: &[f64]) -> FormulaResult<f64> {
    unary(args, f64::sinh)
}

/// math.cosh(x)
pub fn fn_cosh(args: &[f64]) -> FormulaResult<f64> {
    unary(args, f64::cosh)
}

/// math.tanh(x)
pub fn fn_tanh(args: &[f64]) -> FormulaResult<f64> {
    unary(args, f64::tanh)
}

/// math.floor(x)
pub fn fn_floor(args: &[f64]) -> FormulaResult<f64> {
    to_integral(args[0], f64::floor)
}

/// math.ceil(x)
pub fn fn_ceil(args: &[f64]) -> FormulaResult<f64> {
    to_integral(args[0], f64::ceil)
}

/// math.trunc(x)
pub fn fn_trunc(args: &[f64]) -> FormulaResult<f64> {
    to_integral(args[0], f64::trunc)
}

/// math.abs(x) / math.fabs(x)
pub fn fn_abs(args: &[f64]) -> FormulaResult<f64> {
    Ok(args[0].abs())
}

/// math.hypot(x, y)
pub fn fn_hypot(args: &[f64]) -> FormulaResult<f64> {
    finish(args[0].hypot(args[1]), args)
}

/// math.degrees(x)
pub fn fn_degrees(args: &[f64]) -> FormulaResult<f64> {
    unary(args, f64::to_degrees)
}

/// math.radians(x)
pub fn fn_radians(args: &[f64]) -> FormulaResult<f64> {
    unary(args, f64::to_radians)
}

/// math.fmod(x, y)
pub fn fn_fmod(args: &[f64]) -> FormulaResult<f64> {
    finish(args[0] % args[1], args)
}
