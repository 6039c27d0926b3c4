//! Formula evaluator
//!
//! Evaluates formula ASTs against an explicit variable environment and the
//! fixed `math` library. Names, attributes and calls outside the allow-list
//! fail with [`FormulaError::Disallowed`].

use crate::ast::{BinaryOperator, Callee, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::MathLibrary;
use crate::parser::parse_formula;
use ahash::AHashMap;
use visualcalc_core::{CalcValue, CONDITIONAL_FUNCTION, MATH_NAMESPACE};

/// Resolved values of the names a formula references
pub type Environment = AHashMap<String, CalcValue>;

/// Context for formula evaluation
///
/// Built per call; holds no state of its own.
pub struct EvaluationContext<'a> {
    variables: &'a Environment,
    library: MathLibrary,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context over `variables`
    pub fn new(variables: &'a Environment) -> Self {
        Self {
            variables,
            library: MathLibrary::standard(),
        }
    }

    /// Look up a variable
    pub fn variable(&self, name: &str) -> FormulaResult<CalcValue> {
        self.variables
            .get(name)
            .copied()
            .ok_or_else(|| FormulaError::UnknownVariable(name.to_string()))
    }
}

/// Parse `content` as a plain number, the way element content is tried first
///
/// Single `_` separators between digits are accepted (`1_000`).
pub fn parse_number(content: &str) -> Option<f64> {
    let text = content.trim();
    if !text.contains('_') {
        return text.parse::<f64>().ok();
    }

    let bytes = text.as_bytes();
    let separators_valid = bytes.iter().enumerate().all(|(i, &b)| {
        b != b'_'
            || (i > 0
                && bytes[i - 1].is_ascii_digit()
                && bytes.get(i + 1).map_or(false, |next| next.is_ascii_digit()))
    });
    if !separators_valid {
        return None;
    }

    text.replace('_', "").parse::<f64>().ok()
}

/// Evaluate element content
///
/// Numeric text is returned as is; anything else is parsed and evaluated as
/// a formula.
///
/// # Example
/// ```rust
/// use visualcalc_formula::{evaluate_content, Environment};
/// use visualcalc_core::CalcValue;
///
/// let mut env = Environment::new();
/// env.insert("E1".to_string(), CalcValue::Number(5.0));
/// assert_eq!(evaluate_content("E1 + 2", &env).unwrap(), CalcValue::Number(7.0));
/// assert_eq!(evaluate_content("2 ^ 3", &env).unwrap(), CalcValue::Number(8.0));
/// ```
pub fn evaluate_content(content: &str, env: &Environment) -> FormulaResult<CalcValue> {
    if let Some(n) = parse_number(content) {
        return Ok(CalcValue::Number(n));
    }

    let ast = parse_formula(content)?;
    evaluate(&ast, &EvaluationContext::new(env))
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<CalcValue> {
    match expr {
        // === Literals ===
        FormulaExpr::Number(n) => Ok(CalcValue::Number(*n)),
        FormulaExpr::Boolean(b) => Ok(CalcValue::Boolean(*b)),

        // === References ===
        FormulaExpr::Name(name) => {
            if is_reserved(name) {
                return Err(FormulaError::Disallowed(format!(
                    "'{}' cannot be used as a value",
                    name
                )));
            }
            ctx.variable(name)
        }

        FormulaExpr::Attribute { base, attr } => evaluate_attribute(base, attr, ctx),

        // === Operators ===
        FormulaExpr::BinaryOp { op, left, right } => {
            let left = evaluate(left, ctx)?.as_number();
            let right = evaluate(right, ctx)?.as_number();
            apply_binary(*op, left, right).map(CalcValue::Number)
        }

        FormulaExpr::UnaryOp { op, operand } => {
            let value = evaluate(operand, ctx)?.as_number();
            Ok(CalcValue::Number(match op {
                UnaryOperator::Negate => -value,
                UnaryOperator::Plus => value,
            }))
        }

        FormulaExpr::Compare { first, rest } => {
            let mut left = evaluate(first, ctx)?.as_number();
            for (op, operand) in rest {
                let right = evaluate(operand, ctx)?.as_number();
                if !op.apply(left, right) {
                    return Ok(CalcValue::Boolean(false));
                }
                left = right;
            }
            Ok(CalcValue::Boolean(true))
        }

        // === Functions ===
        FormulaExpr::Call { callee, args } => evaluate_call(callee, args, ctx),
    }
}

fn is_reserved(name: &str) -> bool {
    name == MATH_NAMESPACE || name == CONDITIONAL_FUNCTION
}

fn apply_binary(op: BinaryOperator, left: f64, right: f64) -> FormulaResult<f64> {
    match op {
        BinaryOperator::Add => Ok(left + right),
        BinaryOperator::Subtract => Ok(left - right),
        BinaryOperator::Multiply => Ok(left * right),
        BinaryOperator::Divide => {
            if right == 0.0 {
                return Err(FormulaError::DivisionByZero);
            }
            Ok(left / right)
        }
        BinaryOperator::Power => power(left, right),
    }
}

/// `base ^ exponent`
fn power(base: f64, exponent: f64) -> FormulaResult<f64> {
    if base == 0.0 && exponent < 0.0 {
        return Err(FormulaError::DivisionByZero);
    }
    if base < 0.0 && exponent.is_finite() && exponent.fract() != 0.0 {
        return Err(FormulaError::Evaluation(
            "negative number cannot be raised to a fractional power".into(),
        ));
    }

    let result = base.powf(exponent);
    if result.is_infinite() && base.is_finite() && exponent.is_finite() {
        return Err(FormulaError::Evaluation(
            "numerical result out of range".into(),
        ));
    }
    Ok(result)
}

fn evaluate_attribute(base: &str, attr: &str, ctx: &EvaluationContext) -> FormulaResult<CalcValue> {
    if base != MATH_NAMESPACE {
        return Err(FormulaError::Disallowed(format!(
            "attribute access '{}.{}' is not allowed",
            base, attr
        )));
    }

    if let Some(value) = ctx.library.constant(attr) {
        return Ok(CalcValue::Number(value));
    }
    if ctx.library.function(attr).is_some() {
        return Err(FormulaError::Disallowed(format!(
            "'{}.{}' must be called",
            base, attr
        )));
    }
    Err(FormulaError::Disallowed(format!(
        "'{}.{}' is not an allowed math name",
        base, attr
    )))
}

fn evaluate_call(
    callee: &Callee,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<CalcValue> {
    match callee {
        Callee::Name(name) if name == CONDITIONAL_FUNCTION => evaluate_if(args, ctx),
        Callee::Name(name) => Err(FormulaError::Disallowed(format!(
            "function '{}' is not allowed",
            name
        ))),
        Callee::Attribute { base, attr } if base == MATH_NAMESPACE => {
            evaluate_math_call(attr, args, ctx)
        }
        Callee::Attribute { .. } => Err(FormulaError::Disallowed(format!(
            "call to '{}' is not allowed",
            callee.display_name()
        ))),
    }
}

/// `IF(condition, then, else)`; all three arguments are evaluated
fn evaluate_if(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<CalcValue> {
    if args.len() != 3 {
        return Err(FormulaError::ArgumentCount {
            function: CONDITIONAL_FUNCTION.to_string(),
            expected: "3".to_string(),
            actual: args.len(),
        });
    }

    let condition = evaluate(&args[0], ctx)?;
    let if_true = evaluate(&args[1], ctx)?;
    let if_false = evaluate(&args[2], ctx)?;

    Ok(if condition.is_truthy() {
        if_true
    } else {
        if_false
    })
}

fn evaluate_math_call(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<CalcValue> {
    let func_def = match ctx.library.function(name) {
        Some(def) => def,
        None if ctx.library.constant(name).is_some() => {
            return Err(FormulaError::Disallowed(format!(
                "'{}.{}' is a constant, not a function",
                MATH_NAMESPACE, name
            )))
        }
        None => {
            return Err(FormulaError::Disallowed(format!(
                "'{}.{}' is not an allowed math function",
                MATH_NAMESPACE, name
            )))
        }
    };

    if args.len() < func_def.min_args || args.len() > func_def.max_args {
        return Err(FormulaError::ArgumentCount {
            function: format!("{}.{}", MATH_NAMESPACE, func_def.name),
            expected: func_def.expected_args(),
            actual: args.len(),
        });
    }

    let values = args
        .iter()
        .map(|arg| evaluate(arg, ctx).map(|v| v.as_number()))
        .collect::<FormulaResult<Vec<f64>>>()?;

    (func_def.implementation)(&values).map(CalcValue::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn eval(content: &str) -> FormulaResult<CalcValue> {
        evaluate_content(content, &Environment::new())
    }

    fn eval_with(content: &str, vars: &[(&str, f64)]) -> FormulaResult<CalcValue> {
        let env: Environment = vars
            .iter()
            .map(|(name, value)| (name.to_string(), CalcValue::Number(*value)))
            .collect();
        evaluate_content(content, &env)
    }

    fn number(n: f64) -> FormulaResult<CalcValue> {
        Ok(CalcValue::Number(n))
    }

    #[test]
    fn test_numeric_content_short_circuits() {
        assert_eq!(eval("5"), number(5.0));
        assert_eq!(eval("  -2.5e3 "), number(-2500.0));
        assert_eq!(eval("inf"), number(f64::INFINITY));
    }

    #[test]
    fn test_parse_number_separators() {
        assert_eq!(parse_number("1_000"), Some(1000.0));
        assert_eq!(parse_number(" 1_000.000_5 "), Some(1000.0005));
        assert_eq!(parse_number("2e1_0"), Some(2e10));
        assert_eq!(parse_number("1__000"), None);
        assert_eq!(parse_number("_1"), None);
        assert_eq!(parse_number("1_"), None);
        assert_eq!(parse_number("1_.5"), None);
        assert_eq!(eval("1_000"), number(1000.0));
        assert_eq!(eval("1_000 + 1"), number(1001.0));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), number(7.0));
        assert_eq!(eval("(1 + 2) * 3"), number(9.0));
        assert_eq!(eval("10 / 4"), number(2.5));
        assert_eq!(eval("-(3 - 5)"), number(2.0));
        assert_eq!(eval("+4"), number(4.0));
    }

    #[test]
    fn test_power() {
        assert_eq!(eval("2 ^ 3"), number(8.0));
        assert_eq!(eval("2 ** 3"), number(8.0));
        assert_eq!(eval("2 ^ 3 ^ 2"), number(512.0));
        assert_eq!(eval("-2 ^ 2"), number(-4.0));
        assert_eq!(eval("2 ^ -1"), number(0.5));
        // Not XOR
        assert_eq!(eval("6 ^ 3"), number(216.0));
    }

    #[test]
    fn test_power_errors() {
        assert_eq!(eval("0 ^ -1"), Err(FormulaError::DivisionByZero));
        assert!(matches!(eval("(-8) ^ 0.5"), Err(FormulaError::Evaluation(_))));
        assert!(matches!(eval("10 ^ 400"), Err(FormulaError::Evaluation(_))));
        assert_eq!(eval("(-8) ^ 2"), number(64.0));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("1/0"), Err(FormulaError::DivisionByZero));
        assert_eq!(eval("0/0"), Err(FormulaError::DivisionByZero));
        assert_eq!(
            eval_with("E1 / (E2 - 2)", &[("E1", 1.0), ("E2", 2.0)]),
            Err(FormulaError::DivisionByZero)
        );
        assert_eq!(eval("1/0").unwrap_err().to_string(), "Division by zero");
    }

    #[test]
    fn test_multiplication_overflow_is_infinite() {
        assert_eq!(eval("1e308 * 10"), number(f64::INFINITY));
    }

    #[test]
    fn test_variables() {
        assert_eq!(eval_with("E1 + 2", &[("E1", 5.0)]), number(7.0));
        assert_eq!(
            eval_with("E1 * E2", &[("E1", 3.0), ("E2", 4.0)]),
            number(12.0)
        );
        assert_eq!(
            eval_with("E1 + E9", &[("E1", 1.0)]),
            Err(FormulaError::UnknownVariable("E9".into()))
        );
    }

    #[test]
    fn test_if() {
        assert_eq!(eval("IF(1, 10, 20)"), number(10.0));
        assert_eq!(eval("IF(0, 10, 20)"), number(20.0));
        assert_eq!(eval("IF(-0.1, 10, 20)"), number(10.0));
        assert_eq!(eval_with("IF(E1 > 3, 1, 2)", &[("E1", 5.0)]), number(1.0));
        assert_eq!(eval("IF(True, False, True)"), Ok(CalcValue::Boolean(false)));
    }

    #[test]
    fn test_if_evaluates_both_branches() {
        assert_eq!(eval("IF(1, 10, 1/0)"), Err(FormulaError::DivisionByZero));
    }

    #[test]
    fn test_if_arity() {
        assert_eq!(
            eval("IF(1, 2)"),
            Err(FormulaError::ArgumentCount {
                function: "IF".into(),
                expected: "3".into(),
                actual: 2,
            })
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval("3 > 2"), Ok(CalcValue::Boolean(true)));
        assert_eq!(eval("3 <= 2"), Ok(CalcValue::Boolean(false)));
        assert_eq!(eval("2 == 2.0"), Ok(CalcValue::Boolean(true)));
        assert_eq!(eval("1 != 1"), Ok(CalcValue::Boolean(false)));
        assert_eq!(eval("1 < 2 < 3"), Ok(CalcValue::Boolean(true)));
        assert_eq!(eval("1 < 3 < 2"), Ok(CalcValue::Boolean(false)));
        // Chains stop at the first false pair
        assert_eq!(eval("2 < 1 < 1/0"), Ok(CalcValue::Boolean(false)));
        // Booleans count as 0/1 in arithmetic
        assert_eq!(eval("(3 > 2) + 1"), number(2.0));
        assert_eq!(eval("True == 1"), Ok(CalcValue::Boolean(true)));
    }

    #[test]
    fn test_math_functions() {
        assert_eq!(eval("math.sqrt(16)"), number(4.0));
        assert_eq!(eval("math.pow(2, 10)"), number(1024.0));
        assert_eq!(eval("math.floor(2.7) + math.ceil(2.2)"), number(5.0));
        assert_eq!(eval("math.abs(-3)"), number(3.0));
        assert_eq!(eval("math.log(1) + math.log10(100)"), number(2.0));
        assert_eq!(eval("math.pi"), number(std::f64::consts::PI));
        assert_eq!(eval("math.cos(0)"), number(1.0));
        assert_eq!(eval_with("math.sqrt(E1 * 4)", &[("E1", 4.0)]), number(4.0));
    }

    #[test]
    fn test_math_errors() {
        assert_eq!(
            eval("math.sqrt(-1)").unwrap_err().to_string(),
            "Evaluation error: math domain error"
        );
        assert_eq!(
            eval("math.sqrt(1, 2)"),
            Err(FormulaError::ArgumentCount {
                function: "math.sqrt".into(),
                expected: "1".into(),
                actual: 2,
            })
        );
    }

    #[test]
    fn test_disallowed() {
        for content in [
            "math",
            "IF",
            "math.sqrt",
            "math.pi()",
            "math.system(1)",
            "math.__dict__",
            "sqrt(4)",
            "abs(-1)",
            "E1.real",
            "E1.conjugate()",
            "open(1)",
        ] {
            assert!(
                matches!(
                    eval_with(content, &[("E1", 1.0)]),
                    Err(FormulaError::Disallowed(_))
                ),
                "expected {:?} to be disallowed",
                content
            );
        }
    }

    #[test]
    fn test_parse_errors_surface() {
        assert!(matches!(eval(""), Err(FormulaError::Parse(_))));
        assert!(matches!(eval("1 +"), Err(FormulaError::Parse(_))));
        assert!(matches!(eval("__import__('os')"), Err(FormulaError::Parse(_))));
    }
}
