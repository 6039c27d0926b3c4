//! Built-in `math.*` functions and constants
//!
//! The table is fixed at compile time. Formulas can reach nothing else.

pub mod math;

use crate::error::FormulaResult;

/// Function implementation signature
///
/// Arguments arrive already converted to numbers and arity-checked.
pub type MathFunctionImpl = fn(&[f64]) -> FormulaResult<f64>;

/// Function definition
pub struct MathFunctionDef {
    /// Name after `math.`
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments
    pub max_args: usize,
    /// Implementation
    pub implementation: MathFunctionImpl,
}

impl MathFunctionDef {
    /// Human-readable arity for error messages
    pub fn expected_args(&self) -> String {
        if self.min_args == self.max_args {
            self.min_args.to_string()
        } else {
            format!("{} to {}", self.min_args, self.max_args)
        }
    }
}

/// Named constant
pub struct MathConstant {
    /// Name after `math.`
    pub name: &'static str,
    /// Value
    pub value: f64,
}

const fn def(
    name: &'static str,
    min_args: usize,
    max_args: usize,
    implementation: MathFunctionImpl,
) -> MathFunctionDef {
    MathFunctionDef {
        name,
        min_args,
        max_args,
        implementation,
    }
}

static MATH_FUNCTIONS: &[MathFunctionDef] = &[
    def("sqrt", 1, 1, math::fn_sqrt),
    def("exp", 1, 1, math::fn_exp),
    def("log", 1, 2, math::fn_log),
    def("log10", 1, 1, math::fn_log10),
    def("log2", 1, 1, math::fn_log2),
    def("pow", 2, 2, math::fn_pow),
    def("sin", 1, 1, math::fn_sin),
    def("cos", 1, 1, math::fn_cos),
    def("tan", 1, 1, math::fn_tan),
    def("asin", 1, 1, math::fn_asin),
    def("acos", 1, 1, math::fn_acos),
    def("atan", 1, 1, math::fn_atan),
    def("atan2", 2, 2, math::fn_atan2),
    def("sinh", 1, 1, math::fn_sinh),
    def("cosh", 1, 1, math::fn_cosh),
    def("tanh", 1, 1, math::fn_tanh),
    def("floor", 1, 1, math::fn_floor),
    def("ceil", 1, 1, math::fn_ceil),
    def("trunc", 1, 1, math::fn_trunc),
    def("abs", 1, 1, math::fn_abs),
    def("fabs", 1, 1, math::fn_abs),
    def("hypot", 2, 2, math::fn_hypot),
    def("degrees", 1, 1, math::fn_degrees),
    def("radians", 1, 1, math::fn_radians),
    def("fmod", 2, 2, math::fn_fmod),
];

static MATH_CONSTANTS: &[MathConstant] = &[
    MathConstant {
        name: "pi",
        value: std::f64::consts::PI,
    },
    MathConstant {
        name: "e",
        value: std::f64::consts::E,
    },
    MathConstant {
        name: "tau",
        value: std::f64::consts::TAU,
    },
    MathConstant {
        name: "inf",
        value: f64::INFINITY,
    },
    MathConstant {
        name: "nan",
        value: f64::NAN,
    },
];

/// Read-only view of the `math` namespace
#[derive(Clone, Copy)]
pub struct MathLibrary {
    functions: &'static [MathFunctionDef],
    constants: &'static [MathConstant],
}

impl MathLibrary {
    /// The standard allow-listed functions and constants
    pub fn standard() -> Self {
        Self {
            functions: MATH_FUNCTIONS,
            constants: MATH_CONSTANTS,
        }
    }

    /// Look up a function by name
    pub fn function(&self, name: &str) -> Option<&'static MathFunctionDef> {
        self.functions.iter().find(|def| def.name == name)
    }

    /// Look up a constant by name
    pub fn constant(&self, name: &str) -> Option<f64> {
        self.constants
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value)
    }

    /// All function names
    pub fn function_names(&self) -> impl Iterator<Item = &'static str> {
        self.functions.iter().map(|def| def.name)
    }

    /// All constant names
    pub fn constant_names(&self) -> impl Iterator<Item = &'static str> {
        self.constants.iter().map(|c| c.name)
    }
}

impl Default for MathLibrary {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let library = MathLibrary::standard();
        assert!(library.function("sqrt").is_some());
        assert!(library.function("SQRT").is_none());
        assert!(library.function("system").is_none());
        assert_eq!(library.constant("pi"), Some(std::f64::consts::PI));
        assert_eq!(library.constant("sqrt"), None);
    }

    #[test]
    fn test_names_are_unique() {
        let library = MathLibrary::standard();
        let mut names: Vec<&str> = library
            .function_names()
            .chain(library.constant_names())
            .collect();
        let count = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), count);
    }

    #[test]
    fn test_expected_args() {
        let library = MathLibrary::standard();
        assert_eq!(library.function("log").unwrap().expected_args(), "1 to 2");
        assert_eq!(library.function("pow").unwrap().expected_args(), "2");
    }
}
