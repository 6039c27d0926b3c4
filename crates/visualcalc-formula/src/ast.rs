//! Formula Abstract Syntax Tree types

/// Formula expression AST
///
/// The parser accepts slightly more than the evaluator allows: any call or
/// attribute shape parses, and the evaluator rejects those outside the
/// allow-list.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// `True` / `False`
    Boolean(bool),

    // === References ===
    /// Bare identifier (element name, or a reserved name used as a value)
    Name(String),
    /// `base.attr` not followed by a call
    Attribute { base: String, attr: String },

    // === Operators ===
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },
    /// Comparison chain: `a < b <= c` holds when every adjacent pair holds
    Compare {
        first: Box<FormulaExpr>,
        rest: Vec<(CompareOperator, FormulaExpr)>,
    },

    // === Function call ===
    Call { callee: Callee, args: Vec<FormulaExpr> },
}

/// What a call expression calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callee {
    /// `name(...)`
    Name(String),
    /// `base.attr(...)`
    Attribute { base: String, attr: String },
}

impl Callee {
    /// Dotted name for error messages
    pub fn display_name(&self) -> String {
        match self {
            Callee::Name(name) => name.clone(),
            Callee::Attribute { base, attr } => format!("{}.{}", base, attr),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    /// Written `^` or `**`
    Power,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Plus,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperator {
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl CompareOperator {
    /// Apply the comparison to two numbers
    pub fn apply(self, left: f64, right: f64) -> bool {
        match self {
            CompareOperator::Equal => left == right,
            CompareOperator::NotEqual => left != right,
            CompareOperator::LessThan => left < right,
            CompareOperator::LessEqual => left <= right,
            CompareOperator::GreaterThan => left > right,
            CompareOperator::GreaterEqual => left >= right,
        }
    }
}
