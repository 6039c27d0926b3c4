//! Formula parser
//!
//! A recursive descent parser for the formula grammar: numbers, names,
//! `+ - * /`, power (`^` or `**`), unary signs, comparisons, parentheses,
//! calls and `base.attr` access. Anything else is a parse error.

use crate::ast::{BinaryOperator, Callee, CompareOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use std::fmt;

/// Deepest nesting accepted: parentheses, calls, unary signs, powers and
/// each operator of a `+ -` or `* /` chain count one level each
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parse a formula string into an AST
///
/// # Example
/// ```rust
/// use visualcalc_formula::parse_formula;
///
/// let ast = parse_formula("E1 + 2").unwrap();
/// let ast = parse_formula("2 ^ 3").unwrap();
/// let ast = parse_formula("IF(E1 > 0, math.sqrt(E1), 0)").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let formula = formula.trim();
    if formula.is_empty() {
        return Err(FormulaError::Parse("empty formula".into()));
    }

    let mut parser = FormulaParser::new(formula);
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse(format!(
            "unexpected {} after expression",
            parser.current_token()
        )));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    Boolean(bool),

    Identifier(String),

    // Operators
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    Caret,
    Dot,
    Comma,
    EqualEqual,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Delimiters
    LeftParen,
    RightParen,

    /// Text outside the grammar (strings, brackets, `%`, `//`, `=`, ...)
    Unsupported(String),

    // End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {}", n),
            Token::Boolean(true) => f.write_str("'True'"),
            Token::Boolean(false) => f.write_str("'False'"),
            Token::Identifier(name) => write!(f, "name '{}'", name),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Star => f.write_str("'*'"),
            Token::DoubleStar => f.write_str("'**'"),
            Token::Slash => f.write_str("'/'"),
            Token::Caret => f.write_str("'^'"),
            Token::Dot => f.write_str("'.'"),
            Token::Comma => f.write_str("','"),
            Token::EqualEqual => f.write_str("'=='"),
            Token::NotEqual => f.write_str("'!='"),
            Token::LessThan => f.write_str("'<'"),
            Token::LessEqual => f.write_str("'<='"),
            Token::GreaterThan => f.write_str("'>'"),
            Token::GreaterEqual => f.write_str("'>='"),
            Token::LeftParen => f.write_str("'('"),
            Token::RightParen => f.write_str("')'"),
            Token::Unsupported(text) => write!(f, "'{}'", text),
            Token::Eof => f.write_str("end of formula"),
        }
    }
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Option<Token>,
    depth: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> Self {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: None,
            depth: 0,
        };
        parser.advance_token();
        parser
    }

    // === Token scanning ===

    fn advance_token(&mut self) {
        self.current_token = Some(self.scan_token());
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Token::Eof,
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '^' => Some(Token::Caret),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return token;
        }

        // One- or two-character operators
        match c {
            '*' => {
                self.advance();
                if self.peek_char() == Some('*') {
                    self.advance();
                    return Token::DoubleStar;
                }
                return Token::Star;
            }
            '/' => {
                self.advance();
                if self.peek_char() == Some('/') {
                    self.advance();
                    return Token::Unsupported("//".into());
                }
                return Token::Slash;
            }
            '<' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Token::LessEqual;
                }
                return Token::LessThan;
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Token::GreaterEqual;
                }
                return Token::GreaterThan;
            }
            '=' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Token::EqualEqual;
                }
                return Token::Unsupported("=".into());
            }
            '!' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Token::NotEqual;
                }
                return Token::Unsupported("!".into());
            }
            _ => {}
        }

        // Number (including ".5")
        if c.is_ascii_digit() || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c == '.' {
            self.advance();
            return Token::Dot;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            return self.scan_identifier();
        }

        // Unknown character
        self.advance();
        Token::Unsupported(c.to_string())
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        // Integer part
        self.scan_digits();

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            self.scan_digits();
        }

        // Exponent part, only when digits follow (so "2e" is a number and a name)
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            let digits_at = match self.peek_char_at(1) {
                Some('+') | Some('-') => 2,
                _ => 1,
            };
            if self
                .peek_char_at(digits_at)
                .map_or(false, |c| c.is_ascii_digit())
            {
                for _ in 0..digits_at {
                    self.advance();
                }
                self.scan_digits();
            }
        }

        let num_str = &self.input[start..self.pos];
        match num_str.replace('_', "").parse::<f64>() {
            Ok(num) => Token::Number(num),
            Err(_) => Token::Unsupported(num_str.to_string()),
        }
    }

    /// Digits, with single `_` separators allowed between them (`1_000`)
    fn scan_digits(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_ascii_digit() => self.advance(),
                Some('_')
                    if self.pos > 0
                        && self.input.as_bytes()[self.pos - 1].is_ascii_digit()
                        && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()) =>
                {
                    self.advance()
                }
                _ => break,
            }
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;

        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }

        match &self.input[start..self.pos] {
            "True" => Token::Boolean(true),
            "False" => Token::Boolean(false),
            text => Token::Identifier(text.to_string()),
        }
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        self.current_token.as_ref().unwrap_or(&Token::Eof)
    }

    fn consume(&mut self) -> Token {
        let token = self.current_token.take().unwrap_or(Token::Eof);
        self.advance_token();
        token
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "expected {}, got {}",
                expected,
                self.current_token()
            )))
        }
    }

    fn expect_identifier(&mut self) -> FormulaResult<String> {
        match self.consume() {
            Token::Identifier(name) => Ok(name),
            other => Err(FormulaError::Parse(format!(
                "expected a name after '.', got {}",
                other
            ))),
        }
    }

    fn descend(&mut self) -> FormulaResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(FormulaError::Parse(format!(
                "formula nested deeper than {} levels",
                MAX_NESTING_DEPTH
            )));
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    fn ascend_by(&mut self, levels: usize) {
        self.depth -= levels;
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: ==, !=, <, <=, >, >= (chained)
    // 2. Addition/Subtraction: +, -
    // 3. Multiplication/Division: *, /
    // 4. Unary: -, +
    // 5. Power: ^, ** (right associative, right operand may be unary)
    // 6. Primary: literals, names, calls, attributes, parentheses

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.descend()?;
        let expr = self.parse_comparison()?;
        self.ascend();
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> FormulaResult<FormulaExpr> {
        let first = self.parse_additive()?;
        let mut rest = Vec::new();

        loop {
            let op = match self.current_token() {
                Token::EqualEqual => CompareOperator::Equal,
                Token::NotEqual => CompareOperator::NotEqual,
                Token::LessThan => CompareOperator::LessThan,
                Token::LessEqual => CompareOperator::LessEqual,
                Token::GreaterThan => CompareOperator::GreaterThan,
                Token::GreaterEqual => CompareOperator::GreaterEqual,
                _ => break,
            };

            self.consume();
            rest.push((op, self.parse_additive()?));
        }

        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(FormulaExpr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_multiplicative()?;
        let mut folded = 0;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            // Each fold nests `left` one level deeper
            self.descend()?;
            folded += 1;
            let right = self.parse_multiplicative()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.ascend_by(folded);
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_unary()?;
        let mut folded = 0;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume();
            self.descend()?;
            folded += 1;
            let right = self.parse_unary()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.ascend_by(folded);
        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        let op = match self.current_token() {
            Token::Minus => UnaryOperator::Negate,
            Token::Plus => UnaryOperator::Plus,
            _ => return self.parse_power(),
        };

        self.consume();
        self.descend()?;
        let operand = self.parse_unary()?;
        self.ascend();
        Ok(FormulaExpr::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_power(&mut self) -> FormulaResult<FormulaExpr> {
        let base = self.parse_primary()?;

        if matches!(self.current_token(), Token::Caret | Token::DoubleStar) {
            self.consume();
            self.descend()?;
            let exponent = self.parse_unary()?; // Right associative
            self.ascend();
            return Ok(FormulaExpr::BinaryOp {
                op: BinaryOperator::Power,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }

        Ok(base)
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.consume() {
            Token::Number(n) => Ok(FormulaExpr::Number(n)),

            Token::Boolean(b) => Ok(FormulaExpr::Boolean(b)),

            Token::LeftParen => {
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::Identifier(name) => {
                if matches!(self.current_token(), Token::Dot) {
                    self.consume();
                    let attr = self.expect_identifier()?;
                    if matches!(self.current_token(), Token::LeftParen) {
                        return self.parse_function_call(Callee::Attribute { base: name, attr });
                    }
                    return Ok(FormulaExpr::Attribute { base: name, attr });
                }

                if matches!(self.current_token(), Token::LeftParen) {
                    self.parse_function_call(Callee::Name(name))
                } else {
                    Ok(FormulaExpr::Name(name))
                }
            }

            Token::Unsupported(text) => Err(FormulaError::Parse(format!(
                "unsupported syntax '{}'",
                text
            ))),

            other => Err(FormulaError::Parse(format!("unexpected {}", other))),
        }
    }

    fn parse_function_call(&mut self, callee: Callee) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();

        // Parse arguments (a trailing comma is allowed)
        while !matches!(self.current_token(), Token::RightParen) {
            args.push(self.parse_expression()?);

            if matches!(self.current_token(), Token::Comma) {
                self.consume();
            } else {
                break;
            }
        }

        self.expect(&Token::RightParen)?;

        Ok(FormulaExpr::Call { callee, args })
    }
}
