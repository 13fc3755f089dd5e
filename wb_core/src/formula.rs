//! # %MAC Formula Evaluator
//!
//! A profile converts a CG position (inches aft of datum) into percent of
//! Mean Aerodynamic Chord with a user-supplied formula such as
//! `((CG - 35.0) / 14.9) * 100`.
//!
//! Formulas are parsed into a small expression tree and interpreted
//! directly. The grammar is deliberately tiny:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := NUMBER | 'CG' | '(' expr ')'
//! ```
//!
//! `CG` is matched case-insensitively. Apart from `CG`, only digits, `.`,
//! `+ - * / ( )` and whitespace are accepted; anything else is rejected with
//! [`FormulaError::InvalidCharacters`] before parsing starts.
//!
//! `CG` is a variable, not pasted-in text: `2CG` is a syntax error rather
//! than `25` at CG 5, and `-CG` at CG -5 is `5`.
//!
//! ## Example
//!
//! ```rust
//! use wb_core::formula::{evaluate, MacFormula};
//!
//! let mac = evaluate("((CG - 35.0) / 14.9) * 100", 49.9).unwrap();
//! assert!((mac - 100.0).abs() < 1e-9);
//!
//! // Parse once, evaluate many times
//! let formula = MacFormula::parse("20 + ((CG - 232.28) / 86.22) * 100").unwrap();
//! assert!((formula.eval(232.28).unwrap() - 20.0).abs() < 1e-9);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// CG value used by [`validate_formula`] to smoke-test a formula
pub const REFERENCE_CG: f64 = 240.0;

/// Matches the one formula shape [`solve_cg_from_mac`] can invert:
/// `a + ((CG - b) / c) * d`
static LINEAR_MAC_FORMULA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([\d.]+)\s*\+\s*\(\(CG\s*-\s*([\d.]+)\)\s*/\s*([\d.]+)\)\s*\*\s*([\d.]+)")
        .expect("linear MAC formula pattern is valid")
});

/// Formula evaluation failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    /// Something other than `CG`, numbers, operators, parentheses or whitespace
    #[error("Formula contains invalid characters: '{expression}'")]
    InvalidCharacters { expression: String },

    /// The expression is malformed
    #[error("Mathematical error in formula at position {position}: {message}")]
    Syntax {
        expression: String,
        position: usize,
        message: String,
    },

    /// The expression evaluated to NaN or infinity (e.g. division by zero)
    #[error("Formula produces invalid result: {value}")]
    NonFinite { expression: String, value: f64 },
}

impl FormulaError {
    /// The formula text that failed
    pub fn expression(&self) -> &str {
        match self {
            FormulaError::InvalidCharacters { expression }
            | FormulaError::Syntax { expression, .. }
            | FormulaError::NonFinite { expression, .. } => expression,
        }
    }
}

/// %MAC derivation contract for a profile.
///
/// ## JSON Example
///
/// ```json
/// { "formula": "((CG - 35.0) / 14.9) * 100", "macMin": 15.0, "macMax": 38.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacConfig {
    /// Expression in the single variable `CG` (inches)
    pub formula: String,
    /// Lower %MAC limit (inclusive)
    pub mac_min: f64,
    /// Upper %MAC limit (inclusive)
    pub mac_max: f64,
}

impl MacConfig {
    pub fn new(formula: impl Into<String>, mac_min: f64, mac_max: f64) -> Self {
        MacConfig {
            formula: formula.into(),
            mac_min,
            mac_max,
        }
    }

    /// Whether `mac` lies in the closed interval `[mac_min, mac_max]`.
    pub fn contains(&self, mac: f64) -> bool {
        mac >= self.mac_min && mac <= self.mac_max
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Cg,
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    fn eval(&self, cg: f64) -> f64 {
        match self {
            Expr::Number(n) => *n,
            Expr::Cg => cg,
            Expr::Neg(inner) => -inner.eval(cg),
            Expr::Binary(op, lhs, rhs) => {
                let (l, r) = (lhs.eval(cg), rhs.eval(cg));
                match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => l / r,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Cg,
    Op(BinaryOp),
    LParen,
    RParen,
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '+' | '-' | '*' | '/' | '(' | ')' | '.') || c.is_whitespace()
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, FormulaError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            'c' | 'C' if matches!(chars.get(i + 1), Some((_, 'g' | 'G'))) => {
                tokens.push((pos, Token::Cg));
                i += 2;
            }
            '+' => {
                tokens.push((pos, Token::Op(BinaryOp::Add)));
                i += 1;
            }
            '-' => {
                tokens.push((pos, Token::Op(BinaryOp::Sub)));
                i += 1;
            }
            '*' => {
                tokens.push((pos, Token::Op(BinaryOp::Mul)));
                i += 1;
            }
            '/' => {
                tokens.push((pos, Token::Op(BinaryOp::Div)));
                i += 1;
            }
            '(' => {
                tokens.push((pos, Token::LParen));
                i += 1;
            }
            ')' => {
                tokens.push((pos, Token::RParen));
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                while i < chars.len() && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
                    i += 1;
                }
                let end = chars.get(i).map_or(source.len(), |(p, _)| *p);
                let literal = &source[pos..end];
                let value = literal.parse::<f64>().map_err(|_| FormulaError::Syntax {
                    expression: source.to_string(),
                    position: pos,
                    message: format!("invalid number '{literal}'"),
                })?;
                tokens.push((pos, Token::Number(value)));
            }
            _ => {
                return Err(FormulaError::InvalidCharacters {
                    expression: source.to_string(),
                })
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(_, t)| *t)
    }

    fn error(&self, message: impl Into<String>) -> FormulaError {
        let position = self
            .tokens
            .get(self.pos)
            .map_or(self.source.len(), |(p, _)| *p);
        FormulaError::Syntax {
            expression: self.source.to_string(),
            position,
            message: message.into(),
        }
    }

    fn expr(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        while let Some(Token::Op(op @ (BinaryOp::Add | BinaryOp::Sub))) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        while let Some(Token::Op(op @ (BinaryOp::Mul | BinaryOp::Div))) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            Some(Token::Op(BinaryOp::Sub)) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Op(BinaryOp::Add)) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            Some(Token::Number(n)) => {
                self.pos += 1;
                Ok(Expr::Number(n))
            }
            Some(Token::Cg) => {
                self.pos += 1;
                Ok(Expr::Cg)
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.expr()?;
                if self.peek() != Some(Token::RParen) {
                    return Err(self.error("expected ')'"));
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(_) => Err(self.error("unexpected token")),
            None => Err(self.error("unexpected end of formula")),
        }
    }
}

/// A parsed %MAC formula, reusable across CG values.
#[derive(Debug, Clone, PartialEq)]
pub struct MacFormula {
    source: String,
    expr: Expr,
}

impl MacFormula {
    /// Parse a formula string.
    ///
    /// Fails with [`FormulaError::InvalidCharacters`] when anything outside
    /// the whitelist appears, or [`FormulaError::Syntax`] when the arithmetic
    /// is malformed (unbalanced parentheses, dangling operator, `2CG`, ...).
    pub fn parse(formula: &str) -> Result<Self, FormulaError> {
        if formula.is_empty() {
            return Err(FormulaError::InvalidCharacters {
                expression: String::new(),
            });
        }
        if let Some(bad) = formula
            .char_indices()
            .find(|&(i, c)| !is_allowed(c) && !is_cg_letter(formula, i))
        {
            tracing::debug!(formula, character = %bad.1, "rejecting formula");
            return Err(FormulaError::InvalidCharacters {
                expression: formula.to_string(),
            });
        }

        let tokens = tokenize(formula)?;
        let mut parser = Parser {
            source: formula,
            tokens,
            pos: 0,
        };
        let expr = parser.expr()?;
        if parser.peek().is_some() {
            return Err(parser.error("unexpected token after expression"));
        }

        Ok(MacFormula {
            source: formula.to_string(),
            expr,
        })
    }

    /// The original formula text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate at `cg`. Non-finite results are errors, not values.
    pub fn eval(&self, cg: f64) -> Result<f64, FormulaError> {
        let value = self.expr.eval(cg);
        if !value.is_finite() {
            return Err(FormulaError::NonFinite {
                expression: self.source.clone(),
                value,
            });
        }
        Ok(value)
    }
}

/// True when byte `i` is the `C` or `G` of a case-insensitive `CG` pair.
fn is_cg_letter(formula: &str, i: usize) -> bool {
    let bytes = formula.as_bytes();
    let is_c = |j: usize| bytes.get(j).is_some_and(|b| b.eq_ignore_ascii_case(&b'c'));
    let is_g = |j: usize| bytes.get(j).is_some_and(|b| b.eq_ignore_ascii_case(&b'g'));
    (is_c(i) && is_g(i + 1)) || (i > 0 && is_g(i) && is_c(i - 1))
}

/// Evaluate `formula` with `CG = cg_value`.
pub fn evaluate(formula: &str, cg_value: f64) -> Result<f64, FormulaError> {
    MacFormula::parse(formula)?.eval(cg_value)
}

/// Outcome of [`validate_formula`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaValidation {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Smoke-test a formula by evaluating it at [`REFERENCE_CG`].
///
/// Passing says nothing about other CG values: `100 / (CG - 35)` validates
/// and still fails at `CG = 35`.
pub fn validate_formula(formula: &str) -> FormulaValidation {
    match evaluate(formula, REFERENCE_CG) {
        Ok(_) => FormulaValidation {
            is_valid: true,
            error: None,
        },
        Err(err) => FormulaValidation {
            is_valid: false,
            error: Some(err.to_string()),
        },
    }
}

/// Invert a formula of the exact shape `a + ((CG - b) / c) * d`.
///
/// Returns `None` for every other shape, including algebraically equivalent
/// rewrites such as `((CG - b) / c) * d` without the leading offset.
pub fn solve_cg_from_mac(mac_percent: f64, mac_config: &MacConfig) -> Option<f64> {
    let formula = &mac_config.formula;
    if !(formula.contains("((CG") && formula.contains(") /")) {
        return None;
    }

    let caps = LINEAR_MAC_FORMULA.captures(formula)?;
    let coeff = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<f64>().ok());
    let (a, b, c, d) = (coeff(1)?, coeff(2)?, coeff(3)?, coeff(4)?);

    let cg = (mac_percent - a) * c / d + b;
    cg.is_finite().then_some(cg)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CESSNA: &str = "((CG - 35.0) / 14.9) * 100";
    const A319: &str = "20 + ((CG - 232.28) / 86.22) * 100";

    #[test]
    fn test_cessna_formula_endpoints() {
        assert!(evaluate(CESSNA, 35.0).unwrap().abs() < 1e-12);
        assert!((evaluate(CESSNA, 49.9).unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_operator_precedence() {
        assert_eq!(evaluate("2 + 3 * 4", 0.0).unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4", 0.0).unwrap(), 20.0);
        assert_eq!(evaluate("10 - 4 - 3", 0.0).unwrap(), 3.0);
        assert_eq!(evaluate("24 / 4 / 2", 0.0).unwrap(), 3.0);
    }

    #[test]
    fn test_unary_minus_and_negative_cg() {
        assert_eq!(evaluate("-CG", 5.0).unwrap(), -5.0);
        assert_eq!(evaluate("-CG", -5.0).unwrap(), 5.0);
        assert_eq!(evaluate("10 - CG", -5.0).unwrap(), 15.0);
        assert_eq!(evaluate("CG * CG", -3.0).unwrap(), 9.0);
        assert_eq!(evaluate("+.5 * 4", 0.0).unwrap(), 2.0);
    }

    #[test]
    fn test_cg_is_case_insensitive() {
        assert_eq!(evaluate("cg + Cg + cG", 1.5).unwrap(), 4.5);
    }

    #[test]
    fn test_rejects_injection() {
        let err = evaluate("CG; DROP TABLE", 10.0).unwrap_err();
        assert!(matches!(err, FormulaError::InvalidCharacters { .. }));
        assert!(matches!(evaluate("Math.max(CG, 1)", 1.0), Err(FormulaError::InvalidCharacters { .. })));
        assert!(matches!(evaluate("", 1.0), Err(FormulaError::InvalidCharacters { .. })));
    }

    #[test]
    fn test_syntax_errors() {
        for bad in ["(CG - 35", "CG -", "2CG", "CGCG", "1.2.3 + CG", "()", "   ", "2 ** 3"] {
            assert!(
                matches!(evaluate(bad, 1.0), Err(FormulaError::Syntax { .. })),
                "expected syntax error for {bad:?}"
            );
        }
    }

    #[test]
    fn test_division_by_zero_is_rejected() {
        let err = evaluate("100 / (CG - 35)", 35.0).unwrap_err();
        assert!(matches!(err, FormulaError::NonFinite { .. }));
        assert!(evaluate("100 / (CG - 35)", 36.0).is_ok());
    }

    #[test]
    fn test_non_finite_cg_is_rejected() {
        assert!(evaluate(CESSNA, f64::NAN).is_err());
        assert!(evaluate(CESSNA, f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_formula() {
        assert!(validate_formula(A319).is_valid);

        let v = validate_formula("1 / (CG - 240)");
        assert!(!v.is_valid);
        assert!(v.error.is_some());

        assert!(!validate_formula("CG +").is_valid);
    }

    #[test]
    fn test_solve_cg_round_trip() {
        let config = MacConfig::new(A319, 16.0, 30.0);
        let cg = solve_cg_from_mac(25.0, &config).unwrap();
        assert!((evaluate(A319, cg).unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_solve_cg_unsupported_shapes() {
        assert_eq!(solve_cg_from_mac(25.0, &MacConfig::new(CESSNA, 15.0, 38.0)), None);
        assert_eq!(solve_cg_from_mac(25.0, &MacConfig::new("20 + ((CG - 232.28)/86.22) * 100", 16.0, 30.0)), None);
        assert_eq!(solve_cg_from_mac(25.0, &MacConfig::new("20 + ((CG - 1) / 2) * 0", 16.0, 30.0)), None);
    }

    #[test]
    fn test_mac_config_contains_is_inclusive() {
        let config = MacConfig::new(CESSNA, 15.0, 38.0);
        assert!(config.contains(15.0));
        assert!(config.contains(38.0));
        assert!(!config.contains(38.0001));
    }

    #[test]
    fn test_mac_config_json_shape() {
        let config = MacConfig::new(CESSNA, 15.0, 38.0);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"macMin\":15.0"));
        let roundtrip: MacConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, roundtrip);
    }
}
