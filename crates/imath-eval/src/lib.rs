#![forbid(unsafe_code)]

//! LaTeX-flavored arithmetic formula engine.
//!
//! A [`Formula`] is compiled once and evaluated against any number of
//! [`Bindings`]:
//!
//! ```
//! use imath_eval::Formula;
//!
//! let formula = Formula::compile(r"\frac{x}{2} + 1").unwrap();
//! assert_eq!(formula.symbols(), ["x"]);
//! assert_eq!(formula.evaluate(&[("x", 4.0)]).unwrap(), 3.0);
//! ```
//!
//! # Grammar
//!
//! - Numbers: `12`, `1.5`, `.5`.
//! - Symbols: maximal runs of ASCII letters. `PI` and `E` are constants
//!   unless bound.
//! - Operators: `+ - * / ^ !`, `\cdot`, `\times`, `\div`, `|x|`, and implicit
//!   multiplication (`2x`).
//! - Groups: `()`, `[]`, `{}`; `\left`/`\right` are ignored.
//! - Commands: `\frac`, `\sqrt`, `\sqrt[n]`, `\abs`, `\log`, `\log_{b}`,
//!   `\ln`, `\exp`, `\min`, `\max`, and the trigonometric and hyperbolic
//!   functions.
//!
//! # Failure Modes
//!
//! Compilation fails on unknown characters, unknown commands, malformed
//! syntax, wrong arity, nesting beyond [`parser::MAX_DEPTH`], or more than
//! [`parser::MAX_TOKENS`] tokens. Evaluation fails on unbound symbols and
//! factorials of non-integers. Division by zero is not an error; it yields
//! an infinity or NaN.

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

use std::str::FromStr;

use rustc_hash::FxHashSet;
use tracing::trace;

pub use ast::{BinOp, Expr, Func};
pub use error::{EvalError, Result};
pub use eval::Bindings;
pub use lexer::{SpannedToken, Token, tokenize};

/// A compiled formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    tokens: Vec<SpannedToken>,
    expr: Expr,
}

impl Formula {
    pub fn compile(source: &str) -> Result<Self> {
        let tokens = tokenize(source)?;
        let expr = parser::parse(&tokens)?;
        trace!(message = "formula.compile", tokens = tokens.len());
        Ok(Self { tokens, expr })
    }

    #[must_use]
    pub fn tokens(&self) -> &[SpannedToken] {
        &self.tokens
    }

    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Every distinct symbol token, in order of first appearance.
    ///
    /// Taken from the token stream, so constants (`PI`) are included and
    /// whether a symbol is bound plays no part.
    #[must_use]
    pub fn symbols(&self) -> Vec<&str> {
        let mut seen = FxHashSet::default();
        self.tokens
            .iter()
            .filter(|tok| tok.token == Token::Symbol)
            .map(|tok| tok.lexeme.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    pub fn evaluate<B: Bindings + ?Sized>(&self, bindings: &B) -> Result<f64> {
        eval::eval(&self.expr, bindings)
    }
}

impl FromStr for Formula {
    type Err = EvalError;

    fn from_str(source: &str) -> Result<Self> {
        Self::compile(source)
    }
}

/// Compile and evaluate in one step.
pub fn evaluate<B: Bindings + ?Sized>(source: &str, bindings: &B) -> Result<f64> {
    Formula::compile(source)?.evaluate(bindings)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn approx(src: &str, expected: f64) {
        let got = evaluate(src, &()).unwrap();
        assert!(
            (got - expected).abs() < 1e-9,
            "{src}: expected {expected}, got {got}"
        );
    }

    #[test]
    fn basic_arithmetic() {
        approx("2+2", 4.0);
        approx("1 - 2 - 3", -4.0);
        approx("2 * 3 + 4", 10.0);
        approx("2 + 3 * 4", 14.0);
        approx("8 / 4 / 2", 1.0);
        approx("(1 + 2) * 3", 9.0);
    }

    #[test]
    fn latex_operators() {
        approx(r"3 \cdot 4", 12.0);
        approx(r"3 \times 4", 12.0);
        approx(r"12 \div 4", 3.0);
        approx(r"\frac{3}{4}", 0.75);
        approx(r"\sqrt{16}", 4.0);
        approx(r"\sqrt[3]{27}", 3.0);
        approx(r"\left( 1 + 1 \right) \cdot 2", 4.0);
    }

    #[test]
    fn powers_and_signs() {
        approx("-2^2", -4.0);
        approx("(-2)^2", 4.0);
        approx("2^{3+1}", 16.0);
        approx("2^-1", 0.5);
        approx("2^3^2", 512.0);
    }

    #[test]
    fn factorial_and_abs() {
        approx("5!", 120.0);
        approx("3!^2", 36.0);
        approx("|-3| + |2 - 5|", 6.0);
        approx(r"\abs{-7}", 7.0);
    }

    #[test]
    fn functions() {
        approx(r"\sin(0)", 0.0);
        approx(r"\cos 0", 1.0);
        approx(r"\ln(E)", 1.0);
        approx(r"\log 1000", 3.0);
        approx(r"\log_{2} 8", 3.0);
        approx(r"\exp(0)", 1.0);
        approx(r"\max(1, 5, 3) - \min(4, 2)", 3.0);
        approx(r"\sin^2 1 + \cos^2 1", 1.0);
    }

    #[test]
    fn constants() {
        approx("PI", std::f64::consts::PI);
        approx("{PI} * 2", std::f64::consts::TAU);
        approx("2E", 2.0 * std::f64::consts::E);
    }

    #[test]
    fn division_by_zero_is_not_an_error() {
        assert_eq!(evaluate("1/0", &()), Ok(f64::INFINITY));
        assert!(evaluate("0/0", &()).unwrap().is_nan());
    }

    #[test]
    fn bindings_supply_symbols() {
        let formula = Formula::compile("2ab + c").unwrap();
        let mut vars = HashMap::new();
        vars.insert("ab".to_string(), 3.0);
        vars.insert("c".to_string(), 1.0);
        assert_eq!(formula.evaluate(&vars), Ok(7.0));
    }

    #[test]
    fn unbound_symbol_fails_at_evaluation_not_compile() {
        let formula = Formula::compile("x + 1").unwrap();
        let err = formula.evaluate(&()).unwrap_err();
        assert_eq!(err, EvalError::UnboundSymbol { name: "x".into() });
        assert!(!err.is_syntax());
    }

    #[test]
    fn symbols_are_distinct_and_ordered() {
        let formula = Formula::compile("b + a * b + {PI}").unwrap();
        assert_eq!(formula.symbols(), ["b", "a", "PI"]);
    }

    #[test]
    fn symbols_of_a_numeric_formula_are_empty() {
        assert!(Formula::compile("1 + 2").unwrap().symbols().is_empty());
    }

    #[test]
    fn from_str_compiles() {
        let formula: Formula = "3 * 3".parse().unwrap();
        assert_eq!(formula.evaluate(&()), Ok(9.0));
        assert!("3 *".parse::<Formula>().unwrap_err().is_syntax());
    }

    #[test]
    fn long_sums_fail_cleanly() {
        let err = evaluate(&("1+".repeat(2_000) + "1"), &()).unwrap_err();
        assert!(matches!(err, EvalError::TooLong { tokens: 4001, .. }));
        assert!(err.is_syntax());

        let src = "1+".repeat(500) + "1";
        assert_eq!(evaluate(&src, &()), Ok(501.0));
    }
}
