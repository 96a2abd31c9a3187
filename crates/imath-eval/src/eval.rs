#![forbid(unsafe_code)]

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::ast::{BinOp, Expr, Func};
use crate::error::{EvalError, Result};

/// Largest n for which n! is finite in `f64`.
const MAX_FINITE_FACTORIAL: f64 = 170.0;

/// Values for free symbols.
///
/// Bindings shadow the built-in constants `PI` and `E`.
pub trait Bindings {
    fn lookup(&self, name: &str) -> Option<f64>;
}

impl Bindings for () {
    fn lookup(&self, _name: &str) -> Option<f64> {
        None
    }
}

impl<S: BuildHasher> Bindings for HashMap<String, f64, S> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl Bindings for BTreeMap<String, f64> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl<const N: usize> Bindings for [(&str, f64); N] {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.iter().find(|(key, _)| *key == name).map(|(_, v)| *v)
    }
}

impl<T: Bindings + ?Sized> Bindings for &T {
    fn lookup(&self, name: &str) -> Option<f64> {
        (**self).lookup(name)
    }
}

pub(crate) fn eval<B: Bindings + ?Sized>(expr: &Expr, bindings: &B) -> Result<f64> {
    Ok(match expr {
        Expr::Number(value) => *value,
        Expr::Symbol(name) => symbol(name, bindings)?,
        Expr::Neg(inner) => -eval(inner, bindings)?,
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval(lhs, bindings)?;
            let rhs = eval(rhs, bindings)?;
            op.apply(lhs, rhs)
        }
        Expr::Factorial(inner) => factorial(eval(inner, bindings)?)?,
        Expr::Abs(inner) => eval(inner, bindings)?.abs(),
        Expr::Root { degree, radicand } => {
            let x = eval(radicand, bindings)?;
            match degree {
                None => x.sqrt(),
                Some(degree) => nth_root(x, eval(degree, bindings)?),
            }
        }
        Expr::Log { base, arg } => log(eval(arg, bindings)?, eval(base, bindings)?),
        Expr::Call { func, args } => {
            let values = args
                .iter()
                .map(|arg| eval(arg, bindings))
                .collect::<Result<Vec<_>>>()?;
            func.apply(&values)
        }
    })
}

fn symbol<B: Bindings + ?Sized>(name: &str, bindings: &B) -> Result<f64> {
    if let Some(value) = bindings.lookup(name) {
        return Ok(value);
    }
    match name {
        "PI" => Ok(std::f64::consts::PI),
        "E" => Ok(std::f64::consts::E),
        _ => Err(EvalError::unbound(name)),
    }
}

impl BinOp {
    /// IEEE-754 semantics throughout: `1/0` is infinity, `0/0` is NaN.
    #[must_use]
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => lhs / rhs,
            Self::Pow => lhs.powf(rhs),
        }
    }
}

impl Func {
    /// Apply to already-evaluated arguments. Arity was checked at compile time.
    #[must_use]
    pub fn apply(self, args: &[f64]) -> f64 {
        let x = args.first().copied().unwrap_or(f64::NAN);
        match self {
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Sec => x.cos().recip(),
            Self::Csc => x.sin().recip(),
            Self::Cot => x.tan().recip(),
            Self::Arcsin => x.asin(),
            Self::Arccos => x.acos(),
            Self::Arctan => x.atan(),
            Self::Sinh => x.sinh(),
            Self::Cosh => x.cosh(),
            Self::Tanh => x.tanh(),
            Self::Ln => x.ln(),
            Self::Exp => x.exp(),
            Self::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

fn factorial(n: f64) -> Result<f64> {
    if n < 0.0 || n.fract() != 0.0 || n.is_nan() {
        return Err(EvalError::Domain {
            operation: "factorial",
            value: n,
        });
    }
    if n > MAX_FINITE_FACTORIAL {
        return Ok(f64::INFINITY);
    }
    Ok((2..=n as u32).fold(1.0, |acc, k| acc * f64::from(k)))
}

/// Real n-th root; odd roots of negative numbers stay real.
fn nth_root(x: f64, n: f64) -> f64 {
    if n == 2.0 {
        return x.sqrt();
    }
    if n == 3.0 {
        return x.cbrt();
    }
    let odd_integer = n.fract() == 0.0 && n % 2.0 != 0.0;
    if x < 0.0 && odd_integer {
        -(-x).powf(n.recip())
    } else {
        x.powf(n.recip())
    }
}

fn log(x: f64, base: f64) -> f64 {
    if base == 10.0 {
        x.log10()
    } else if base == 2.0 {
        x.log2()
    } else {
        x.ln() / base.ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factorial_of_small_integers() {
        assert_eq!(factorial(0.0), Ok(1.0));
        assert_eq!(factorial(5.0), Ok(120.0));
        assert_eq!(factorial(171.0), Ok(f64::INFINITY));
    }

    #[test]
    fn factorial_rejects_fractions_and_negatives() {
        assert!(matches!(factorial(2.5), Err(EvalError::Domain { .. })));
        assert!(matches!(factorial(-1.0), Err(EvalError::Domain { .. })));
    }

    #[test]
    fn odd_roots_of_negatives_are_real() {
        assert_eq!(nth_root(-8.0, 3.0), -2.0);
        assert!((nth_root(-32.0, 5.0) + 2.0).abs() < 1e-12);
        assert!(nth_root(-16.0, 4.0).is_nan());
    }

    #[test]
    fn logs_are_exact_for_common_bases() {
        assert_eq!(log(1000.0, 10.0), 3.0);
        assert_eq!(log(8.0, 2.0), 3.0);
    }

    #[test]
    fn bindings_shadow_constants() {
        assert_eq!(symbol("PI", &[("PI", 3.0)]), Ok(3.0));
        assert_eq!(symbol("PI", &()), Ok(std::f64::consts::PI));
        assert_eq!(
            symbol("pi", &()),
            Err(EvalError::UnboundSymbol { name: "pi".into() })
        );
    }

    #[test]
    fn min_and_max_fold_all_arguments() {
        assert_eq!(Func::Min.apply(&[3.0, 1.0, 2.0]), 1.0);
        assert_eq!(Func::Max.apply(&[3.0, 1.0, 2.0]), 3.0);
    }
}
