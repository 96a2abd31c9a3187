#![forbid(unsafe_code)]

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvalError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unexpected character {text:?} at byte {offset}")]
    UnexpectedChar { text: String, offset: usize },

    #[error("unexpected {found:?} at byte {offset}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        offset: usize,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("expression nests deeper than {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error("expression has {tokens} tokens, more than the limit of {limit}")]
    TooLong { tokens: usize, limit: usize },

    #[error("unknown command \\{name}")]
    UnknownCommand { name: String },

    #[error("unbound symbol {name}")]
    UnboundSymbol { name: String },

    #[error("\\{function} takes {expected} argument(s), got {got}")]
    Arity {
        function: &'static str,
        expected: &'static str,
        got: usize,
    },

    #[error("{operation} is undefined for {value}")]
    Domain { operation: &'static str, value: f64 },
}

impl EvalError {
    /// True for errors raised while compiling, false for errors raised while
    /// evaluating a compiled formula.
    #[must_use]
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedChar { .. }
                | Self::UnexpectedToken { .. }
                | Self::UnexpectedEnd { .. }
                | Self::NestingTooDeep { .. }
                | Self::TooLong { .. }
                | Self::UnknownCommand { .. }
                | Self::Arity { .. }
        )
    }

    pub(crate) fn unbound(name: impl Into<String>) -> Self {
        Self::UnboundSymbol { name: name.into() }
    }
}
