#![forbid(unsafe_code)]

//! One evaluation of one LaTeX expression against a [`MathStorage`].
//!
//! ```text
//! latex → preprocess (π, `:=`, right-hand side, canonical names)
//!       → substitute known aliases with variable identifiers
//!       → compile → collect symbols → evaluate
//!       → [assignment] reject cycles, define, notify dependents
//! ```
//!
//! Every failure is logged and folded into `None`; nothing escapes to the
//! caller as an error.

use imath_eval::{EvalError, Formula};
use imath_text::{Preprocessed, aliases_for, preprocess, substitute_aliases};
use thiserror::Error;
use tracing::debug;

use crate::id::VariableId;
use crate::storage::{CycleError, MathStorage};

/// Outcome of a successful evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    /// Variable this expression assigned, if it was an assignment.
    pub defined_variable: Option<VariableId>,
    /// Every symbol in the substituted expression, in order of first
    /// appearance. Includes constants such as `PI`.
    pub variables_used: Vec<VariableId>,
    /// `None` when the engine produced NaN.
    pub result: Option<f64>,
}

/// Why an evaluation produced no result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("{id} is defined in terms of itself")]
    SelfReference { id: VariableId },

    #[error(transparent)]
    Cycle(#[from] CycleError),
}

/// Evaluate `latex`, defining a variable if it is an assignment.
///
/// Returns `None` on any failure: syntax errors, unbound symbols, and
/// cyclic definitions. A failed evaluation never changes the store.
pub fn evaluate_expression(latex: &str, storage: &MathStorage) -> Option<EvaluationResult> {
    match try_evaluate_expression(latex, storage) {
        Ok(result) => Some(result),
        Err(error) => {
            debug!(message = "evaluate.failed", latex, %error);
            None
        }
    }
}

/// [`evaluate_expression`] with the failure reason kept.
pub fn try_evaluate_expression(
    latex: &str,
    storage: &MathStorage,
) -> Result<EvaluationResult, AdapterError> {
    let Preprocessed {
        expression,
        defines,
    } = preprocess(latex);
    let aliases = defines.as_deref().map(aliases_for);

    let alias_table = storage.alias_table();
    let substituted = substitute_aliases(
        &expression,
        alias_table
            .iter()
            .map(|(alias, id)| (alias.as_str(), id.as_str())),
    );
    let existing = aliases
        .as_ref()
        .and_then(|aliases| storage.resolve_any(aliases));

    let formula = Formula::compile(&substituted)?;
    let variables_used: Vec<VariableId> = formula
        .symbols()
        .into_iter()
        .map(VariableId::from)
        .collect();
    let value = formula.evaluate(&storage.bindings())?;

    let defined_variable = match aliases {
        Some(aliases) => {
            let id = existing.unwrap_or_else(|| storage.mint_variable_id());
            if variables_used.contains(&id) {
                return Err(AdapterError::SelfReference { id });
            }
            storage.define(id.clone(), value, aliases.into())?;
            Some(id)
        }
        None => None,
    };

    Ok(EvaluationResult {
        defined_variable,
        variables_used,
        result: (!value.is_nan()).then_some(value),
    })
}
