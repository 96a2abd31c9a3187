#![forbid(unsafe_code)]

//! imath public facade crate.
//!
//! Re-exports the text layer, the formula engine, and (with the default
//! `runtime` feature) the reactive variable store and sessions.

pub use imath_eval::{EvalError, Formula, evaluate};
pub use imath_text::{MathNode, MathOptions, canonicalize, preprocess};

#[cfg(feature = "runtime")]
pub use imath_runtime::{EvaluationSession, MathStorage, ResultCell, evaluate_expression};

pub mod prelude {
    pub use imath_eval as eval;
    #[cfg(feature = "runtime")]
    pub use imath_runtime as runtime;
    pub use imath_text as text;
}
