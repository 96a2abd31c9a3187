#![forbid(unsafe_code)]

//! Reactive evaluation of LaTeX expressions.
//!
//! A [`MathStorage`] holds one document's variables and listeners. Each
//! rendered expression gets an [`EvaluationSession`], which evaluates it,
//! renders the result, and re-evaluates whenever a variable it uses is
//! redefined.
//!
//! ```
//! use std::rc::Rc;
//!
//! use imath_runtime::{EvaluationSession, MathStorage, ResultCell};
//!
//! let storage = Rc::new(MathStorage::new());
//! let _a = EvaluationSession::new("a := 5", ResultCell::new(), true, &storage);
//!
//! let shown = ResultCell::new();
//! let _sum = EvaluationSession::new("a + 1", shown.clone(), true, &storage);
//! assert_eq!(shown.text(), "=6");
//!
//! let _a2 = EvaluationSession::new("a := 10", ResultCell::new(), true, &storage);
//! assert_eq!(shown.text(), "=11");
//! ```
//!
//! Everything here is single-threaded and synchronous: by the time a
//! definition returns, every dependent has re-evaluated.

pub mod evaluate;
pub mod id;
pub mod render;
pub mod session;
pub mod storage;

pub use evaluate::{AdapterError, EvaluationResult, evaluate_expression, try_evaluate_expression};
pub use id::{IdGenerator, RandomIdGenerator, SequentialIdGenerator, SubscriberId, VariableId};
pub use render::{ResultCell, ResultSink, format_result};
pub use session::{EvaluationSession, SessionState, update_evaluation};
pub use storage::{CycleError, Listener, MathStorage, Variable};
