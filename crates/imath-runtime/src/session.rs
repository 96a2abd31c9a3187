#![forbid(unsafe_code)]

//! Live evaluation of one rendered expression.
//!
//! # Design
//!
//! An [`EvaluationSession`] evaluates its LaTeX once on creation, writes the
//! result to its [`ResultSink`], and subscribes to every variable the
//! expression used. When one of those variables is redefined, the storage
//! runs the session's listener, which re-evaluates and re-renders.
//!
//! The listener holds only `Weak` handles to the session and the storage, so
//! neither is kept alive by a registration.
//!
//! # Invariants
//!
//! 1. State moves `Uninitialized → Evaluated → Disposed` and never back.
//! 2. Subscriptions are made once, from the first evaluation's used
//!    variables, and removed on disposal.
//! 3. `version` increments by exactly 1 per evaluation.
//! 4. No `RefCell` borrow of the session is held while evaluating or while
//!    the sink renders.
//!
//! # Failure Modes
//!
//! - **Notification after disposal**: ignored.
//! - **Storage dropped first**: disposal has nothing to unsubscribe from and
//!   re-evaluation is skipped.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::evaluate::{EvaluationResult, evaluate_expression};
use crate::id::{SubscriberId, VariableId};
use crate::render::{ResultSink, format_result};
use crate::storage::MathStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Evaluated,
    Disposed,
}

struct SessionInner {
    latex: String,
    subscriber: SubscriberId,
    /// Taken out while rendering.
    sink: Option<Box<dyn ResultSink>>,
    show_result: bool,
    result: Option<EvaluationResult>,
    subscriptions: Vec<VariableId>,
    state: SessionState,
    version: u64,
}

/// Controller for one rendered expression.
///
/// Dropping the session disposes it.
pub struct EvaluationSession {
    inner: Rc<RefCell<SessionInner>>,
    storage: Weak<MathStorage>,
}

impl fmt::Debug for EvaluationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EvaluationSession")
            .field("latex", &inner.latex)
            .field("subscriber", &inner.subscriber)
            .field("state", &inner.state)
            .field("version", &inner.version)
            .field("result", &inner.result)
            .finish()
    }
}

/// Start a session for `latex` under an explicit subscriber id.
pub fn update_evaluation(
    latex: impl Into<String>,
    subscriber: SubscriberId,
    sink: Box<dyn ResultSink>,
    show_result: bool,
    storage: &Rc<MathStorage>,
) -> EvaluationSession {
    let inner = Rc::new(RefCell::new(SessionInner {
        latex: latex.into(),
        subscriber,
        sink: Some(sink),
        show_result,
        result: None,
        subscriptions: Vec::new(),
        state: SessionState::Uninitialized,
        version: 0,
    }));

    refresh(&inner, storage);
    subscribe(&inner, storage);

    EvaluationSession {
        inner,
        storage: Rc::downgrade(storage),
    }
}

impl EvaluationSession {
    /// Start a session with a freshly minted subscriber id.
    pub fn new(
        latex: impl Into<String>,
        sink: impl ResultSink + 'static,
        show_result: bool,
        storage: &Rc<MathStorage>,
    ) -> Self {
        let subscriber = storage.mint_subscriber_id();
        update_evaluation(latex, subscriber, Box::new(sink), show_result, storage)
    }

    /// Latest evaluation, or `None` if it failed.
    #[must_use]
    pub fn result(&self) -> Option<EvaluationResult> {
        self.inner.borrow().result.clone()
    }

    /// Latest numeric value.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.inner.borrow().result.as_ref().and_then(|r| r.result)
    }

    /// Displayed text, such as `=4` or `=Error`.
    #[must_use]
    pub fn text(&self) -> String {
        format_result(self.value())
    }

    #[must_use]
    pub fn latex(&self) -> String {
        self.inner.borrow().latex.clone()
    }

    #[must_use]
    pub fn subscriber(&self) -> SubscriberId {
        self.inner.borrow().subscriber
    }

    #[must_use]
    pub fn subscriptions(&self) -> Vec<VariableId> {
        self.inner.borrow().subscriptions.clone()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.borrow().state
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state() == SessionState::Disposed
    }

    /// Number of evaluations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    #[must_use]
    pub fn show_result(&self) -> bool {
        self.inner.borrow().show_result
    }

    /// Show or hide the result and re-render without re-evaluating.
    pub fn set_show_result(&self, show: bool) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.state == SessionState::Disposed || inner.show_result == show {
                return;
            }
            inner.show_result = show;
        }
        render(&self.inner);
    }

    /// Flip result visibility.
    pub fn toggle_result(&self) {
        self.set_show_result(!self.show_result());
    }

    /// Remove every subscription. Idempotent.
    pub fn dispose(&self) {
        let (subscriber, subscriptions) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state == SessionState::Disposed {
                return;
            }
            inner.state = SessionState::Disposed;
            (inner.subscriber, std::mem::take(&mut inner.subscriptions))
        };
        trace!(message = "session.dispose", subscriber = %subscriber, subscriptions = subscriptions.len());

        if let Some(storage) = self.storage.upgrade() {
            for id in &subscriptions {
                storage.unsubscribe(id, subscriber);
            }
        }
    }
}

impl Drop for EvaluationSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// Evaluate, store the result, and render.
fn refresh(inner: &Rc<RefCell<SessionInner>>, storage: &MathStorage) {
    let latex = {
        let state = inner.borrow();
        if state.state == SessionState::Disposed {
            return;
        }
        state.latex.clone()
    };

    let result = evaluate_expression(&latex, storage);

    {
        let mut state = inner.borrow_mut();
        if state.state == SessionState::Disposed {
            return;
        }
        state.result = result;
        state.version += 1;
        state.state = SessionState::Evaluated;
        trace!(message = "session.evaluate", subscriber = %state.subscriber, version = state.version);
    }
    render(inner);
}

fn render(inner: &Rc<RefCell<SessionInner>>) {
    let (sink, text, visible) = {
        let mut state = inner.borrow_mut();
        let text = format_result(state.result.as_ref().and_then(|r| r.result));
        (state.sink.take(), text, state.show_result)
    };
    let Some(mut sink) = sink else {
        return;
    };
    sink.render(&text, visible);
    inner.borrow_mut().sink = Some(sink);
}

fn subscribe(inner: &Rc<RefCell<SessionInner>>, storage: &Rc<MathStorage>) {
    let (subscriber, used) = {
        let state = inner.borrow();
        let used = state
            .result
            .as_ref()
            .map(|r| r.variables_used.clone())
            .unwrap_or_default();
        (state.subscriber, used)
    };

    for id in &used {
        let weak_inner = Rc::downgrade(inner);
        let weak_storage = Rc::downgrade(storage);
        storage.subscribe(
            id.clone(),
            subscriber,
            Rc::new(move || {
                let (Some(inner), Some(storage)) = (weak_inner.upgrade(), weak_storage.upgrade())
                else {
                    return;
                };
                refresh(&inner, &storage);
            }),
        );
    }
    inner.borrow_mut().subscriptions = used;
}
