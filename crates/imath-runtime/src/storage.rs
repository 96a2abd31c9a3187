#![forbid(unsafe_code)]

//! Per-document variable store and listener registry.
//!
//! # Design
//!
//! [`MathStorage`] is the shared context every evaluation receives. It is
//! meant to live in an `Rc` owned by the host; sessions keep only `Weak`
//! handles to it. All state sits behind `RefCell`s so the API takes `&self`.
//!
//! # Invariants
//!
//! 1. Each variable keeps its insertion position; redefining it overwrites the
//!    value and aliases in place.
//! 2. Listeners for one variable run in registration order.
//! 3. No `RefCell` borrow is held while a listener runs, so listeners may
//!    evaluate, define, subscribe, and unsubscribe freely.
//! 4. A variable cannot be redefined while its own notification is still on
//!    the stack. This bounds recursion by the number of variables.
//!
//! # Failure Modes
//!
//! - **Listener outlives its session**: listeners hold `Weak` handles and
//!   become no-ops once the session is dropped.
//! - **Alias shared by two variables**: lookups return the first variable in
//!   insertion order that carries the alias.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::id::{IdGenerator, RandomIdGenerator, SubscriberId, VariableId};

/// Callback run when a variable a listener depends on is redefined.
pub type Listener = Rc<dyn Fn()>;

/// A stored variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub value: f64,
    /// Canonical spellings that resolve to this variable.
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{id} is already being updated further up the notification chain")]
pub struct CycleError {
    pub id: VariableId,
}

pub struct MathStorage {
    variables: RefCell<IndexMap<VariableId, Variable>>,
    listeners: RefCell<FxHashMap<VariableId, Vec<(SubscriberId, Listener)>>>,
    /// Variables whose listeners are currently running, outermost first.
    notifying: RefCell<Vec<VariableId>>,
    ids: RefCell<Box<dyn IdGenerator>>,
}

impl Default for MathStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MathStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MathStorage")
            .field("variables", &self.variables.borrow())
            .field("listeners", &self.listeners.borrow().len())
            .field("notifying", &self.notifying.borrow())
            .finish()
    }
}

impl MathStorage {
    /// Empty storage with random identifiers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id_generator(RandomIdGenerator)
    }

    #[must_use]
    pub fn with_id_generator(ids: impl IdGenerator + 'static) -> Self {
        Self {
            variables: RefCell::new(IndexMap::new()),
            listeners: RefCell::new(FxHashMap::default()),
            notifying: RefCell::new(Vec::new()),
            ids: RefCell::new(Box::new(ids)),
        }
    }

    // -----------------------------------------------------------------------
    // Identifiers
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn mint_variable_id(&self) -> VariableId {
        self.ids.borrow_mut().variable_id()
    }

    #[must_use]
    pub fn mint_subscriber_id(&self) -> SubscriberId {
        self.ids.borrow_mut().subscriber_id()
    }

    // -----------------------------------------------------------------------
    // Variables
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.borrow().is_empty()
    }

    #[must_use]
    pub fn variable(&self, id: &VariableId) -> Option<Variable> {
        self.variables.borrow().get(id).cloned()
    }

    #[must_use]
    pub fn value(&self, id: &VariableId) -> Option<f64> {
        self.variables.borrow().get(id).map(|v| v.value)
    }

    /// Snapshot of every variable in insertion order.
    #[must_use]
    pub fn variables(&self) -> Vec<(VariableId, Variable)> {
        self.variables
            .borrow()
            .iter()
            .map(|(id, var)| (id.clone(), var.clone()))
            .collect()
    }

    /// Identifier of the first variable carrying `alias`.
    #[must_use]
    pub fn resolve_alias(&self, alias: &str) -> Option<VariableId> {
        self.variables
            .borrow()
            .iter()
            .find(|(_, var)| var.aliases.iter().any(|a| a == alias))
            .map(|(id, _)| id.clone())
    }

    /// Identifier of the first variable carrying any of `aliases`.
    #[must_use]
    pub fn resolve_any(&self, aliases: &[String]) -> Option<VariableId> {
        self.variables
            .borrow()
            .iter()
            .find(|(_, var)| var.aliases.iter().any(|a| aliases.contains(a)))
            .map(|(id, _)| id.clone())
    }

    /// `(alias, id)` pairs in insertion order, for alias substitution.
    #[must_use]
    pub fn alias_table(&self) -> Vec<(String, VariableId)> {
        self.variables
            .borrow()
            .iter()
            .flat_map(|(id, var)| var.aliases.iter().map(move |a| (a.clone(), id.clone())))
            .collect()
    }

    /// Current values keyed by identifier, as formula bindings.
    #[must_use]
    pub fn bindings(&self) -> FxHashMap<String, f64> {
        self.variables
            .borrow()
            .iter()
            .map(|(id, var)| (id.as_str().to_string(), var.value))
            .collect()
    }

    /// True while listeners of `id` are running.
    #[must_use]
    pub fn is_notifying(&self, id: &VariableId) -> bool {
        self.notifying.borrow().contains(id)
    }

    /// Create or overwrite `id`, then run its listeners.
    ///
    /// Returns once every listener, and everything they triggered in turn,
    /// has finished.
    pub fn define(
        &self,
        id: VariableId,
        value: f64,
        aliases: Vec<String>,
    ) -> Result<(), CycleError> {
        if self.is_notifying(&id) {
            warn!(message = "variable.cycle", id = %id);
            return Err(CycleError { id });
        }

        let reused = {
            let mut variables = self.variables.borrow_mut();
            let reused = variables.contains_key(&id);
            variables.insert(id.clone(), Variable { value, aliases });
            reused
        };
        debug!(message = "variable.define", id = %id, value, reused);

        self.notify(&id);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Listeners
    // -----------------------------------------------------------------------

    pub fn subscribe(&self, id: VariableId, subscriber: SubscriberId, listener: Listener) {
        trace!(message = "listener.subscribe", id = %id, subscriber = %subscriber);
        self.listeners
            .borrow_mut()
            .entry(id)
            .or_default()
            .push((subscriber, listener));
    }

    pub fn unsubscribe(&self, id: &VariableId, subscriber: SubscriberId) {
        trace!(message = "listener.unsubscribe", id = %id, subscriber = %subscriber);
        let mut listeners = self.listeners.borrow_mut();
        if let Some(list) = listeners.get_mut(id) {
            list.retain(|(sub, _)| *sub != subscriber);
            if list.is_empty() {
                listeners.remove(id);
            }
        }
    }

    #[must_use]
    pub fn listener_count(&self, id: &VariableId) -> usize {
        self.listeners.borrow().get(id).map_or(0, Vec::len)
    }

    /// Subscribers registered for `id`, in registration order.
    #[must_use]
    pub fn subscribers(&self, id: &VariableId) -> Vec<SubscriberId> {
        self.listeners
            .borrow()
            .get(id)
            .map(|list| list.iter().map(|(sub, _)| *sub).collect())
            .unwrap_or_default()
    }

    /// Run every listener of `id` in registration order.
    ///
    /// The list is copied first; listeners added or removed while it runs
    /// take effect on the next notification.
    pub fn notify(&self, id: &VariableId) {
        let snapshot: Vec<Listener> = self
            .listeners
            .borrow()
            .get(id)
            .map(|list| list.iter().map(|(_, l)| Rc::clone(l)).collect())
            .unwrap_or_default();
        if snapshot.is_empty() {
            return;
        }
        trace!(message = "variable.notify", id = %id, listeners = snapshot.len());

        self.notifying.borrow_mut().push(id.clone());
        for listener in snapshot {
            listener();
        }
        self.notifying.borrow_mut().pop();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::id::SequentialIdGenerator;

    fn storage() -> MathStorage {
        MathStorage::with_id_generator(SequentialIdGenerator::new())
    }

    fn aliases(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn define_inserts_then_overwrites_in_place() {
        let store = storage();
        let a = store.mint_variable_id();
        let b = store.mint_variable_id();
        store.define(a.clone(), 1.0, aliases(&["a"])).unwrap();
        store.define(b.clone(), 2.0, aliases(&["b"])).unwrap();
        store.define(a.clone(), 3.0, aliases(&["a"])).unwrap();

        let order: Vec<_> = store.variables().into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, [a.clone(), b]);
        assert_eq!(store.value(&a), Some(3.0));
    }

    #[test]
    fn resolve_alias_finds_either_spelling() {
        let store = storage();
        let id = store.mint_variable_id();
        store.define(id.clone(), 5.0, aliases(&["x_{1}", "x_1"])).unwrap();
        assert_eq!(store.resolve_alias("x_1"), Some(id.clone()));
        assert_eq!(store.resolve_alias("x_{1}"), Some(id.clone()));
        assert_eq!(store.resolve_alias("x"), None);
        assert_eq!(store.resolve_any(&aliases(&["y", "x_1"])), Some(id));
    }

    #[test]
    fn first_variable_wins_on_shared_alias() {
        let store = storage();
        let first = store.mint_variable_id();
        let second = store.mint_variable_id();
        store.define(first.clone(), 1.0, aliases(&["a"])).unwrap();
        store.define(second, 2.0, aliases(&["a"])).unwrap();
        assert_eq!(store.resolve_alias("a"), Some(first));
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let store = storage();
        let id = store.mint_variable_id();
        let log = Rc::new(RefCell::new(Vec::new()));
        for n in 1..=3u64 {
            let log = Rc::clone(&log);
            store.subscribe(
                id.clone(),
                SubscriberId::new(n),
                Rc::new(move || log.borrow_mut().push(n)),
            );
        }
        store.define(id, 0.0, Vec::new()).unwrap();
        assert_eq!(*log.borrow(), [1, 2, 3]);
    }

    #[test]
    fn unsubscribe_removes_only_that_subscriber() {
        let store = storage();
        let id = store.mint_variable_id();
        let hits = Rc::new(Cell::new(0));
        for n in 1..=2u64 {
            let hits = Rc::clone(&hits);
            store.subscribe(
                id.clone(),
                SubscriberId::new(n),
                Rc::new(move || hits.set(hits.get() + 1)),
            );
        }
        store.unsubscribe(&id, SubscriberId::new(1));
        assert_eq!(store.subscribers(&id), [SubscriberId::new(2)]);

        store.define(id.clone(), 1.0, Vec::new()).unwrap();
        assert_eq!(hits.get(), 1);

        store.unsubscribe(&id, SubscriberId::new(2));
        assert_eq!(store.listener_count(&id), 0);
    }

    #[test]
    fn listener_may_unsubscribe_itself_during_notify() {
        let store = Rc::new(storage());
        let id = store.mint_variable_id();
        let hits = Rc::new(Cell::new(0));

        let weak = Rc::downgrade(&store);
        let listener_id = id.clone();
        let counter = Rc::clone(&hits);
        store.subscribe(
            id.clone(),
            SubscriberId::new(7),
            Rc::new(move || {
                counter.set(counter.get() + 1);
                if let Some(store) = weak.upgrade() {
                    store.unsubscribe(&listener_id, SubscriberId::new(7));
                }
            }),
        );

        store.define(id.clone(), 1.0, Vec::new()).unwrap();
        store.define(id, 2.0, Vec::new()).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn redefining_during_own_notification_is_a_cycle() {
        let store = Rc::new(storage());
        let id = store.mint_variable_id();
        let outcome = Rc::new(RefCell::new(None));

        let weak = Rc::downgrade(&store);
        let target = id.clone();
        let seen = Rc::clone(&outcome);
        store.subscribe(
            id.clone(),
            SubscriberId::new(1),
            Rc::new(move || {
                if let Some(store) = weak.upgrade() {
                    *seen.borrow_mut() = Some(store.define(target.clone(), 9.0, Vec::new()));
                }
            }),
        );

        store.define(id.clone(), 1.0, Vec::new()).unwrap();
        assert_eq!(
            *outcome.borrow(),
            Some(Err(CycleError { id: id.clone() }))
        );
        assert_eq!(store.value(&id), Some(1.0));
        assert!(!store.is_notifying(&id));
    }

    #[test]
    fn bindings_are_keyed_by_identifier() {
        let store = storage();
        let id = store.mint_variable_id();
        store.define(id.clone(), 4.0, aliases(&["a"])).unwrap();
        assert_eq!(store.bindings().get(id.as_str()), Some(&4.0));
        assert_eq!(store.alias_table(), [("a".to_string(), id)]);
    }
}
