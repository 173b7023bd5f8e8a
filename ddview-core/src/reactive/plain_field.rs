//! PlainField Implementation
//!
//! A PlainField is the mutable leaf of the reactive graph. It holds a value
//! and hands out mutators to change it.
//!
//! # How Fields Change
//!
//! 1. `set(value)` builds a [`Mutator`]; nothing happens yet.
//!
//! 2. Performing the mutator compares the new value with the stored one.
//!    Equal values are ignored entirely. Otherwise dirty listeners are
//!    called, and only then is the value replaced.
//!
//! 3. Signaling the mutator calls the change listeners, if the perform
//!    phase actually changed the value.

use std::cell::{Cell, RefCell};
use std::fmt::{self, Debug};
use std::rc::Rc;

use tracing::trace;

use super::derived::Derived;
use super::listener::{Listener, ListenerCounts, ListenerManager, Subscription};
use super::watchable::{Watchable, WatchableId};
use crate::error::ReactiveError;
use crate::mutator::Mutator;

type Equality<T> = Box<dyn Fn(&T, &T) -> bool>;

struct FieldInner<T> {
    id: WatchableId,
    value: RefCell<T>,
    equals: Equality<T>,
    listeners: ListenerManager,
}

/// A watchable cell holding a value of type `T`.
///
/// Cloning a `PlainField` produces another handle to the same cell.
///
/// # Example
///
/// ```rust,ignore
/// let count = PlainField::new(0);
/// count.set(5).commit();
/// assert_eq!(count.get(), 5);
/// ```
pub struct PlainField<T> {
    inner: Rc<FieldInner<T>>,
}

impl<T> PlainField<T>
where
    T: Clone + 'static,
{
    /// Create a new field that ignores sets to an equal value.
    pub fn new(value: T) -> Self
    where
        T: PartialEq,
    {
        Self::with_equality(value, |old, new| old == new)
    }

    /// Create a new field with a custom equivalence check.
    ///
    /// Sets for which `equals(old, new)` holds are ignored.
    pub fn with_equality<F>(value: T, equals: F) -> Self
    where
        F: Fn(&T, &T) -> bool + 'static,
    {
        Self {
            inner: Rc::new(FieldInner {
                id: WatchableId::new(),
                value: RefCell::new(value),
                equals: Box::new(equals),
                listeners: ListenerManager::new(),
            }),
        }
    }

    /// Build a mutator that replaces the current value.
    pub fn set(&self, value: T) -> Mutator {
        let changed = Rc::new(Cell::new(false));
        let perform_changed = Rc::clone(&changed);
        let perform_inner = Rc::clone(&self.inner);
        let signal_inner = Rc::clone(&self.inner);

        Mutator::new(
            move || {
                let inner = perform_inner;
                if (inner.equals)(&*inner.value.borrow(), &value) {
                    return;
                }
                trace!(field = ?inner.id, "field value changed");
                inner.listeners.call_dirty_listeners();
                *inner.value.borrow_mut() = value;
                perform_changed.set(true);
            },
            move || {
                if changed.get() {
                    signal_inner.listeners.call_change_listeners();
                }
            },
        )
    }

    /// Build a mutator that replaces the value with `update(current)`.
    ///
    /// The update function runs when the mutator is performed.
    pub fn update<F>(&self, update: F) -> Mutator
    where
        F: FnOnce(&T) -> T + 'static,
    {
        let field = self.clone();
        crate::mutator::chain(move |tx| {
            let next = update(&*field.inner.value.borrow());
            tx.push(field.set(next));
        })
    }

    /// Read the value without marking it clean.
    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// A read-only derived mirror of this field.
    pub fn readonly(&self) -> Derived<T>
    where
        T: PartialEq,
    {
        let source = self.clone();
        Derived::new(move |watch, _| watch.watch(&source))
    }

    /// Live listener registrations on this field.
    pub fn listener_counts(&self) -> ListenerCounts {
        self.inner.listeners.listener_counts()
    }
}

impl<T> Watchable<T> for PlainField<T>
where
    T: Clone + 'static,
{
    fn id(&self) -> WatchableId {
        self.inner.id
    }

    fn try_get(&self) -> Result<T, ReactiveError> {
        self.inner.listeners.check_not_dispatching_dirty()?;
        self.inner.listeners.mark_clean();
        Ok(self.inner.value.borrow().clone())
    }

    fn on_dirty(&self, listener: Listener, weak: bool) -> Subscription {
        self.inner.listeners.on_dirty(listener, weak)
    }

    fn on_change(&self, listener: Listener, weak: bool) -> Subscription {
        self.inner.listeners.on_change(listener, weak)
    }
}

impl<T> Clone for PlainField<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Debug> Debug for PlainField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainField")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.borrow())
            .field("listeners", &self.inner.listeners)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReactiveError;

    fn recorder(log: &Rc<RefCell<Vec<&'static str>>>, event: &'static str) -> Listener {
        let log = log.clone();
        Rc::new(move || log.borrow_mut().push(event))
    }

    #[test]
    fn field_get_and_set() {
        let field = PlainField::new(0);
        assert_eq!(field.get(), 0);

        field.set(42).commit();
        assert_eq!(field.get(), 42);
    }

    #[test]
    fn field_dispatches_dirty_before_change() {
        let field = PlainField::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let _d = field.on_dirty(recorder(&log, "dirty"), false);
        let _c = field.on_change(recorder(&log, "change"), false);

        field.get();
        let mut mutator = field.set(1);
        mutator.perform();
        assert_eq!(*log.borrow(), vec!["dirty"]);
        mutator.signal();
        assert_eq!(*log.borrow(), vec!["dirty", "change"]);
    }

    #[test]
    fn equal_values_are_ignored() {
        let field = PlainField::new(3);
        let log = Rc::new(RefCell::new(Vec::new()));
        let _d = field.on_dirty(recorder(&log, "dirty"), false);
        let _c = field.on_change(recorder(&log, "change"), false);

        field.get();
        field.set(3).commit();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn custom_equality_is_used() {
        let field = PlainField::with_equality(10, |old: &i32, new: &i32| old / 10 == new / 10);
        field.set(15).commit();
        assert_eq!(field.get(), 10);
        field.set(21).commit();
        assert_eq!(field.get(), 21);
    }

    #[test]
    fn reading_during_dirty_dispatch_fails() {
        let field = PlainField::new(0);
        let observed = Rc::new(RefCell::new(None));

        let reader = field.clone();
        let slot = observed.clone();
        let _d = field.on_dirty(
            Rc::new(move || *slot.borrow_mut() = Some(reader.try_get())),
            false,
        );

        field.get();
        field.set(1).commit();
        assert_eq!(
            *observed.borrow(),
            Some(Err(ReactiveError::ReadDuringDirtyDispatch))
        );
    }

    #[test]
    fn update_uses_current_value() {
        let field = PlainField::new(10);
        field.update(|v| v + 5).commit();
        assert_eq!(field.get(), 15);
    }

    #[test]
    fn clone_shares_state() {
        let field1 = PlainField::new(0);
        let field2 = field1.clone();

        field1.set(42).commit();
        assert_eq!(field2.get(), 42);
        assert_eq!(field1.id(), field2.id());
    }
}
