//! The watchable contract.
//!
//! Every reactive value implements [`Watchable`]. Invariants for every
//! watchable `w`:
//!
//! 1. Notifies: if two successive reads of `w.get()` differ, `w` dispatched a
//!    change event between them.
//! 2. No redundant events: between two reads, at most one dirty event (and
//!    at most one change event) is dispatched.
//! 3. Dirty before change: `get -> dirty -> change -> get`.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::listener::{Listener, Subscription};
use crate::error::ReactiveError;

/// Identity of a watchable value.
///
/// Clones of a watchable handle share the same ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchableId(u64);

impl WatchableId {
    /// Generate a new unique watchable ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for WatchableId {
    fn default() -> Self {
        Self::new()
    }
}

/// A value that can be read and subscribed to.
pub trait Watchable<T> {
    /// The identity of this value.
    fn id(&self) -> WatchableId;

    /// Read the current value.
    fn try_get(&self) -> Result<T, ReactiveError>;

    /// Read the current value.
    ///
    /// # Panics
    ///
    /// Panics when read during its own dirty dispatch, or from inside its
    /// own computation.
    fn get(&self) -> T {
        match self.try_get() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Register a listener for the value becoming dirty.
    fn on_dirty(&self, listener: Listener, weak: bool) -> Subscription;

    /// Register a listener for the value having changed.
    fn on_change(&self, listener: Listener, weak: bool) -> Subscription;
}

impl<T, W> Watchable<T> for Rc<W>
where
    W: Watchable<T> + ?Sized,
{
    fn id(&self) -> WatchableId {
        (**self).id()
    }

    fn try_get(&self) -> Result<T, ReactiveError> {
        (**self).try_get()
    }

    fn get(&self) -> T {
        (**self).get()
    }

    fn on_dirty(&self, listener: Listener, weak: bool) -> Subscription {
        (**self).on_dirty(listener, weak)
    }

    fn on_change(&self, listener: Listener, weak: bool) -> Subscription {
        (**self).on_change(listener, weak)
    }
}

/// A watchable that never changes.
#[derive(Clone)]
pub struct Constant<T> {
    id: WatchableId,
    value: T,
}

impl<T: Clone> Constant<T> {
    pub fn new(value: T) -> Self {
        Self {
            id: WatchableId::new(),
            value,
        }
    }
}

impl<T: Clone> Watchable<T> for Constant<T> {
    fn id(&self) -> WatchableId {
        self.id
    }

    fn try_get(&self) -> Result<T, ReactiveError> {
        Ok(self.value.clone())
    }

    fn on_dirty(&self, _listener: Listener, _weak: bool) -> Subscription {
        Subscription::noop()
    }

    fn on_change(&self, _listener: Listener, _weak: bool) -> Subscription {
        Subscription::noop()
    }
}

impl<T: fmt::Debug> fmt::Debug for Constant<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constant")
            .field("id", &self.id)
            .field("value", &self.value)
            .finish()
    }
}
