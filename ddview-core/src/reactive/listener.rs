//! Listener bookkeeping shared by every watchable.
//!
//! A [`ListenerManager`] keeps four listener sets: strong and weak dirty
//! listeners, and strong and weak change listeners. Weak sets only hold a
//! [`Weak`] to the listener closure, so a listener that nobody else owns is
//! silently dropped from the set the next time it is dispatched or counted.
//! This is what lets unreferenced derived chains disappear on their own.
//!
//! # Event protocol
//!
//! - `call_dirty_listeners` fires at most once between two reads of the
//!   owning watchable (the owner calls [`ListenerManager::mark_clean`] on read).
//! - `call_change_listeners` fires at most once per dirty event.
//! - While dirty listeners run, the owner refuses to be read; see
//!   [`ListenerManager::check_not_dispatching_dirty`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use tracing::trace;

use crate::error::ReactiveError;

/// A listener invoked on dirty or change events.
pub type Listener = Rc<dyn Fn()>;

/// Unique identifier for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Generate a new unique listener ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of live registrations per listener set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerCounts {
    pub dirty: usize,
    pub weak_dirty: usize,
    pub change: usize,
    pub weak_change: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Dirty,
    Change,
}

type StrongSet = RefCell<IndexMap<ListenerId, Listener>>;
type WeakSet = RefCell<IndexMap<ListenerId, Weak<dyn Fn()>>>;

struct ListenerSets {
    dirty: StrongSet,
    weak_dirty: WeakSet,
    change: StrongSet,
    weak_change: WeakSet,
}

impl ListenerSets {
    fn remove(&self, kind: EventKind, weak: bool, id: ListenerId) {
        // The removed listener may hold the last handle to another watchable,
        // so it is dropped only after the set's borrow is released.
        match (kind, weak) {
            (EventKind::Dirty, false) => {
                let removed = self.dirty.borrow_mut().shift_remove(&id);
                drop(removed);
            }
            (EventKind::Dirty, true) => {
                let removed = self.weak_dirty.borrow_mut().shift_remove(&id);
                drop(removed);
            }
            (EventKind::Change, false) => {
                let removed = self.change.borrow_mut().shift_remove(&id);
                drop(removed);
            }
            (EventKind::Change, true) => {
                let removed = self.weak_change.borrow_mut().shift_remove(&id);
                drop(removed);
            }
        }
    }
}

/// Takes a dispatch snapshot: live weak listeners first, then strong ones.
///
/// Dead weak entries are pruned on the way.
fn snapshot(weak: &WeakSet, strong: &StrongSet) -> Vec<Listener> {
    let mut listeners = Vec::new();
    weak.borrow_mut().retain(|_, listener| match listener.upgrade() {
        Some(listener) => {
            listeners.push(listener);
            true
        }
        None => false,
    });
    listeners.extend(strong.borrow().values().cloned());
    listeners
}

fn live_count(weak: &WeakSet) -> usize {
    let mut set = weak.borrow_mut();
    set.retain(|_, listener| listener.strong_count() > 0);
    set.len()
}

/// Restores the dispatch flag even if a listener panics.
struct DispatchGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

/// The listener half of a watchable value.
pub struct ListenerManager {
    sets: Rc<ListenerSets>,
    calling_dirty: Cell<bool>,
    dirty: Cell<bool>,
    /// Whether a change broadcast happened since the last dirty event.
    signaled: Cell<bool>,
}

impl ListenerManager {
    /// Create an empty manager. Values start out dirty, so nothing is
    /// dispatched until the owner has been read once.
    pub fn new() -> Self {
        Self {
            sets: Rc::new(ListenerSets {
                dirty: RefCell::new(IndexMap::new()),
                weak_dirty: RefCell::new(IndexMap::new()),
                change: RefCell::new(IndexMap::new()),
                weak_change: RefCell::new(IndexMap::new()),
            }),
            calling_dirty: Cell::new(false),
            dirty: Cell::new(true),
            signaled: Cell::new(false),
        }
    }

    /// Register a dirty listener.
    ///
    /// With `weak` set, only a weak reference is kept and the caller must keep
    /// the listener alive for it to be invoked.
    pub fn on_dirty(&self, listener: Listener, weak: bool) -> Subscription {
        self.register(EventKind::Dirty, listener, weak)
    }

    /// Register a change listener. See [`ListenerManager::on_dirty`].
    pub fn on_change(&self, listener: Listener, weak: bool) -> Subscription {
        self.register(EventKind::Change, listener, weak)
    }

    fn register(&self, kind: EventKind, listener: Listener, weak: bool) -> Subscription {
        let id = ListenerId::new();
        let sets = &self.sets;
        match (kind, weak) {
            (EventKind::Dirty, false) => {
                sets.dirty.borrow_mut().insert(id, listener);
            }
            (EventKind::Dirty, true) => {
                sets.weak_dirty.borrow_mut().insert(id, Rc::downgrade(&listener));
            }
            (EventKind::Change, false) => {
                sets.change.borrow_mut().insert(id, listener);
            }
            (EventKind::Change, true) => {
                sets.weak_change.borrow_mut().insert(id, Rc::downgrade(&listener));
            }
        }

        let sets = Rc::downgrade(&self.sets);
        Subscription::new(move || {
            if let Some(sets) = sets.upgrade() {
                sets.remove(kind, weak, id);
            }
        })
    }

    /// Mark the owner dirty and notify dirty listeners, unless it already is.
    pub fn call_dirty_listeners(&self) {
        if self.dirty.get() {
            return;
        }
        self.dirty.set(true);
        self.signaled.set(false);

        let listeners = snapshot(&self.sets.weak_dirty, &self.sets.dirty);
        trace!(count = listeners.len(), "dispatching dirty event");

        let _guard = DispatchGuard {
            flag: &self.calling_dirty,
            previous: self.calling_dirty.replace(true),
        };
        for listener in listeners {
            listener();
        }
    }

    /// Notify change listeners, unless a change was already broadcast.
    pub fn call_change_listeners(&self) {
        if self.signaled.get() {
            return;
        }
        self.signaled.set(true);

        let listeners = snapshot(&self.sets.weak_change, &self.sets.change);
        trace!(count = listeners.len(), "dispatching change event");
        for listener in listeners {
            listener();
        }
    }

    /// Fails if the owner is currently dispatching its dirty event.
    pub fn check_not_dispatching_dirty(&self) -> Result<(), ReactiveError> {
        if self.calling_dirty.get() {
            return Err(ReactiveError::ReadDuringDirtyDispatch);
        }
        Ok(())
    }

    /// Whether the owner has been invalidated since its last read.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Record that the owner was read.
    pub fn mark_clean(&self) {
        self.dirty.set(false);
    }

    /// Whether any strong dirty or change listener is registered.
    pub fn has_strong_listeners(&self) -> bool {
        !self.sets.dirty.borrow().is_empty() || !self.sets.change.borrow().is_empty()
    }

    /// Count live registrations, pruning dead weak entries.
    pub fn listener_counts(&self) -> ListenerCounts {
        ListenerCounts {
            dirty: self.sets.dirty.borrow().len(),
            weak_dirty: live_count(&self.sets.weak_dirty),
            change: self.sets.change.borrow().len(),
            weak_change: live_count(&self.sets.weak_change),
        }
    }
}

impl Default for ListenerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ListenerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerManager")
            .field("dirty", &self.dirty.get())
            .field("signaled", &self.signaled.get())
            .field("listeners", &self.listener_counts())
            .finish()
    }
}

/// Handle returned by listener registration.
///
/// Calling [`Subscription::unsubscribe`] removes the listener. Dropping the
/// handle leaves the listener registered.
pub struct Subscription {
    remove: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Create a subscription that runs `remove` when unsubscribed.
    pub fn new<F>(remove: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            remove: Some(Box::new(remove)),
        }
    }

    /// A subscription with nothing to remove.
    pub fn noop() -> Self {
        Self { remove: None }
    }

    /// Combine two subscriptions into one that removes both.
    pub fn merge(first: Subscription, second: Subscription) -> Self {
        Self::new(move || {
            first.unsubscribe();
            second.unsubscribe();
        })
    }

    /// Remove the listener. Safe to call after the source is gone.
    pub fn unsubscribe(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.remove.is_some())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
