//! Derived Implementation
//!
//! A Derived is a cached value computed from other watchables.
//!
//! # How Derived Values Work
//!
//! 1. Nothing is computed until the first read.
//!
//! 2. The computation receives a [`Watcher`]. Every value read through
//!    `watch` becomes a dependency, together with the value that was observed.
//!
//! 3. A dirty event from any dependency marks the derived dirty and is
//!    forwarded; change events are forwarded as well.
//!
//! 4. On the next read, a dirty derived re-reads its dependencies. Only when
//!    one of them differs from what was observed does it recompute, dropping
//!    and re-discovering all dependencies.
//!
//! # Lifetimes
//!
//! While nothing holds a strong listener on a derived, its upstream
//! subscriptions are weak: they point at closures owned by the derived
//! itself. Dropping the last handle then reclaims the whole chain. As soon as
//! a strong listener is registered, the upstream subscriptions are replaced
//! by strong ones that keep the derived alive.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt::{self, Debug};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;
use tracing::trace;

use super::listener::{Listener, ListenerCounts, ListenerManager, Subscription};
use super::watchable::{Watchable, WatchableId};
use crate::error::ReactiveError;

type Compute<T> = dyn Fn(&Watcher<'_>, Option<&T>) -> T;

/// A dependency discovered during a computation, type-erased.
trait TrackedDependency {
    fn source_id(&self) -> WatchableId;

    /// Whether a fresh read differs from the observed value.
    fn has_changed(&self) -> bool;

    fn subscribe(&self, dirty: Listener, change: Listener, weak: bool) -> Subscription;
}

struct Tracked<W, U> {
    source: W,
    observed: U,
}

impl<W, U> TrackedDependency for Tracked<W, U>
where
    W: Watchable<U>,
    U: PartialEq,
{
    fn source_id(&self) -> WatchableId {
        self.source.id()
    }

    fn has_changed(&self) -> bool {
        self.source.get() != self.observed
    }

    fn subscribe(&self, dirty: Listener, change: Listener, weak: bool) -> Subscription {
        Subscription::merge(
            self.source.on_dirty(dirty, weak),
            self.source.on_change(change, weak),
        )
    }
}

struct Dependency {
    tracked: Rc<dyn TrackedDependency>,
    subscription: Subscription,
}

trait DependencyRegistry {
    fn computation_id(&self) -> u64;
    fn register(&self, tracked: Rc<dyn TrackedDependency>);
}

/// Dependency collector handed to a derived computation.
pub struct Watcher<'a> {
    registry: &'a dyn DependencyRegistry,
    computation_id: u64,
    found: RefCell<HashSet<WatchableId>>,
}

impl Watcher<'_> {
    /// Read `dependency` and record it as a dependency of the running
    /// computation.
    ///
    /// Watching the same value twice registers it once.
    pub fn watch<W, U>(&self, dependency: &W) -> U
    where
        W: Watchable<U> + Clone + 'static,
        U: Clone + PartialEq + 'static,
    {
        let value = dependency.get();
        if self.registry.computation_id() != self.computation_id {
            return value;
        }
        if !self.found.borrow_mut().insert(dependency.id()) {
            return value;
        }
        self.registry.register(Rc::new(Tracked {
            source: dependency.clone(),
            observed: value.clone(),
        }));
        value
    }

    /// Number of distinct dependencies watched so far.
    pub fn watched(&self) -> usize {
        self.found.borrow().len()
    }
}

struct DerivedInner<T> {
    id: WatchableId,
    this: Weak<DerivedInner<T>>,
    compute: Box<Compute<T>>,
    value: RefCell<Option<T>>,
    dependencies: RefCell<SmallVec<[Dependency; 4]>>,
    computation_id: Cell<u64>,
    initialized: Cell<bool>,
    computing: Cell<bool>,
    weak: Cell<bool>,
    listeners: ListenerManager,
    // Owned here; upstream weak subscriptions only point at them.
    forward_dirty: Listener,
    forward_change: Listener,
}

struct ComputingGuard<'a>(&'a Cell<bool>);

impl Drop for ComputingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<T: Clone + 'static> DerivedInner<T> {
    fn requires_recompute(&self) -> bool {
        if !self.initialized.get() {
            return true;
        }
        if !self.listeners.is_dirty() {
            return false;
        }
        let tracked: SmallVec<[Rc<dyn TrackedDependency>; 4]> = self
            .dependencies
            .borrow()
            .iter()
            .map(|dependency| Rc::clone(&dependency.tracked))
            .collect();
        tracked.iter().any(|dependency| dependency.has_changed())
    }

    fn update_value_if_necessary(&self) -> Result<(), ReactiveError> {
        if self.computing.get() {
            return Err(ReactiveError::CyclicRead);
        }

        let recompute = self.requires_recompute();
        self.listeners.mark_clean();
        if !recompute {
            return Ok(());
        }

        let stale = std::mem::take(&mut *self.dependencies.borrow_mut());
        for dependency in stale {
            dependency.subscription.unsubscribe();
        }

        let computation_id = self.computation_id.get() + 1;
        self.computation_id.set(computation_id);
        trace!(derived = ?self.id, computation_id, "recomputing");

        let watcher = Watcher {
            registry: self,
            computation_id,
            found: RefCell::new(HashSet::new()),
        };
        let next = {
            self.computing.set(true);
            let _guard = ComputingGuard(&self.computing);
            let previous = self.value.borrow();
            (self.compute)(&watcher, previous.as_ref())
        };

        *self.value.borrow_mut() = Some(next);
        self.initialized.set(true);
        Ok(())
    }

    fn create_dependency(&self, tracked: Rc<dyn TrackedDependency>) -> Dependency {
        let subscription = match self.this.upgrade() {
            Some(this) if !self.weak.get() => {
                let dirty = Rc::clone(&this);
                let change = this;
                tracked.subscribe(
                    Rc::new(move || dirty.listeners.call_dirty_listeners()),
                    Rc::new(move || change.listeners.call_change_listeners()),
                    false,
                )
            }
            _ => tracked.subscribe(
                Rc::clone(&self.forward_dirty),
                Rc::clone(&self.forward_change),
                true,
            ),
        };
        Dependency {
            tracked,
            subscription,
        }
    }

    /// Switch upstream subscriptions to match whether this value has strong
    /// listeners.
    fn update_dependencies_weak(&self) {
        let weak = !self.listeners.has_strong_listeners();
        if self.weak.get() == weak {
            return;
        }
        self.weak.set(weak);
        trace!(derived = ?self.id, weak, "switching dependency strength");

        let current = std::mem::take(&mut *self.dependencies.borrow_mut());
        let mut next = SmallVec::with_capacity(current.len());
        for Dependency {
            tracked,
            subscription,
        } in current
        {
            subscription.unsubscribe();
            next.push(self.create_dependency(tracked));
        }
        *self.dependencies.borrow_mut() = next;
    }
}

impl<T: Clone + 'static> DependencyRegistry for DerivedInner<T> {
    fn computation_id(&self) -> u64 {
        self.computation_id.get()
    }

    fn register(&self, tracked: Rc<dyn TrackedDependency>) {
        trace!(derived = ?self.id, dependency = ?tracked.source_id(), "dependency found");
        let dependency = self.create_dependency(tracked);
        self.dependencies.borrow_mut().push(dependency);
    }
}

/// A lazily computed, cached value.
///
/// Cloning a `Derived` produces another handle to the same cache.
///
/// # Example
///
/// ```rust,ignore
/// let count = PlainField::new(2);
/// let c = count.clone();
/// let doubled = Derived::new(move |watch, _| watch.watch(&c) * 2);
/// assert_eq!(doubled.get(), 4);
/// ```
pub struct Derived<T> {
    inner: Rc<DerivedInner<T>>,
}

impl<T: Clone + 'static> Derived<T> {
    /// Create a derived value. `compute` receives the dependency watcher and
    /// the previously computed value, if any.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn(&Watcher<'_>, Option<&T>) -> T + 'static,
    {
        let inner = Rc::new_cyclic(|this: &Weak<DerivedInner<T>>| {
            let on_dirty = this.clone();
            let on_change = this.clone();
            DerivedInner {
                id: WatchableId::new(),
                this: this.clone(),
                compute: Box::new(compute),
                value: RefCell::new(None),
                dependencies: RefCell::new(SmallVec::new()),
                computation_id: Cell::new(0),
                initialized: Cell::new(false),
                computing: Cell::new(false),
                weak: Cell::new(true),
                listeners: ListenerManager::new(),
                forward_dirty: Rc::new(move || {
                    if let Some(inner) = on_dirty.upgrade() {
                        inner.listeners.call_dirty_listeners();
                    }
                }),
                forward_change: Rc::new(move || {
                    if let Some(inner) = on_change.upgrade() {
                        inner.listeners.call_change_listeners();
                    }
                }),
            }
        });
        Self { inner }
    }

    /// Whether the value has been computed at least once.
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.get()
    }

    /// Whether upstream subscriptions are currently weak.
    pub fn is_weak(&self) -> bool {
        self.inner.weak.get()
    }

    /// Number of dependencies found by the last computation.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.borrow().len()
    }

    /// Live listener registrations on this value.
    pub fn listener_counts(&self) -> ListenerCounts {
        self.inner.listeners.listener_counts()
    }

    fn register(&self, listener: Listener, weak: bool, on_change: bool) -> Subscription {
        let listeners = &self.inner.listeners;
        let register = |weak| {
            if on_change {
                listeners.on_change(Rc::clone(&listener), weak)
            } else {
                listeners.on_dirty(Rc::clone(&listener), weak)
            }
        };
        if weak {
            return register(true);
        }

        let subscription = register(false);
        self.inner.update_dependencies_weak();
        let this = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            subscription.unsubscribe();
            if let Some(this) = this.upgrade() {
                this.update_dependencies_weak();
            }
        })
    }
}

impl<T: Clone + 'static> Watchable<T> for Derived<T> {
    fn id(&self) -> WatchableId {
        self.inner.id
    }

    fn try_get(&self) -> Result<T, ReactiveError> {
        self.inner.listeners.check_not_dispatching_dirty()?;
        self.inner.update_value_if_necessary()?;
        self.inner
            .value
            .borrow()
            .clone()
            .ok_or(ReactiveError::CyclicRead)
    }

    fn on_dirty(&self, listener: Listener, weak: bool) -> Subscription {
        self.register(listener, weak, false)
    }

    fn on_change(&self, listener: Listener, weak: bool) -> Subscription {
        self.register(listener, weak, true)
    }
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Debug> Debug for Derived<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derived")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.borrow())
            .field("weak", &self.inner.weak.get())
            .field("dependencies", &self.inner.dependencies.borrow().len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
