//! Observer Implementation
//!
//! An Observer turns change events of a watchable into callbacks receiving
//! the new and the previous value. Where a [`Derived`](super::Derived) is
//! lazy, an observer is eager: it re-reads its source on every change event,
//! and keeps the source alive through a strong subscription until it is
//! destroyed.

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::{Rc, Weak};

use tracing::trace;

use super::listener::Subscription;
use super::watchable::Watchable;

type Callback<T> = Rc<dyn Fn(&T, &T)>;

struct ObserverInner<T> {
    source: Box<dyn Watchable<T>>,
    last: RefCell<T>,
    callbacks: RefCell<Vec<Callback<T>>>,
    subscription: RefCell<Option<Subscription>>,
}

impl<T: Clone + PartialEq + 'static> ObserverInner<T> {
    fn on_change(&self) {
        let value = self.source.get();
        if *self.last.borrow() == value {
            return;
        }
        let previous = self.last.replace(value.clone());
        trace!(source = ?self.source.id(), "observed change");

        let callbacks = self.callbacks.borrow().clone();
        for callback in callbacks {
            callback(&value, &previous);
        }
    }
}

impl<T> Drop for ObserverInner<T> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.get_mut().take() {
            subscription.unsubscribe();
        }
    }
}

/// Calls back whenever a watchable's value changes.
///
/// # Example
///
/// ```rust,ignore
/// let count = PlainField::new(0);
/// let observer = Observer::new(count.clone())
///     .add(|new, old| println!("{old} -> {new}"));
/// count.set(1).commit(); // prints "0 -> 1"
/// observer.destroy();
/// ```
pub struct Observer<T> {
    inner: Rc<ObserverInner<T>>,
}

impl<T: Clone + PartialEq + 'static> Observer<T> {
    /// Start observing `source`. Its current value is read immediately.
    pub fn new<W>(source: W) -> Self
    where
        W: Watchable<T> + 'static,
    {
        let last = source.get();
        let inner = Rc::new(ObserverInner {
            source: Box::new(source),
            last: RefCell::new(last),
            callbacks: RefCell::new(Vec::new()),
            subscription: RefCell::new(None),
        });

        let this: Weak<ObserverInner<T>> = Rc::downgrade(&inner);
        let subscription = inner.source.on_change(
            Rc::new(move || {
                if let Some(this) = this.upgrade() {
                    this.on_change();
                }
            }),
            false,
        );
        *inner.subscription.borrow_mut() = Some(subscription);
        Self { inner }
    }

    /// Register a callback receiving `(new, old)`.
    pub fn add<F>(self, callback: F) -> Self
    where
        F: Fn(&T, &T) + 'static,
    {
        self.inner.callbacks.borrow_mut().push(Rc::new(callback));
        self
    }

    /// The value seen by the last change event.
    pub fn last(&self) -> T {
        self.inner.last.borrow().clone()
    }

    /// Stop observing. Safe to call more than once.
    pub fn destroy(&self) {
        let subscription = self.inner.subscription.borrow_mut().take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
    }
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Debug> Debug for Observer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("last", &*self.inner.last.borrow())
            .field("callbacks", &self.inner.callbacks.borrow().len())
            .field("active", &self.inner.subscription.borrow().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{Derived, PlainField};

    #[test]
    fn reports_new_and_old_values() {
        let source = PlainField::new(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _observer = Observer::new(source.clone())
            .add(move |new: &i32, old: &i32| sink.borrow_mut().push((*new, *old)));

        source.set(2).commit();
        source.set(5).commit();
        assert_eq!(*seen.borrow(), vec![(2, 1), (5, 2)]);
    }

    #[test]
    fn unchanged_derived_values_are_skipped() {
        let source = PlainField::new(1);
        let parity = {
            let source = source.clone();
            Derived::new(move |watch, _| watch.watch(&source) % 2)
        };
        let calls = Rc::new(RefCell::new(0));
        let sink = calls.clone();
        let _observer = Observer::new(parity).add(move |_, _| *sink.borrow_mut() += 1);

        source.set(3).commit();
        assert_eq!(*calls.borrow(), 0);
        source.set(4).commit();
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn destroy_releases_the_source() {
        let source = PlainField::new(1);
        let observer = Observer::new(source.clone());
        assert_eq!(source.listener_counts().change, 1);

        observer.destroy();
        observer.destroy();
        assert_eq!(source.listener_counts().change, 0);
    }
}
