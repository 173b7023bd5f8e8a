//! A field that either holds a value or mirrors another watchable.

use std::fmt::{self, Debug};
use std::rc::Rc;

use super::derived::Derived;
use super::listener::{Listener, Subscription};
use super::plain_field::PlainField;
use super::watchable::{Watchable, WatchableId};
use crate::error::ReactiveError;
use crate::mutator::Mutator;

/// What a [`Field`] currently reads from.
pub enum FieldSource<T> {
    Plain(T),
    Source(Rc<dyn Watchable<T>>),
}

impl<T: Clone> Clone for FieldSource<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Plain(value) => Self::Plain(value.clone()),
            Self::Source(source) => Self::Source(Rc::clone(source)),
        }
    }
}

/// Sources compare by identity, plain values by value.
impl<T: PartialEq> PartialEq for FieldSource<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Plain(a), Self::Plain(b)) => a == b,
            (Self::Source(a), Self::Source(b)) => a.id() == b.id(),
            _ => false,
        }
    }
}

impl<T: Debug> Debug for FieldSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(value) => f.debug_tuple("Plain").field(value).finish(),
            Self::Source(source) => f.debug_tuple("Source").field(&source.id()).finish(),
        }
    }
}

/// A settable watchable that can also be pointed at another watchable,
/// which it then mirrors.
pub struct Field<T> {
    source: PlainField<FieldSource<T>>,
    value: Derived<T>,
}

impl<T> Field<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create a field holding `value`.
    pub fn new(value: T) -> Self {
        Self::with_equality(FieldSource::Plain(value), |old, new| old == new)
    }

    /// Create a field mirroring `source`.
    pub fn from_source(source: Rc<dyn Watchable<T>>) -> Self {
        Self::with_equality(FieldSource::Source(source), |old, new| old == new)
    }

    /// Create a field whose plain sets are ignored when `equals(old, new)`.
    pub fn with_equality<F>(initial: FieldSource<T>, equals: F) -> Self
    where
        F: Fn(&T, &T) -> bool + 'static,
    {
        let source = PlainField::with_equality(initial, move |old, new| match (old, new) {
            (FieldSource::Plain(a), FieldSource::Plain(b)) => equals(a, b),
            (FieldSource::Source(a), FieldSource::Source(b)) => a.id() == b.id(),
            _ => false,
        });
        let watched = source.clone();
        let value = Derived::new(move |watch, _| match watch.watch(&watched) {
            FieldSource::Plain(value) => value,
            FieldSource::Source(source) => watch.watch(&source),
        });
        Self { source, value }
    }

    /// Build a mutator that stores `value`, detaching any mirrored source.
    pub fn set(&self, value: T) -> Mutator {
        self.source.set(FieldSource::Plain(value))
    }

    /// Build a mutator that makes this field mirror `source`.
    pub fn set_source(&self, source: Rc<dyn Watchable<T>>) -> Mutator {
        self.source.set(FieldSource::Source(source))
    }

    /// Build a mutator that replaces the value with `update(current)`.
    pub fn update<F>(&self, update: F) -> Mutator
    where
        F: FnOnce(&T) -> T + 'static,
    {
        let field = self.clone();
        crate::mutator::chain(move |tx| {
            let next = update(&field.value.get());
            tx.push(field.set(next));
        })
    }

    /// Whether the field currently mirrors another watchable.
    pub fn is_mirroring(&self) -> bool {
        matches!(self.source.get_untracked(), FieldSource::Source(_))
    }

    /// A read-only derived mirror of this field.
    pub fn readonly(&self) -> Derived<T> {
        let value = self.value.clone();
        Derived::new(move |watch, _| watch.watch(&value))
    }
}

impl<T> Watchable<T> for Field<T>
where
    T: Clone + PartialEq + 'static,
{
    fn id(&self) -> WatchableId {
        self.value.id()
    }

    fn try_get(&self) -> Result<T, ReactiveError> {
        self.value.try_get()
    }

    fn on_dirty(&self, listener: Listener, weak: bool) -> Subscription {
        self.value.on_dirty(listener, weak)
    }

    fn on_change(&self, listener: Listener, weak: bool) -> Subscription {
        self.value.on_change(listener, weak)
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            value: self.value.clone(),
        }
    }
}

impl<T: Debug> Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("source", &self.source)
            .field("value", &self.value)
            .finish()
    }
}
