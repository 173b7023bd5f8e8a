//! Reactive Primitives
//!
//! This module implements the watchable graph: plain fields, derived values,
//! fields that can mirror other watchables, and observers.
//!
//! # Concepts
//!
//! ## Watchables
//!
//! Every reactive value implements [`Watchable`]. A watchable can be read, and
//! dispatches two kinds of events: a dirty event when its value may be about
//! to change, and a change event once the change is complete. Dirty events are
//! dispatched while a [`Mutator`](crate::mutator::Mutator) is performed, and
//! change events when it is signaled.
//!
//! ## Plain fields
//!
//! A [`PlainField`] holds a value. Setting it produces a mutator.
//!
//! ## Derived values
//!
//! A [`Derived`] caches the result of a computation over other watchables.
//! Dependencies are discovered while computing, through the [`Watcher`] passed
//! to the computation, and are re-discovered on every recomputation.
//!
//! # Implementation Notes
//!
//! The graph is single threaded. Handles are `Rc` based and listener closures
//! are `Rc<dyn Fn()>`. Whether an upstream edge is strong or weak depends on
//! whether the downstream value has strong listeners itself; see
//! [`Derived`] for details.

mod derived;
mod field;
mod listener;
mod observer;
mod plain_field;
mod watchable;

pub use derived::{Derived, Watcher};
pub use field::{Field, FieldSource};
pub use listener::{Listener, ListenerCounts, ListenerId, ListenerManager, Subscription};
pub use observer::Observer;
pub use plain_field::PlainField;
pub use watchable::{Constant, Watchable, WatchableId};
