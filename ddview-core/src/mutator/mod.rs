//! Mutators
//!
//! A mutator is a deferred, single-use state change split into two phases:
//!
//! 1. `perform` applies the change and dispatches dirty events.
//! 2. `signal` dispatches change events.
//!
//! Splitting the phases lets several mutations be batched: every mutation of
//! a transaction is performed first, and only then is anything signaled, so
//! observers never see a half-applied multi-field update.
//!
//! # Combinators
//!
//! - [`chain`]: imperative composition; pushed mutators are performed
//!   immediately (their results are available to the callback) and signaled
//!   together at the end.
//! - [`all`]: commit a fixed list of mutators as one transaction.
//! - [`synchronized`]: perform a list, then signal the list.

mod all;
mod chain;
#[allow(clippy::module_inception)]
mod mutator;
mod synchronized;

pub use all::all;
pub use chain::{chain, Transaction};
pub use mutator::Mutator;
pub use synchronized::{synchronized, synchronized_with};
