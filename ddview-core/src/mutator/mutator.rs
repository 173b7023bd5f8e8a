//! The single-use two-phase mutator.

use std::fmt;

use super::chain::chain;
use crate::error::MutatorError;

type PerformFn<R> = Box<dyn FnOnce() -> R>;
type SignalFn = Box<dyn FnOnce()>;

/// A deferred state change.
///
/// A mutator is performed (values change, dirty events fire) and then
/// signaled (change events fire). Each phase runs at most once.
///
/// # Example
///
/// ```rust,ignore
/// let field = PlainField::new(1);
/// field.set(2).commit();
/// assert_eq!(field.get(), 2);
/// ```
pub struct Mutator<R = ()> {
    perform: Option<PerformFn<R>>,
    signal: Option<SignalFn>,
}

impl<R: 'static> Mutator<R> {
    /// Create a mutator from its two phases.
    pub fn new<P, S>(perform: P, signal: S) -> Self
    where
        P: FnOnce() -> R + 'static,
        S: FnOnce() + 'static,
    {
        Self {
            perform: Some(Box::new(perform)),
            signal: Some(Box::new(signal)),
        }
    }

    /// A mutator that changes nothing and results in `value`.
    pub fn ready(value: R) -> Self {
        Self::new(move || value, || {})
    }

    /// Perform and signal the mutation.
    pub fn try_commit(&mut self) -> Result<R, MutatorError> {
        if self.perform.is_none() {
            return Err(MutatorError::AlreadyPerformed);
        }
        if self.signal.is_none() {
            return Err(MutatorError::AlreadySignaled);
        }
        let result = self.try_perform()?;
        self.try_signal()?;
        Ok(result)
    }

    /// Perform and signal the mutation.
    ///
    /// # Panics
    ///
    /// Panics if either phase already ran.
    pub fn commit(&mut self) -> R {
        or_panic(self.try_commit())
    }

    /// Apply the change and dispatch dirty events, without signaling.
    ///
    /// Must be followed by [`Mutator::signal`], otherwise observers never
    /// learn about the change.
    pub fn try_perform(&mut self) -> Result<R, MutatorError> {
        let perform = self.perform.take().ok_or(MutatorError::AlreadyPerformed)?;
        Ok(perform())
    }

    /// See [`Mutator::try_perform`].
    ///
    /// # Panics
    ///
    /// Panics if the mutator was already performed.
    pub fn perform(&mut self) -> R {
        or_panic(self.try_perform())
    }

    /// Dispatch change events. Requires the mutator to be performed first.
    pub fn try_signal(&mut self) -> Result<(), MutatorError> {
        if self.perform.is_some() {
            return Err(MutatorError::SignalBeforePerform);
        }
        let signal = self.signal.take().ok_or(MutatorError::AlreadySignaled)?;
        signal();
        Ok(())
    }

    /// See [`Mutator::try_signal`].
    ///
    /// # Panics
    ///
    /// Panics if the mutator was not performed, or was already signaled.
    pub fn signal(&mut self) {
        or_panic(self.try_signal())
    }

    /// Whether the perform phase already ran.
    pub fn is_performed(&self) -> bool {
        self.perform.is_none()
    }

    /// Transform the result of this mutator.
    pub fn map<S, F>(self, f: F) -> Mutator<S>
    where
        S: 'static,
        F: FnOnce(R) -> S + 'static,
    {
        Mutator {
            perform: self
                .perform
                .map(|perform| Box::new(move || f(perform())) as PerformFn<S>),
            signal: self.signal,
        }
    }

    /// Sequence a second mutator, built from this mutator's result, into
    /// the same transaction.
    pub fn and_then<S, F>(self, next: F) -> Mutator<S>
    where
        S: 'static,
        F: FnOnce(R) -> Mutator<S> + 'static,
    {
        chain(move |tx| {
            let result = tx.push(self);
            tx.push(next(result))
        })
    }
}

impl Mutator<()> {
    /// A mutator that does nothing.
    pub fn dummy() -> Self {
        Self::new(|| {}, || {})
    }
}

fn or_panic<T>(result: Result<T, MutatorError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}

impl<R> fmt::Debug for Mutator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutator")
            .field("performed", &self.perform.is_none())
            .field("signaled", &self.signal.is_none())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
