//! Error types.
//!
//! Protocol violations (reading a watchable mid-invalidation, committing a
//! mutator twice) are programmer errors. Every operation that can hit one has
//! a `try_*` form returning these errors and a plain form that panics with
//! the error's message.

use thiserror::Error;

/// Errors raised while reading a watchable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// A value was read while it was dispatching its own dirty event.
    #[error("watchable values may not be accessed during their dirty dispatch event")]
    ReadDuringDirtyDispatch,

    /// A derived value was read from inside its own computation.
    #[error("derived value was read from inside its own computation")]
    CyclicRead,
}

/// Errors raised when a mutator is used more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MutatorError {
    #[error("mutations can only be performed once")]
    AlreadyPerformed,

    #[error("mutations can only be signaled once")]
    AlreadySignaled,

    #[error("mutations may only signal after being performed")]
    SignalBeforePerform,
}

/// Errors raised while reading or writing persisted profiles.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("malformed profile data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("profile storage failed: {0}")]
    Io(#[from] std::io::Error),
}
