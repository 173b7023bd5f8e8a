//! Imperative chaining of mutators into one transaction.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::mutator::Mutator;

type PendingSignal = Box<dyn FnOnce()>;

/// Collects mutators pushed from inside a [`chain`] callback.
///
/// Every pushed mutator is performed right away, so its result (and the new
/// state it produced) is visible to the rest of the callback. Its signal is
/// held back until the whole chain signals.
pub struct Transaction {
    signals: Vec<PendingSignal>,
}

impl Transaction {
    fn new() -> Self {
        Self {
            signals: Vec::new(),
        }
    }

    /// Perform `mutator` now and defer its signal to the end of the chain.
    ///
    /// # Panics
    ///
    /// Panics if the mutator was already performed.
    pub fn push<O: 'static>(&mut self, mut mutator: Mutator<O>) -> O {
        let result = mutator.perform();
        self.signals.push(Box::new(move || mutator.signal()));
        result
    }

    /// Number of mutators pushed so far.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("pending_signals", &self.signals.len())
            .finish()
    }
}

/// Chain mutators together using imperative code.
///
/// The returned mutator runs `obtain` when performed; everything pushed
/// inside is performed in program order. When signaled, the pushed mutators
/// are signaled in the same order. No change event fires before every
/// pushed mutation has been applied.
///
/// ```rust,ignore
/// let mut mutator = chain(move |tx| {
///     tx.push(a.set(1));
///     let id = tx.push(layout.add_panel("root", PanelSide::East, 1.0, None));
///     id
/// });
/// let id = mutator.commit();
/// ```
pub fn chain<R, F>(obtain: F) -> Mutator<R>
where
    R: 'static,
    F: FnOnce(&mut Transaction) -> R + 'static,
{
    let pending: Rc<RefCell<Vec<PendingSignal>>> = Rc::default();
    let collected = Rc::clone(&pending);
    Mutator::new(
        move || {
            let mut tx = Transaction::new();
            let result = obtain(&mut tx);
            *collected.borrow_mut() = tx.signals;
            result
        },
        move || {
            let signals = std::mem::take(&mut *pending.borrow_mut());
            for signal in signals {
                signal();
            }
        },
    )
}
