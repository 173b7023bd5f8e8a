use std::cell::RefCell;
use std::rc::Rc;

use super::mutator::Mutator;

/// Execute the given mutators atomically: every mutator is performed before
/// any of them is signaled.
///
/// Unlike [`chain`](super::chain), the mutators are known up front and
/// their results are discarded.
pub fn synchronized<R: 'static>(mutators: Vec<Mutator<R>>) -> Mutator<()> {
    let mutators = Rc::new(RefCell::new(mutators));
    let signals = Rc::clone(&mutators);
    Mutator::new(
        move || {
            for mutator in mutators.borrow_mut().iter_mut() {
                mutator.perform();
            }
        },
        move || {
            for mutator in signals.borrow_mut().iter_mut() {
                mutator.signal();
            }
        },
    )
}

/// Synchronize the mutators collected by `obtain`.
///
/// `obtain` runs immediately, not when the result is performed.
pub fn synchronized_with<F>(obtain: F) -> Mutator<()>
where
    F: FnOnce(&mut Vec<Mutator>),
{
    let mut mutators = Vec::new();
    obtain(&mut mutators);
    synchronized(mutators)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn performs_everything_before_signaling() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut mutator = synchronized_with(|add| {
            for name in ["x", "y"] {
                let p = log.clone();
                let s = log.clone();
                add.push(Mutator::new(
                    move || p.borrow_mut().push(format!("perform {name}")),
                    move || s.borrow_mut().push(format!("signal {name}")),
                ));
            }
        });
        assert!(log.borrow().is_empty());
        mutator.commit();
        assert_eq!(
            *log.borrow(),
            vec!["perform x", "perform y", "signal x", "signal y"]
        );
    }
}
