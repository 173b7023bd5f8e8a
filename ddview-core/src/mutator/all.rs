use super::chain::chain;
use super::mutator::Mutator;

/// Perform all the given mutators in sequence, as a single transaction.
///
/// An empty list results in a mutator that does nothing.
pub fn all<R, I>(mutators: I) -> Mutator<()>
where
    R: 'static,
    I: IntoIterator<Item = Mutator<R>>,
{
    let mutators: Vec<Mutator<R>> = mutators.into_iter().collect();
    chain(move |tx| {
        for mutator in mutators {
            tx.push(mutator);
        }
    })
}
