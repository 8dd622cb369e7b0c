//! Redirect consumed elements into a second iterator.

use crate::dynamic::{BoxedIterator, DynamicIterator};

/// Forwards every element returned from `source` into `destination` via
/// [`add`](DynamicIterator::add), building a side collection in a single pass.
#[derive(Debug, Clone)]
pub struct Siphon<I, D> {
    source: I,
    destination: D,
}

impl<I, D> Siphon<I, D> {
    /// Pair `source` with the `destination` that collects its output.
    #[must_use]
    pub fn new(source: I, destination: D) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Borrow the source.
    #[must_use]
    pub fn source(&self) -> &I {
        &self.source
    }

    /// Mutably borrow the source, e.g. to feed back into a wrapped search.
    pub fn source_mut(&mut self) -> &mut I {
        &mut self.source
    }

    /// Borrow the destination.
    #[must_use]
    pub fn destination(&self) -> &D {
        &self.destination
    }

    /// Mutably borrow the destination, e.g. to consume it mid-traversal.
    pub fn destination_mut(&mut self) -> &mut D {
        &mut self.destination
    }

    /// Split back into source and destination.
    #[must_use]
    pub fn into_parts(self) -> (I, D) {
        (self.source, self.destination)
    }
}

impl<T, I, D> DynamicIterator<T> for Siphon<I, D>
where
    T: Clone + 'static,
    I: DynamicIterator<T> + Clone + Send + 'static,
    D: DynamicIterator<T> + Clone + Send + 'static,
{
    fn has_next(&self) -> bool {
        self.source.has_next()
    }

    fn next(&mut self) -> Option<T> {
        let item = self.source.next()?;
        self.destination.add(item.clone());
        Some(item)
    }

    fn add(&mut self, item: T) {
        self.source.add(item);
    }

    /// Removes from the source only; the forwarded copy stays in the destination.
    fn remove(&mut self) -> Option<T> {
        self.source.remove()
    }

    fn snapshot(&self) -> BoxedIterator<T> {
        Box::new(self.clone())
    }
}
