//! The dynamic iterator abstraction shared by every traversal policy and wrapper.

/// An iterator whose backing collection can grow and shrink during traversal.
///
/// Unlike [`std::iter::Iterator`], a dynamic iterator supports adding
/// elements mid-traversal, removing the element it last returned, and taking
/// an independent [`snapshot`](DynamicIterator::snapshot) that can be
/// advanced without disturbing the original.
pub trait DynamicIterator<T> {
    /// Return true if [`next`](DynamicIterator::next) would yield an element.
    fn has_next(&self) -> bool;

    /// Advance and return the next element, or `None` when exhausted.
    fn next(&mut self) -> Option<T>;

    /// Add an element to the backing collection.
    fn add(&mut self, item: T);

    /// Remove the element most recently returned by `next`.
    ///
    /// Returns `None` if nothing has been returned since the last removal.
    fn remove(&mut self) -> Option<T>;

    /// Deep copy of the iterator, including its position and any search state.
    fn snapshot(&self) -> BoxedIterator<T>;
}

/// A type-erased dynamic iterator.
pub type BoxedIterator<T> = Box<dyn DynamicIterator<T> + Send>;

impl<T> DynamicIterator<T> for BoxedIterator<T> {
    fn has_next(&self) -> bool {
        (**self).has_next()
    }

    fn next(&mut self) -> Option<T> {
        (**self).next()
    }

    fn add(&mut self, item: T) {
        (**self).add(item);
    }

    fn remove(&mut self) -> Option<T> {
        (**self).remove()
    }

    fn snapshot(&self) -> BoxedIterator<T> {
        (**self).snapshot()
    }
}

impl<T> Clone for BoxedIterator<T> {
    fn clone(&self) -> Self {
        self.snapshot()
    }
}

/// Adapt a dynamic iterator into a standard iterator that drains it.
pub fn drain<T, I>(iterator: &mut I) -> impl Iterator<Item = T>
where
    I: DynamicIterator<T> + ?Sized,
{
    std::iter::from_fn(move || iterator.next())
}
