//! Count-limited wrapper.

use crate::dynamic::{BoxedIterator, DynamicIterator};

/// Returns at most `limit` elements from the wrapped iterator, until
/// [`reset_count`](Limited::reset_count) re-arms it.
///
/// Resetting does not move the wrapped iterator, which makes this the
/// building block for patience-style early stopping.
#[derive(Debug, Clone)]
pub struct Limited<I> {
    inner: I,
    limit: usize,
    count: usize,
}

impl<I> Limited<I> {
    /// Wrap `inner`, allowing `limit` elements before exhaustion.
    #[must_use]
    pub fn new(inner: I, limit: usize) -> Self {
        Self {
            inner,
            limit,
            count: 0,
        }
    }

    /// Number of elements returned since construction or the last reset.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Configured limit.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Change the limit without touching the count.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    /// Re-arm the limit.
    pub fn reset_count(&mut self) {
        self.count = 0;
    }

    /// Borrow the wrapped iterator.
    #[must_use]
    pub fn inner(&self) -> &I {
        &self.inner
    }

    /// Unwrap, discarding the count.
    #[must_use]
    pub fn into_inner(self) -> I {
        self.inner
    }
}

impl<T, I> DynamicIterator<T> for Limited<I>
where
    T: 'static,
    I: DynamicIterator<T> + Clone + Send + 'static,
{
    fn has_next(&self) -> bool {
        self.count < self.limit && self.inner.has_next()
    }

    fn next(&mut self) -> Option<T> {
        if self.count >= self.limit {
            return None;
        }
        let item = self.inner.next()?;
        self.count += 1;
        Some(item)
    }

    fn add(&mut self, item: T) {
        self.inner.add(item);
    }

    fn remove(&mut self) -> Option<T> {
        self.inner.remove()
    }

    fn snapshot(&self) -> BoxedIterator<T> {
        Box::new(self.clone())
    }
}
