//! Feedback-driven patience wrapper.

use tracing::debug;

use crate::dynamic::{BoxedIterator, DynamicIterator};
use crate::limited::Limited;

/// Snapshot of a [`ThresholdIterator`]'s search state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationState {
    /// Best score fed back so far, `-inf` before any feedback.
    pub best: f64,
    /// Elements returned since the last improvement.
    pub count: usize,
    /// Consecutive non-improving elements tolerated.
    pub patience: usize,
}

/// Stops after `patience` consecutive elements without an improving score.
///
/// Callers report each element's score through
/// [`feedback`](ThresholdIterator::feedback). A strictly better score re-arms
/// the wrapped [`Limited`] count, extending the search.
#[derive(Debug, Clone)]
pub struct ThresholdIterator<I> {
    inner: Limited<I>,
    best: f64,
}

impl<I> ThresholdIterator<I> {
    /// Wrap `inner`, tolerating `patience` elements between improvements.
    #[must_use]
    pub fn new(inner: I, patience: usize) -> Self {
        Self {
            inner: Limited::new(inner, patience),
            best: f64::NEG_INFINITY,
        }
    }

    /// Record `score`. Returns true and re-arms the patience count iff the
    /// score strictly exceeds the best seen so far.
    pub fn feedback(&mut self, score: f64) -> bool {
        if score > self.best {
            debug!(previous = self.best, score, "threshold improved");
            self.best = score;
            self.inner.reset_count();
            true
        } else {
            false
        }
    }

    /// Forget the best score; the next finite feedback always improves.
    pub fn reset_best(&mut self) {
        self.best = f64::NEG_INFINITY;
    }

    /// Re-arm the patience count without changing the best score.
    pub fn reset_count(&mut self) {
        self.inner.reset_count();
    }

    /// Best score fed back so far.
    #[must_use]
    pub fn best(&self) -> f64 {
        self.best
    }

    /// Copy of the current search state.
    #[must_use]
    pub fn state(&self) -> IterationState {
        IterationState {
            best: self.best,
            count: self.inner.count(),
            patience: self.inner.limit(),
        }
    }
}

impl<T, I> DynamicIterator<T> for ThresholdIterator<I>
where
    T: 'static,
    I: DynamicIterator<T> + Clone + Send + 'static,
{
    fn has_next(&self) -> bool {
        self.inner.has_next()
    }

    fn next(&mut self) -> Option<T> {
        self.inner.next()
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
