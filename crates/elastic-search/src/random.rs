//! Uniformly random traversal driven by a seeded ChaCha8 generator.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::dynamic::{BoxedIterator, DynamicIterator};
use crate::seed::Seedable;

/// Draws a uniformly random element on each call.
///
/// By default elements are drawn with replacement, so the iterator only
/// exhausts once every element has been [`remove`](DynamicIterator::remove)d.
/// [`RandomIterator::without_replacement`] removes each drawn element
/// automatically, visiting every element exactly once in random order.
#[derive(Debug, Clone)]
pub struct RandomIterator<T> {
    items: Vec<T>,
    rng: ChaCha8Rng,
    seed: u64,
    replacement: bool,
    last: Option<usize>,
}

impl<T> RandomIterator<T> {
    /// Create a with-replacement iterator over `items`.
    #[must_use]
    pub fn new(items: Vec<T>, seed: u64) -> Self {
        Self {
            items,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            replacement: true,
            last: None,
        }
    }

    /// Create an iterator that never returns the same element twice.
    #[must_use]
    pub fn without_replacement(items: Vec<T>, seed: u64) -> Self {
        Self {
            replacement: false,
            ..Self::new(items, seed)
        }
    }

    /// Number of elements that can still be drawn.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Return true if no element can be drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Clone + Send + 'static> DynamicIterator<T> for RandomIterator<T> {
    fn has_next(&self) -> bool {
        !self.items.is_empty()
    }

    fn next(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..self.items.len());
        if self.replacement {
            self.last = Some(index);
            Some(self.items[index].clone())
        } else {
            self.last = None;
            Some(self.items.swap_remove(index))
        }
    }

    fn add(&mut self, item: T) {
        self.items.push(item);
    }

    fn remove(&mut self) -> Option<T> {
        let index = self.last.take()?;
        Some(self.items.swap_remove(index))
    }

    fn snapshot(&self) -> BoxedIterator<T> {
        Box::new(self.clone())
    }
}

impl<T> Seedable for RandomIterator<T> {
    fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::dynamic::drain;

    #[test]
    fn with_replacement_never_exhausts_on_its_own() {
        let mut it = RandomIterator::new(vec![1, 2, 3], 7);
        for _ in 0..50 {
            assert!(it.next().is_some());
        }
        assert!(it.has_next());
    }

    #[test]
    fn remove_shrinks_until_empty() {
        let mut it = RandomIterator::new(vec![1, 2, 3], 7);
        let mut seen = HashSet::new();
        while it.has_next() {
            let v = it.next().unwrap();
            assert_eq!(it.remove(), Some(v));
            seen.insert(v);
        }
        assert_eq!(seen, HashSet::from([1, 2, 3]));
    }

    #[test]
    fn without_replacement_visits_each_once() {
        let mut it = RandomIterator::without_replacement((0..20).collect::<Vec<i32>>(), 3);
        let mut drawn: Vec<i32> = drain(&mut it).collect();
        assert_eq!(drawn.len(), 20);
        drawn.sort_unstable();
        assert_eq!(drawn, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = RandomIterator::new((0..100).collect::<Vec<u32>>(), 42);
        let mut b = RandomIterator::new((0..100).collect::<Vec<u32>>(), 42);
        let xs: Vec<_> = (0..10).filter_map(|_| a.next()).collect();
        let ys: Vec<_> = (0..10).filter_map(|_| b.next()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn reseeding_restarts_the_stream() {
        let mut it = RandomIterator::new((0..100).collect::<Vec<u32>>(), 9);
        let first: Vec<_> = (0..5).filter_map(|_| it.next()).collect();
        it.set_seed(9);
        let again: Vec<_> = (0..5).filter_map(|_| it.next()).collect();
        assert_eq!(first, again);
        assert_eq!(it.seed(), 9);
    }

    #[test]
    fn snapshot_replays_the_same_draws() {
        let mut it = RandomIterator::new((0..100).collect::<Vec<u32>>(), 1);
        it.next();
        let mut snap = it.snapshot();
        let a: Vec<_> = (0..5).filter_map(|_| it.next()).collect();
        let b: Vec<_> = (0..5).filter_map(|_| snap.next()).collect();
        assert_eq!(a, b);
    }
}
