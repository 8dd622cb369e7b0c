//! Centre-out ordering over an ordered list.

use std::collections::VecDeque;

use crate::dynamic::{BoxedIterator, DynamicIterator};

/// Visits an ordered list in binary-search order: the middle element first,
/// then the middles of the lower and upper remainders, breadth first.
///
/// For five elements the order is `2, 1, 4, 0, 3`. Every element is visited
/// exactly once.
#[derive(Debug, Clone)]
pub struct SpreadIterator<T> {
    items: Vec<Option<T>>,
    ranges: VecDeque<(usize, usize)>,
    last: Option<usize>,
}

impl<T> SpreadIterator<T> {
    /// Create an iterator over `items`.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        let len = items.len();
        let mut ranges = VecDeque::new();
        if len > 0 {
            ranges.push_back((0, len));
        }
        Self {
            items: items.into_iter().map(Some).collect(),
            ranges,
            last: None,
        }
    }

    fn push_range(&mut self, lo: usize, hi: usize) {
        if lo < hi {
            self.ranges.push_back((lo, hi));
        }
    }
}

impl<T: Clone + Send + 'static> DynamicIterator<T> for SpreadIterator<T> {
    fn has_next(&self) -> bool {
        !self.ranges.is_empty()
    }

    fn next(&mut self) -> Option<T> {
        while let Some((lo, hi)) = self.ranges.pop_front() {
            let mid = lo + (hi - lo) / 2;
            self.push_range(lo, mid);
            self.push_range(mid + 1, hi);
            if let Some(item) = &self.items[mid] {
                self.last = Some(mid);
                return Some(item.clone());
            }
        }
        None
    }

    /// Appends `item` after the current list; it is visited once the
    /// already-queued ranges are exhausted.
    fn add(&mut self, item: T) {
        self.items.push(Some(item));
        let index = self.items.len() - 1;
        self.push_range(index, index + 1);
    }

    fn remove(&mut self) -> Option<T> {
        let index = self.last.take()?;
        self.items[index].take()
    }

    fn snapshot(&self) -> BoxedIterator<T> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::drain;

    #[test]
    fn centre_out_order() {
        let mut it = SpreadIterator::new(vec![0, 1, 2, 3, 4]);
        assert_eq!(drain(&mut it).collect::<Vec<_>>(), vec![2, 1, 4, 0, 3]);
    }

    #[test]
    fn upper_partition_includes_last_element() {
        let mut it = SpreadIterator::new(vec![0, 1, 2, 3]);
        let mut order: Vec<_> = drain(&mut it).collect();
        assert_eq!(order, vec![2, 1, 3, 0]);
        order.sort_unstable();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn single_and_empty() {
        let mut one = SpreadIterator::new(vec!['x']);
        assert_eq!(one.next(), Some('x'));
        assert!(!one.has_next());
        let none: SpreadIterator<char> = SpreadIterator::new(vec![]);
        assert!(!none.has_next());
    }

    #[test]
    fn added_items_come_last() {
        let mut it = SpreadIterator::new(vec![1, 2, 3]);
        it.add(9);
        assert_eq!(drain(&mut it).collect::<Vec<_>>(), vec![2, 1, 3, 9]);
    }

    #[test]
    fn remove_returns_last_visited() {
        let mut it = SpreadIterator::new(vec![10, 20, 30]);
        assert_eq!(it.next(), Some(20));
        assert_eq!(it.remove(), Some(20));
        assert_eq!(it.remove(), None);
        assert_eq!(it.next(), Some(10));
    }
}
