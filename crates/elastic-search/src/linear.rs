//! Forward traversal over a backing list.

use crate::dynamic::{BoxedIterator, DynamicIterator};

/// Returns elements in insertion order. Elements added during traversal are
/// visited once the cursor reaches them.
#[derive(Debug, Clone, Default)]
pub struct LinearIterator<T> {
    items: Vec<T>,
    cursor: usize,
    last: Option<usize>,
}

impl<T> LinearIterator<T> {
    /// Create an iterator over `items`.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            cursor: 0,
            last: None,
        }
    }

    /// Number of elements in the backing list, visited or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Return true if the backing list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Restart from the first element.
    pub fn rewind(&mut self) {
        self.cursor = 0;
        self.last = None;
    }
}

impl<T> FromIterator<T> for LinearIterator<T> {
    fn from_iter<It: IntoIterator<Item = T>>(iter: It) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<T: Clone + Send + 'static> DynamicIterator<T> for LinearIterator<T> {
    fn has_next(&self) -> bool {
        self.cursor < self.items.len()
    }

    fn next(&mut self) -> Option<T> {
        let item = self.items.get(self.cursor)?.clone();
        self.last = Some(self.cursor);
        self.cursor += 1;
        Some(item)
    }

    fn add(&mut self, item: T) {
        self.items.push(item);
    }

    fn remove(&mut self) -> Option<T> {
        let index = self.last.take()?;
        self.cursor -= 1;
        Some(self.items.remove(index))
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
    fn visits_in_order() {
        let mut it = LinearIterator::new(vec![1, 2, 3]);
        assert_eq!(drain(&mut it).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(!it.has_next());
    }

    #[test]
    fn empty_is_exhausted() {
        let it: LinearIterator<u8> = LinearIterator::new(vec![]);
        assert!(!it.has_next());
    }

    #[test]
    fn remove_drops_last_returned() {
        let mut it = LinearIterator::new(vec!['a', 'b', 'c']);
        assert_eq!(it.next(), Some('a'));
        assert_eq!(it.next(), Some('b'));
        assert_eq!(it.remove(), Some('b'));
        assert_eq!(it.remove(), None);
        assert_eq!(it.next(), Some('c'));
        assert_eq!(it.len(), 2);
        it.rewind();
        assert_eq!(drain(&mut it).collect::<String>(), "ac");
    }

    #[test]
    fn added_items_are_visited() {
        let mut it = LinearIterator::new(vec![1]);
        assert_eq!(it.next(), Some(1));
        assert!(!it.has_next());
        it.add(2);
        assert_eq!(it.next(), Some(2));
    }

    #[test]
    fn snapshot_is_independent() {
        let mut it = LinearIterator::new(vec![1, 2, 3]);
        it.next();
        let mut snap = it.snapshot();
        assert_eq!(snap.next(), Some(2));
        assert_eq!(snap.next(), Some(3));
        assert_eq!(it.next(), Some(2));
    }
}
