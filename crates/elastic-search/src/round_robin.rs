//! Cyclic traversal.

use crate::dynamic::{BoxedIterator, DynamicIterator};

/// Cycles through the backing list forever, `(index + 1) mod len`.
///
/// Exhausts only when the list becomes empty.
#[derive(Debug, Clone, Default)]
pub struct RoundRobinIterator<T> {
    items: Vec<T>,
    cursor: usize,
    last: Option<usize>,
}

impl<T> RoundRobinIterator<T> {
    /// Create an iterator over `items` starting at the first element.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            cursor: 0,
            last: None,
        }
    }
}

impl<T: Clone + Send + 'static> DynamicIterator<T> for RoundRobinIterator<T> {
    fn has_next(&self) -> bool {
        !self.items.is_empty()
    }

    fn next(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        let index = self.cursor % self.items.len();
        self.cursor = (index + 1) % self.items.len();
        self.last = Some(index);
        Some(self.items[index].clone())
    }

    fn add(&mut self, item: T) {
        self.items.push(item);
    }

    fn remove(&mut self) -> Option<T> {
        let index = self.last.take()?;
        let item = self.items.remove(index);
        if self.cursor > index {
            self.cursor -= 1;
        }
        if self.items.is_empty() {
            self.cursor = 0;
        } else {
            self.cursor %= self.items.len();
        }
        Some(item)
    }

    fn snapshot(&self) -> BoxedIterator<T> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles() {
        let mut it = RoundRobinIterator::new(vec![1, 2, 3]);
        let drawn: Vec<_> = (0..7).filter_map(|_| it.next()).collect();
        assert_eq!(drawn, vec![1, 2, 3, 1, 2, 3, 1]);
    }

    #[test]
    fn remove_keeps_cycle_position() {
        let mut it = RoundRobinIterator::new(vec![1, 2, 3]);
        it.next();
        assert_eq!(it.next(), Some(2));
        assert_eq!(it.remove(), Some(2));
        let drawn: Vec<_> = (0..4).filter_map(|_| it.next()).collect();
        assert_eq!(drawn, vec![3, 1, 3, 1]);
    }

    #[test]
    fn remove_at_wrap_point() {
        let mut it = RoundRobinIterator::new(vec![1, 2, 3]);
        for _ in 0..3 {
            it.next();
        }
        assert_eq!(it.remove(), Some(3));
        assert_eq!(it.next(), Some(1));
    }

    #[test]
    fn exhausts_when_emptied() {
        let mut it = RoundRobinIterator::new(vec!['x']);
        it.next();
        it.remove();
        assert!(!it.has_next());
        assert_eq!(it.next(), None);
    }
}
