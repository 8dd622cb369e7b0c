//! Best-per-group candidate retention with randomized tie-breaking.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::seed::Seedable;

type KeyFn<C, K> = Box<dyn Fn(&C) -> K + Send + Sync>;
type Comparator<C> = Box<dyn Fn(&C, &C) -> Ordering + Send + Sync>;

/// Keeps, per group key, every candidate tied for the best score so far.
///
/// The comparator is called as `compare(new, current_best)`:
///
/// | Ordering | Effect |
/// |---|---|
/// | `Greater` | The group is cleared and `new` becomes its sole best |
/// | `Equal` | `new` is appended as a tie |
/// | `Less` | `new` is discarded |
///
/// [`selected`](BestPerTypeSelector::selected) picks one candidate per group
/// uniformly at random among its ties, reporting groups in first-seen order.
/// The selector is not synchronized; callers feeding it from several threads
/// must serialize `add`.
pub struct BestPerTypeSelector<C, K> {
    key_fn: KeyFn<C, K>,
    compare: Comparator<C>,
    index: HashMap<K, usize>,
    groups: Vec<(K, Vec<C>)>,
    rng: ChaCha8Rng,
    seed: u64,
}

impl<C, K> BestPerTypeSelector<C, K>
where
    K: Eq + Hash + Clone,
{
    /// Create a selector grouping by `key_fn` and ranking with `compare`.
    pub fn new<F, G>(key_fn: F, compare: G, seed: u64) -> Self
    where
        F: Fn(&C) -> K + Send + Sync + 'static,
        G: Fn(&C, &C) -> Ordering + Send + Sync + 'static,
    {
        Self {
            key_fn: Box::new(key_fn),
            compare: Box::new(compare),
            index: HashMap::new(),
            groups: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Offer a candidate. Returns true if it was retained.
    pub fn add(&mut self, candidate: C) -> bool {
        let key = (self.key_fn)(&candidate);
        let Some(&slot) = self.index.get(&key) else {
            self.index.insert(key.clone(), self.groups.len());
            self.groups.push((key, vec![candidate]));
            return true;
        };

        let best = &mut self.groups[slot].1;
        let ordering = best
            .first()
            .map_or(Ordering::Greater, |current| (self.compare)(&candidate, current));
        match ordering {
            Ordering::Greater => {
                best.clear();
                best.push(candidate);
                true
            }
            Ordering::Equal => {
                best.push(candidate);
                true
            }
            Ordering::Less => false,
        }
    }

    /// One candidate per group, ties broken uniformly at random.
    pub fn selected(&mut self) -> Vec<&C> {
        let rng = &mut self.rng;
        self.groups
            .iter()
            .filter(|(_, ties)| !ties.is_empty())
            .map(|(_, ties)| &ties[rng.gen_range(0..ties.len())])
            .collect()
    }

    /// Consume the selector, returning one owned candidate per group.
    pub fn into_selected(mut self) -> Vec<C> {
        let rng = &mut self.rng;
        self.groups
            .into_iter()
            .filter(|(_, ties)| !ties.is_empty())
            .map(|(_, mut ties)| {
                let pick = rng.gen_range(0..ties.len());
                ties.swap_remove(pick)
            })
            .collect()
    }

    /// Consume the selector, returning every retained tie per group in
    /// first-seen group order.
    #[must_use]
    pub fn into_groups(self) -> Vec<(K, Vec<C>)> {
        self.groups
    }

    /// Every candidate currently tied for best in `key`'s group.
    #[must_use]
    pub fn group(&self, key: &K) -> &[C] {
        match self.index.get(key) {
            Some(&slot) => &self.groups[slot].1,
            None => &[],
        }
    }

    /// Number of groups seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Return true if no candidate has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Forget every group. The random stream is left untouched.
    pub fn clear(&mut self) {
        self.index.clear();
        self.groups.clear();
    }
}

impl<C, K> Seedable for BestPerTypeSelector<C, K> {
    fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

impl<C: fmt::Debug, K: fmt::Debug> fmt::Debug for BestPerTypeSelector<C, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BestPerTypeSelector")
            .field("groups", &self.groups)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Scored = (&'static str, u32, usize);

    fn by_score(seed: u64) -> BestPerTypeSelector<Scored, &'static str> {
        BestPerTypeSelector::new(|c: &Scored| c.0, |a: &Scored, b: &Scored| a.1.cmp(&b.1), seed)
    }

    #[test]
    fn keeps_best_per_group() {
        for seed in 0..20 {
            let mut selector = by_score(seed);
            for (i, (group, score)) in [("g1", 5), ("g1", 7), ("g1", 7), ("g2", 3)]
                .into_iter()
                .enumerate()
            {
                selector.add((group, score, i));
            }
            let picked = selector.selected();
            assert_eq!(picked.len(), 2);
            assert_eq!(picked[0].0, "g1");
            assert_eq!(picked[0].1, 7);
            assert!(picked[0].2 == 1 || picked[0].2 == 2);
            assert_eq!(*picked[1], ("g2", 3, 3));
        }
    }

    #[test]
    fn ties_are_retained_and_both_chosen_eventually() {
        let mut selector = by_score(7);
        selector.add(("g", 1, 0));
        selector.add(("g", 1, 1));
        assert_eq!(selector.group(&"g").len(), 2);
        let mut seen = [false; 2];
        for _ in 0..64 {
            seen[selector.selected()[0].2] = true;
        }
        assert_eq!(seen, [true, true]);
    }

    #[test]
    fn worse_candidate_is_discarded() {
        let mut selector = by_score(0);
        assert!(selector.add(("g", 9, 0)));
        assert!(!selector.add(("g", 2, 1)));
        assert!(selector.add(("g", 10, 2)));
        assert_eq!(selector.group(&"g"), &[("g", 10, 2)]);
    }

    #[test]
    fn groups_in_first_seen_order() {
        let mut selector = by_score(0);
        selector.add(("b", 1, 0));
        selector.add(("a", 1, 1));
        selector.add(("b", 2, 2));
        let keys: Vec<_> = selector.into_selected().into_iter().map(|c| c.0).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn into_groups_keeps_every_tie() {
        let mut selector = by_score(0);
        selector.add(("b", 4, 0));
        selector.add(("a", 2, 1));
        selector.add(("b", 4, 2));
        selector.add(("a", 1, 3));
        let groups = selector.into_groups();
        assert_eq!(
            groups,
            vec![("b", vec![("b", 4, 0), ("b", 4, 2)]), ("a", vec![("a", 2, 1)])]
        );
    }

    #[test]
    fn reseeding_reproduces_choices() {
        let mut selector = by_score(3);
        for i in 0..10 {
            selector.add(("g", 1, i));
        }
        selector.set_seed(11);
        let first: Vec<_> = (0..5).map(|_| selector.selected()[0].2).collect();
        selector.set_seed(11);
        let second: Vec<_> = (0..5).map(|_| selector.selected()[0].2).collect();
        assert_eq!(first, second);
        assert_eq!(selector.seed(), 11);
    }

    #[test]
    fn clear_empties() {
        let mut selector = by_score(0);
        selector.add(("g", 1, 0));
        selector.clear();
        assert!(selector.is_empty());
        assert!(selector.group(&"g").is_empty());
    }
}
