//! Property tests for the iteration wrappers and the candidate selector.

use std::cmp::Ordering;

use elastic_search::{
    BestPerTypeSelector, DynamicIterator, Limited, LinearIterator, RandomIterator,
    RoundRobinIterator, SpreadIterator, ThresholdIterator, drain,
};
use proptest::prelude::*;

const MIN_PROPTEST_CASES: u32 = 64;

fn proptest_cases() -> u32 {
    std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .map(|parsed| parsed.max(MIN_PROPTEST_CASES))
        .unwrap_or(MIN_PROPTEST_CASES)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: proptest_cases(),
        ..ProptestConfig::default()
    })]

    #[test]
    fn spread_visits_each_element_once(len in 0usize..200) {
        let mut it = SpreadIterator::new((0..len).collect());
        let mut visited: Vec<usize> = drain(&mut it).collect();
        prop_assert_eq!(visited.len(), len);
        if len > 0 {
            prop_assert_eq!(visited[0], len / 2);
        }
        visited.sort_unstable();
        prop_assert_eq!(visited, (0..len).collect::<Vec<_>>());
    }

    #[test]
    fn random_without_replacement_is_a_permutation(len in 0usize..100, seed in any::<u64>()) {
        let mut it = RandomIterator::without_replacement((0..len).collect(), seed);
        let mut visited: Vec<usize> = drain(&mut it).collect();
        visited.sort_unstable();
        prop_assert_eq!(visited, (0..len).collect::<Vec<_>>());
    }

    #[test]
    fn limited_stops_after_exactly_limit(limit in 0usize..20, extra in 1usize..20) {
        let mut it = Limited::new(LinearIterator::new((0..limit + extra).collect::<Vec<_>>()), limit);
        for _ in 0..limit {
            prop_assert!(it.has_next());
            prop_assert!(it.next().is_some());
        }
        prop_assert!(!it.has_next());
        it.reset_count();
        prop_assert!(it.has_next());
    }

    #[test]
    fn threshold_feedback_is_strict_improvement(scores in prop::collection::vec(-10.0f64..10.0, 1..40)) {
        let mut it = ThresholdIterator::new(RoundRobinIterator::new(vec![()]), 1000);
        let mut best = f64::NEG_INFINITY;
        for score in scores {
            let _ = it.next();
            let improved = it.feedback(score);
            prop_assert_eq!(improved, score > best);
            if improved {
                best = score;
                prop_assert_eq!(it.state().count, 0);
            }
            prop_assert_eq!(it.best(), best);
        }
    }

    #[test]
    fn snapshot_is_independent(len in 1usize..30, advance in 0usize..30) {
        let mut original = LinearIterator::new((0..len).collect::<Vec<_>>());
        for _ in 0..advance.min(len) {
            original.next();
        }
        let mut copy = original.snapshot();
        let rest_copy: Vec<usize> = drain(&mut copy).collect();
        let rest_original: Vec<usize> = drain(&mut original).collect();
        prop_assert_eq!(rest_copy, rest_original);
    }

    #[test]
    fn selector_keeps_only_group_maxima(
        candidates in prop::collection::vec((0u8..4, 0u32..6), 1..50),
        seed in any::<u64>(),
    ) {
        let mut selector = BestPerTypeSelector::new(
            |c: &(u8, u32)| c.0,
            |a: &(u8, u32), b: &(u8, u32)| a.1.cmp(&b.1),
            seed,
        );
        for &c in &candidates {
            selector.add(c);
        }
        for picked in selector.selected() {
            let max = candidates
                .iter()
                .filter(|c| c.0 == picked.0)
                .map(|c| c.1)
                .max()
                .unwrap_or(0);
            prop_assert_eq!(picked.1.cmp(&max), Ordering::Equal);
        }
    }
}
