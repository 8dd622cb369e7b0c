//! Composable dynamic iteration and candidate selection.
//!
//! [`DynamicIterator`] is a collection cursor that can grow, shrink and be
//! snapshotted mid-traversal. Traversal policies ([`LinearIterator`],
//! [`RandomIterator`], [`RoundRobinIterator`], [`SpreadIterator`]) own a
//! backing list; wrappers ([`Limited`], [`ThresholdIterator`], [`Siphon`])
//! decorate any other dynamic iterator. [`BestPerTypeSelector`] keeps the
//! best candidates per group with seeded random tie-breaking.

mod dynamic;
mod limited;
mod linear;
mod random;
mod round_robin;
mod seed;
mod selector;
mod siphon;
mod spread;
mod threshold;

pub use dynamic::{BoxedIterator, DynamicIterator, drain};
pub use limited::Limited;
pub use linear::LinearIterator;
pub use random::RandomIterator;
pub use round_robin::RoundRobinIterator;
pub use seed::Seedable;
pub use selector::BestPerTypeSelector;
pub use siphon::Siphon;
pub use spread::SpreadIterator;
pub use threshold::{IterationState, ThresholdIterator};
