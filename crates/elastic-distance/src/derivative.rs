//! Derivative transform, its shared cache, and the derivative DTW measures.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::dtw::Dtw;
use crate::error::DistanceError;
use crate::measure::{DistanceMeasure, unknown_option};
use crate::options::Options;
use crate::series::{TimeSeries, TimeSeriesView};
use crate::wdtw::Wdtw;

/// First-order difference `d[i] = x[i + 1] - x[i]`.
///
/// The result has length `n - 1`; a single-point series maps to `[0.0]` so
/// the output is never empty.
#[must_use]
pub fn derivative(series: TimeSeriesView<'_>) -> TimeSeries {
    let values = series.as_slice();
    if values.len() < 2 {
        return TimeSeries::new_unchecked(vec![0.0]);
    }
    TimeSeries::new_unchecked(values.windows(2).map(|w| w[1] - w[0]).collect())
}

/// Identifies which transform produced a cached entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Transform {
    FirstDifference,
}

/// Exact cache key: the transform plus the bit pattern of every input value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    transform: Transform,
    bits: Box<[u64]>,
}

impl CacheKey {
    fn new(transform: Transform, series: TimeSeriesView<'_>) -> Self {
        Self {
            transform,
            bits: series.as_slice().iter().map(|v| v.to_bits()).collect(),
        }
    }
}

/// Memoized derivative transforms keyed by series content.
///
/// Keys hold the full input, so equal lookups only ever return the
/// transform of identical data. The cache holds at most `capacity`
/// entries; inserting into a full cache empties it first.
///
/// Safe to share between threads. Two threads populating the same key both
/// compute the same value, and the last write wins.
#[derive(Debug)]
pub struct DerivativeCache {
    entries: RwLock<HashMap<CacheKey, Arc<TimeSeries>>>,
    capacity: usize,
}

impl Default for DerivativeCache {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl DerivativeCache {
    /// Entry limit used by [`DerivativeCache::new`].
    pub const DEFAULT_CAPACITY: usize = 4096;

    /// Create an empty cache holding up to [`Self::DEFAULT_CAPACITY`] entries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache holding up to `capacity` entries (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Return the derivative of `series`, computing and storing it on a miss.
    pub fn derivative(&self, series: TimeSeriesView<'_>) -> Arc<TimeSeries> {
        let key = CacheKey::new(Transform::FirstDifference, series);
        if let Some(hit) = self.entries.read().get(&key) {
            return Arc::clone(hit);
        }
        let computed = Arc::new(derivative(series));
        trace!(len = series.len(), "derivative cache miss");
        let mut entries = self.entries.write();
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            debug!(capacity = self.capacity, "derivative cache full, clearing");
            entries.clear();
        }
        entries.insert(key, Arc::clone(&computed));
        computed
    }

    /// Maximum number of cached transforms.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached transforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Return true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every cached transform.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

/// DTW over first-order differences. Accepts the same options as [`Dtw`].
#[derive(Debug, Clone, Default)]
pub struct Ddtw {
    inner: Dtw,
    cache: Arc<DerivativeCache>,
}

impl Ddtw {
    /// Canonical registry name.
    pub const NAME: &'static str = "ddtw";

    /// Wrap `inner` with a private cache.
    #[must_use]
    pub fn new(inner: Dtw) -> Self {
        Self::with_cache(inner, Arc::new(DerivativeCache::new()))
    }

    /// Wrap `inner`, sharing `cache` with other derivative measures.
    #[must_use]
    pub fn with_cache(inner: Dtw, cache: Arc<DerivativeCache>) -> Self {
        Self { inner, cache }
    }

    /// Return the wrapped DTW configuration.
    #[must_use]
    pub fn inner(&self) -> &Dtw {
        &self.inner
    }
}

impl DistanceMeasure for Ddtw {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn distance(&self, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>, cutoff: f64) -> f64 {
        let da = self.cache.derivative(a);
        let db = self.cache.derivative(b);
        self.inner.distance(da.as_view(), db.as_view(), cutoff)
    }

    fn options(&self) -> Options {
        self.inner.options()
    }

    fn set_options(&mut self, options: &Options) -> Result<(), DistanceError> {
        let mut next = self.inner;
        for (key, value) in options.iter() {
            next.apply_option(key, value)
                .ok_or_else(|| unknown_option(Self::NAME, key))??;
        }
        self.inner = next;
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn DistanceMeasure> {
        Box::new(self.clone())
    }
}

/// Weighted DTW over first-order differences. Accepts the same options as [`Wdtw`].
#[derive(Debug, Clone, Default)]
pub struct Wddtw {
    inner: Wdtw,
    cache: Arc<DerivativeCache>,
}

impl Wddtw {
    /// Canonical registry name.
    pub const NAME: &'static str = "wddtw";

    /// Wrap `inner` with a private cache.
    #[must_use]
    pub fn new(inner: Wdtw) -> Self {
        Self::with_cache(inner, Arc::new(DerivativeCache::new()))
    }

    /// Wrap `inner`, sharing `cache` with other derivative measures.
    #[must_use]
    pub fn with_cache(inner: Wdtw, cache: Arc<DerivativeCache>) -> Self {
        Self { inner, cache }
    }

    /// Return the wrapped WDTW configuration.
    #[must_use]
    pub fn inner(&self) -> &Wdtw {
        &self.inner
    }
}

impl DistanceMeasure for Wddtw {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn distance(&self, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>, cutoff: f64) -> f64 {
        let da = self.cache.derivative(a);
        let db = self.cache.derivative(b);
        self.inner
            .weighted_cost(da.as_view().as_slice(), db.as_view().as_slice(), cutoff)
    }

    fn options(&self) -> Options {
        self.inner.options()
    }

    fn set_options(&mut self, options: &Options) -> Result<(), DistanceError> {
        let mut next = self.inner;
        for (key, value) in options.iter() {
            next.apply_option(key, value)
                .ok_or_else(|| unknown_option(Self::NAME, key))??;
        }
        self.inner = next;
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn DistanceMeasure> {
        Box::new(self.clone())
    }
}
