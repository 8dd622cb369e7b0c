//! The configurable distance measure abstraction shared by every kernel.

use std::fmt::Debug;

use crate::error::DistanceError;
use crate::options::Options;
use crate::series::TimeSeriesView;

/// A configurable pairwise distance between two time series.
///
/// Implementations hold only configuration (plus shared caches), so a
/// single instance may be used from many threads at once.
///
/// # Cutoff contract
///
/// `distance(a, b, cutoff)` returns the exact distance whenever it is
/// `<= cutoff`. Once a kernel can prove the distance exceeds `cutoff` it may
/// stop early and return `f64::INFINITY`. Passing `f64::INFINITY` as the
/// cutoff always yields the exact distance.
pub trait DistanceMeasure: Debug + Send + Sync {
    /// Canonical registry name, e.g. `"dtw"`.
    fn name(&self) -> &'static str;

    /// Compute the distance between `a` and `b`, abandoning above `cutoff`.
    fn distance(&self, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>, cutoff: f64) -> f64;

    /// Compute the exact distance with no cutoff.
    fn distance_unbounded(&self, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>) -> f64 {
        self.distance(a, b, f64::INFINITY)
    }

    /// Current configuration as an option vector.
    fn options(&self) -> Options;

    /// Apply an option vector.
    ///
    /// Every pair is validated before any is applied, so a failed call leaves
    /// the measure unchanged.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::UnknownOption`] | A key is not recognised by this measure |
    /// | [`DistanceError::InvalidOptionValue`] | A value cannot be parsed or is out of range |
    fn set_options(&mut self, options: &Options) -> Result<(), DistanceError>;

    /// Clone into a new boxed trait object.
    fn clone_box(&self) -> Box<dyn DistanceMeasure>;
}

impl Clone for Box<dyn DistanceMeasure> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Build the error for an option key that `measure` does not recognise.
pub(crate) fn unknown_option(measure: &'static str, key: &str) -> DistanceError {
    DistanceError::UnknownOption {
        measure,
        key: key.to_string(),
    }
}
