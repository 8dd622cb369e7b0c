//! Validated series handed to every distance measure.

use std::ops::Index;

use crate::error::DistanceError;

/// A finite, non-empty sequence of observations.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries(Vec<f64>);

impl TimeSeries {
    /// Take ownership of `values` after checking them.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::EmptySeries`] | `values` is empty |
    /// | [`DistanceError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn new(values: Vec<f64>) -> Result<Self, DistanceError> {
        validate(&values)?;
        Ok(Self(values))
    }

    /// Borrow as a [`TimeSeriesView`] without copying.
    #[must_use]
    pub fn as_view(&self) -> TimeSeriesView<'_> {
        TimeSeriesView(&self.0)
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wrap values produced by a transform of an already valid series.
    pub(crate) fn new_unchecked(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl AsRef<[f64]> for TimeSeries {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// Borrowed form of [`TimeSeries`] taken by [`DistanceMeasure`](crate::DistanceMeasure).
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesView<'a>(&'a [f64]);

impl<'a> TimeSeriesView<'a> {
    /// Check `slice` and borrow it.
    ///
    /// # Errors
    ///
    /// Same conditions as [`TimeSeries::new`].
    pub fn new(slice: &'a [f64]) -> Result<Self, DistanceError> {
        validate(slice)?;
        Ok(Self(slice))
    }

    #[must_use]
    pub fn as_slice(&self) -> &'a [f64] {
        self.0
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Index<usize> for TimeSeriesView<'_> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl AsRef<[f64]> for TimeSeriesView<'_> {
    fn as_ref(&self) -> &[f64] {
        self.0
    }
}

fn validate(values: &[f64]) -> Result<(), DistanceError> {
    if values.is_empty() {
        return Err(DistanceError::EmptySeries);
    }
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(DistanceError::NonFiniteValue { index }),
        None => Ok(()),
    }
}
