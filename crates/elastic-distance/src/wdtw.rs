//! Weighted DTW: full-window DTW with a logistic penalty on phase difference.

use crate::constraint::BandConstraint;
use crate::dtw::warp_cost;
use crate::error::DistanceError;
use crate::measure::{DistanceMeasure, unknown_option};
use crate::options::{Options, parse_non_negative};
use crate::series::TimeSeriesView;

const G: &str = "g";

/// Weighted DTW.
///
/// Cell `(i, j)` costs `w(|i - j|) * (a[i] - b[j])^2` where
/// `w(k) = 1 / (1 + exp(-g * (k - L / 2)))` and `L` is the longer length.
/// Larger `g` penalises warping more steeply. No window is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wdtw {
    g: f64,
}

impl Default for Wdtw {
    fn default() -> Self {
        Self { g: 0.05 }
    }
}

impl Wdtw {
    /// Canonical registry name.
    pub const NAME: &'static str = "wdtw";

    /// Create a WDTW measure with penalty steepness `g`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::InvalidOptionValue`] | `g` is negative or non-finite |
    pub fn new(g: f64) -> Result<Self, DistanceError> {
        let g = parse_non_negative(G, &g.to_string())?;
        Ok(Self { g })
    }

    /// Return the penalty steepness.
    #[must_use]
    pub fn g(&self) -> f64 {
        self.g
    }

    /// Weight vector indexed by phase difference, for series up to `len` long.
    #[must_use]
    pub fn weights(&self, len: usize) -> Vec<f64> {
        let half = len as f64 / 2.0;
        (0..len)
            .map(|k| 1.0 / (1.0 + (-self.g * (k as f64 - half)).exp()))
            .collect()
    }

    pub(crate) fn weighted_cost(&self, a: &[f64], b: &[f64], cutoff: f64) -> f64 {
        let weights = self.weights(a.len().max(b.len()));
        warp_cost(a, b, BandConstraint::Unconstrained, Some(&weights), cutoff)
    }

    pub(crate) fn apply_option(&mut self, key: &str, value: &str) -> Option<Result<(), DistanceError>> {
        match key {
            G => Some(parse_non_negative(key, value).map(|g| self.g = g)),
            _ => None,
        }
    }
}

impl DistanceMeasure for Wdtw {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn distance(&self, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>, cutoff: f64) -> f64 {
        self.weighted_cost(a.as_slice(), b.as_slice(), cutoff)
    }

    fn options(&self) -> Options {
        Options::new().with(G, self.g)
    }

    fn set_options(&mut self, options: &Options) -> Result<(), DistanceError> {
        let mut next = *self;
        for (key, value) in options.iter() {
            next.apply_option(key, value)
                .ok_or_else(|| unknown_option(Self::NAME, key))??;
        }
        *self = next;
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn DistanceMeasure> {
        Box::new(*self)
    }
}
