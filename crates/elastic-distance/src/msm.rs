//! Move-split-merge distance.

use crate::error::DistanceError;
use crate::measure::{DistanceMeasure, unknown_option};
use crate::options::{Options, parse_non_negative};
use crate::series::TimeSeriesView;

const COST: &str = "cost";

/// MSM distance.
///
/// Moves cost `|a[i] - b[j]|`. Splits and merges cost `cost` when the new
/// point lies between its neighbours, otherwise `cost` plus the distance to
/// the nearer neighbour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Msm {
    cost: f64,
}

impl Default for Msm {
    fn default() -> Self {
        Self { cost: 1.0 }
    }
}

impl Msm {
    /// Canonical registry name.
    pub const NAME: &'static str = "msm";

    /// Create an MSM measure with the given split/merge cost.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::InvalidOptionValue`] | `cost` is negative or non-finite |
    pub fn new(cost: f64) -> Result<Self, DistanceError> {
        let cost = parse_non_negative(COST, &cost.to_string())?;
        Ok(Self { cost })
    }

    /// Return the split/merge cost.
    #[must_use]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Cost of inserting `p` next to `x` when aligned against `y`.
    fn find_cost(&self, p: f64, x: f64, y: f64) -> f64 {
        if (x <= p && p <= y) || (y <= p && p <= x) {
            self.cost
        } else {
            self.cost + (p - x).abs().min((p - y).abs())
        }
    }
}

impl DistanceMeasure for Msm {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn distance(&self, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>, cutoff: f64) -> f64 {
        let (a, b) = (a.as_slice(), b.as_slice());
        let n = a.len();
        let m = b.len();

        let mut prev = vec![0.0; m];
        let mut curr = vec![0.0; m];

        prev[0] = (a[0] - b[0]).abs();
        for j in 1..m {
            prev[j] = prev[j - 1] + self.find_cost(b[j], a[0], b[j - 1]);
        }
        let first_row_min = prev.iter().copied().fold(f64::INFINITY, f64::min);
        if n > 1 && first_row_min > cutoff {
            return f64::INFINITY;
        }

        for i in 1..n {
            curr[0] = prev[0] + self.find_cost(a[i], a[i - 1], b[0]);
            let mut row_min = curr[0];
            for j in 1..m {
                let moved = prev[j - 1] + (a[i] - b[j]).abs();
                let split_a = prev[j] + self.find_cost(a[i], a[i - 1], b[j]);
                let split_b = curr[j - 1] + self.find_cost(b[j], a[i], b[j - 1]);
                let val = moved.min(split_a).min(split_b);
                curr[j] = val;
                row_min = row_min.min(val);
            }
            if i < n - 1 && row_min > cutoff {
                return f64::INFINITY;
            }
            std::mem::swap(&mut prev, &mut curr);
        }

        let result = prev[m - 1];
        if result > cutoff {
            return f64::INFINITY;
        }
        result
    }

    fn options(&self) -> Options {
        Options::new().with(COST, self.cost)
    }

    fn set_options(&mut self, options: &Options) -> Result<(), DistanceError> {
        let mut next = *self;
        for (key, value) in options.iter() {
            match key {
                COST => next.cost = parse_non_negative(key, value)?,
                _ => return Err(unknown_option(Self::NAME, key)),
            }
        }
        *self = next;
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn DistanceMeasure> {
        Box::new(*self)
    }
}
