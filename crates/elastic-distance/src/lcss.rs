//! Longest common subsequence distance with a value tolerance.

use crate::constraint::{BandConstraint, WarpingWindow};
use crate::error::DistanceError;
use crate::measure::{DistanceMeasure, unknown_option};
use crate::options::{Options, parse_non_negative};
use crate::series::TimeSeriesView;

const EPSILON: &str = "epsilon";
const DELTA: &str = "delta";

/// LCSS distance: `1 - L / min(n, m)` where `L` is the length of the longest
/// common subsequence.
///
/// Two points match when `|a[i] - b[j]| <= epsilon` and `|i - j| <= delta`.
/// Results lie in `[0, 1]`.
///
/// # Options
///
/// | Key | Type | Default | Meaning |
/// |---|---|---|---|
/// | `epsilon` | float | `1.0` | Match tolerance, non-negative |
/// | `delta` | int | `3` | Match window in cells, `-1` for full |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lcss {
    epsilon: f64,
    delta: Option<usize>,
}

impl Default for Lcss {
    fn default() -> Self {
        Self {
            epsilon: 1.0,
            delta: Some(3),
        }
    }
}

impl Lcss {
    /// Canonical registry name.
    pub const NAME: &'static str = "lcss";

    /// Create an LCSS measure. `delta = None` allows matches anywhere.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::InvalidOptionValue`] | `epsilon` is negative or non-finite |
    pub fn new(epsilon: f64, delta: Option<usize>) -> Result<Self, DistanceError> {
        let epsilon = parse_non_negative(EPSILON, &epsilon.to_string())?;
        Ok(Self { epsilon, delta })
    }

    /// Return the match tolerance.
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Return the match window, `None` when unconstrained.
    #[must_use]
    pub fn delta(&self) -> Option<usize> {
        self.delta
    }

    fn constraint(&self) -> BandConstraint {
        match self.delta {
            Some(r) => BandConstraint::SakoeChibaRadius(r),
            None => BandConstraint::Unconstrained,
        }
    }
}

impl DistanceMeasure for Lcss {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn distance(&self, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>, cutoff: f64) -> f64 {
        let (a, b) = (a.as_slice(), b.as_slice());
        let n = a.len();
        let m = b.len();
        let shortest = n.min(m) as u32;
        let constraint = self.constraint();

        // Column 0 of each row is the empty-prefix border and stays zero.
        // Out-of-band cells are zero as well.
        let mut prev = vec![0u32; m + 1];
        let mut curr = vec![0u32; m + 1];
        let mut last_col_max = 0u32;

        for i in 0..n {
            curr.fill(0);
            let mut row_max = 0u32;
            for j in constraint.columns(i, m) {
                let v = if (a[i] - b[j]).abs() <= self.epsilon {
                    prev[j] + 1
                } else {
                    prev[j + 1].max(curr[j])
                };
                curr[j + 1] = v;
                row_max = row_max.max(v);
            }
            last_col_max = last_col_max.max(curr[m]);

            // Each remaining row can add at most one match.
            let remaining = (n - i - 1) as u32;
            let best_possible = last_col_max.max(row_max + remaining).min(shortest);
            if 1.0 - f64::from(best_possible) / f64::from(shortest) > cutoff {
                return f64::INFINITY;
            }

            std::mem::swap(&mut prev, &mut curr);
        }

        // The longest subsequence ends in the last row or the last column.
        let last_row_max = prev.iter().copied().max().unwrap_or(0);
        let matches = last_row_max.max(last_col_max);
        let result = 1.0 - f64::from(matches) / f64::from(shortest);
        if result > cutoff {
            return f64::INFINITY;
        }
        result
    }

    fn options(&self) -> Options {
        let delta = self.delta.map_or(-1, |d| d as i64);
        Options::new().with(EPSILON, self.epsilon).with(DELTA, delta)
    }

    fn set_options(&mut self, options: &Options) -> Result<(), DistanceError> {
        let mut next = *self;
        for (key, value) in options.iter() {
            match key {
                EPSILON => next.epsilon = parse_non_negative(key, value)?,
                DELTA => {
                    next.delta = match WarpingWindow::parse_cells(key, value)? {
                        WarpingWindow::Cells(r) => Some(r),
                        _ => None,
                    }
                }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::TimeSeries;

    fn ts(values: &[f64]) -> TimeSeries {
        TimeSeries::new(values.to_vec()).unwrap()
    }

    #[test]
    fn identical_is_zero() {
        let a = ts(&[1.0, 2.0, 3.0, 4.0]);
        let lcss = Lcss::new(0.0, Some(4)).unwrap();
        assert_eq!(lcss.distance_unbounded(a.as_view(), a.as_view()), 0.0);
    }

    #[test]
    fn disjoint_values_is_one() {
        let a = ts(&[0.0, 0.0, 0.0]);
        let b = ts(&[10.0, 10.0, 10.0]);
        let lcss = Lcss::new(0.5, None).unwrap();
        assert_eq!(lcss.distance_unbounded(a.as_view(), b.as_view()), 1.0);
    }

    #[test]
    fn half_match() {
        let a = ts(&[1.0, 2.0, 3.0, 4.0]);
        let b = ts(&[1.0, 9.0, 3.0, 9.0]);
        let lcss = Lcss::new(0.1, None).unwrap();
        assert_eq!(lcss.distance_unbounded(a.as_view(), b.as_view()), 0.5);
    }

    #[test]
    fn delta_zero_is_lock_step() {
        let a = ts(&[1.0, 2.0, 3.0]);
        let b = ts(&[2.0, 3.0, 1.0]);
        let lock_step = Lcss::new(0.0, Some(0)).unwrap();
        let full = Lcss::new(0.0, None).unwrap();
        assert_eq!(lock_step.distance_unbounded(a.as_view(), b.as_view()), 1.0);
        let d = full.distance_unbounded(a.as_view(), b.as_view());
        assert!((d - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn unequal_lengths_use_shorter_denominator() {
        let a = ts(&[1.0, 2.0]);
        let b = ts(&[5.0, 1.0, 2.0, 7.0]);
        let lcss = Lcss::new(0.0, None).unwrap();
        assert_eq!(lcss.distance_unbounded(a.as_view(), b.as_view()), 0.0);
        assert_eq!(lcss.distance_unbounded(b.as_view(), a.as_view()), 0.0);
    }

    #[test]
    fn cutoff_abandons() {
        let a = ts(&[0.0, 0.0, 0.0, 0.0]);
        let b = ts(&[10.0, 10.0, 10.0, 10.0]);
        let lcss = Lcss::new(0.5, None).unwrap();
        assert_eq!(lcss.distance(a.as_view(), b.as_view(), 0.5), f64::INFINITY);
    }

    #[test]
    fn options_round_trip() {
        let mut lcss = Lcss::default();
        lcss.set_options(&Options::parse(&["epsilon", "0.25", "delta", "-1"]).unwrap())
            .unwrap();
        assert_eq!(lcss.delta(), None);
        assert_eq!(lcss.options().to_flat(), vec!["epsilon", "0.25", "delta", "-1"]);
    }

    #[test]
    fn rejects_negative_epsilon() {
        let mut lcss = Lcss::default();
        assert!(lcss.set_options(&Options::parse(&["epsilon", "-1"]).unwrap()).is_err());
        assert_eq!(lcss, Lcss::default());
    }
}
