//! Warping window configuration and the band constraint it resolves to.

use std::ops::Range;

use crate::error::DistanceError;
use crate::options::{Options, parse_value};

/// Constraint on the warping window for one pair of series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BandConstraint {
    /// No constraint: the full cost matrix is computed.
    #[default]
    Unconstrained,

    /// Sakoe-Chiba band: cell (i,j) is valid only if |i - j| <= radius.
    SakoeChibaRadius(usize),
}

impl BandConstraint {
    /// Columns of row `row` that lie inside the band, clipped to `0..n_cols`.
    #[must_use]
    pub fn columns(&self, row: usize, n_cols: usize) -> Range<usize> {
        match *self {
            Self::Unconstrained => 0..n_cols,
            Self::SakoeChibaRadius(r) => row.saturating_sub(r)..(row + r + 1).min(n_cols),
        }
    }

    /// Upper bound on `columns(row, n_cols).len()` over every row.
    #[must_use]
    pub fn max_columns(&self, n_cols: usize) -> usize {
        match *self {
            Self::Unconstrained => n_cols,
            Self::SakoeChibaRadius(r) => (2 * r + 1).min(n_cols),
        }
    }

    /// Widen the band so that the corner cell `(n-1, m-1)` is reachable.
    ///
    /// With unequal lengths a radius below `|n - m|` admits no warping path.
    #[must_use]
    pub fn reaching_corner(self, n: usize, m: usize) -> Self {
        match self {
            Self::Unconstrained => Self::Unconstrained,
            Self::SakoeChibaRadius(r) => Self::SakoeChibaRadius(r.max(n.abs_diff(m))),
        }
    }

    /// Return true if cell `(i, j)` lies inside the band.
    #[must_use]
    pub fn contains(&self, i: usize, j: usize) -> bool {
        match self {
            Self::Unconstrained => true,
            Self::SakoeChibaRadius(r) => i.abs_diff(j) <= *r,
        }
    }
}

/// User-facing warping window, resolved against series lengths at distance time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum WarpingWindow {
    /// Every alignment is allowed. Encoded as `-1` in option vectors.
    #[default]
    Full,

    /// Absolute band radius in time steps.
    Cells(usize),

    /// Band radius as a fraction of the longer series, in `[0, 1]`.
    Fraction(f64),
}

impl WarpingWindow {
    /// Resolve into a [`BandConstraint`] for series of length `n` and `m`.
    ///
    /// Fractions round up, so any positive fraction allows at least one step of warping.
    #[must_use]
    pub fn resolve(&self, n: usize, m: usize) -> BandConstraint {
        let constraint = match *self {
            Self::Full => BandConstraint::Unconstrained,
            Self::Cells(r) => BandConstraint::SakoeChibaRadius(r),
            Self::Fraction(f) => {
                let longest = n.max(m) as f64;
                BandConstraint::SakoeChibaRadius((f * longest).ceil() as usize)
            }
        };
        constraint.reaching_corner(n, m)
    }

    /// Parse an absolute window option. `-1` means full.
    pub(crate) fn parse_cells(key: &str, value: &str) -> Result<Self, DistanceError> {
        let raw: i64 = parse_value(key, value)?;
        match raw {
            -1 => Ok(Self::Full),
            r if r >= 0 => Ok(Self::Cells(r as usize)),
            _ => Err(DistanceError::InvalidOptionValue {
                key: key.to_string(),
                value: value.to_string(),
                reason: "window must be -1 (full) or non-negative".to_string(),
            }),
        }
    }

    /// Parse a fractional window option in `[0, 1]`.
    pub(crate) fn parse_fraction(key: &str, value: &str) -> Result<Self, DistanceError> {
        let f: f64 = parse_value(key, value)?;
        if !(0.0..=1.0).contains(&f) {
            return Err(DistanceError::InvalidOptionValue {
                key: key.to_string(),
                value: value.to_string(),
                reason: "window fraction must lie in [0, 1]".to_string(),
            });
        }
        Ok(Self::Fraction(f))
    }

    /// Append this window to `options` under the absolute or fractional key.
    pub(crate) fn write_options(&self, options: &mut Options, cells_key: &str, fraction_key: &str) {
        match *self {
            Self::Full => options.push(cells_key, -1),
            Self::Cells(r) => options.push(cells_key, r),
            Self::Fraction(f) => options.push(fraction_key, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconstrained_rows_span_every_column() {
        let c = BandConstraint::Unconstrained;
        assert!((0..6).all(|row| c.columns(row, 4) == (0..4)));
        assert_eq!(c.max_columns(4), 4);
    }

    #[test]
    fn band_columns_agree_with_contains() {
        let c = BandConstraint::SakoeChibaRadius(1).reaching_corner(5, 7);
        for row in 0..5 {
            let expected: Vec<usize> = (0..7).filter(|&j| c.contains(row, j)).collect();
            let got: Vec<usize> = c.columns(row, 7).collect();
            assert_eq!(got, expected, "row {row}");
            assert!(got.len() <= c.max_columns(7));
        }
    }

    #[test]
    fn zero_radius_is_the_diagonal() {
        let c = BandConstraint::SakoeChibaRadius(0);
        assert_eq!(c.columns(3, 6), 3..4);
        assert_eq!(c.max_columns(6), 1);
    }

    #[test]
    fn wide_radius_is_clipped_to_the_matrix() {
        let c = BandConstraint::SakoeChibaRadius(9);
        assert_eq!(c.columns(1, 3), 0..3);
        assert_eq!(c.max_columns(3), 3);
    }

    #[test]
    fn reaching_corner_widens_for_unequal_lengths() {
        let c = BandConstraint::SakoeChibaRadius(0).reaching_corner(3, 7);
        assert_eq!(c, BandConstraint::SakoeChibaRadius(4));
        assert!(c.contains(2, 6));
    }

    #[test]
    fn fraction_rounds_up() {
        let c = WarpingWindow::Fraction(0.1).resolve(25, 25);
        assert_eq!(c, BandConstraint::SakoeChibaRadius(3));
        assert_eq!(WarpingWindow::Fraction(0.0).resolve(25, 25), BandConstraint::SakoeChibaRadius(0));
    }

    #[test]
    fn parse_cells_accepts_minus_one_as_full() {
        assert_eq!(WarpingWindow::parse_cells("window", "-1").unwrap(), WarpingWindow::Full);
        assert_eq!(WarpingWindow::parse_cells("window", "4").unwrap(), WarpingWindow::Cells(4));
    }

    #[test]
    fn parse_cells_rejects_other_negatives() {
        let err = WarpingWindow::parse_cells("window", "-3").unwrap_err();
        assert!(matches!(err, DistanceError::InvalidOptionValue { .. }));
    }

    #[test]
    fn parse_fraction_rejects_out_of_range() {
        assert!(WarpingWindow::parse_fraction("window_fraction", "1.5").is_err());
        assert!(WarpingWindow::parse_fraction("window_fraction", "0.25").is_ok());
    }
}
