//! Dynamic time warping and the shared rolling warp kernel.

use crate::constraint::{BandConstraint, WarpingWindow};
use crate::error::DistanceError;
use crate::measure::{DistanceMeasure, unknown_option};
use crate::options::Options;
use crate::series::TimeSeriesView;

const WINDOW: &str = "window";
const WINDOW_FRACTION: &str = "window_fraction";

/// DTW over squared pointwise differences with a Sakoe-Chiba window.
///
/// The result is the accumulated squared cost along the optimal path; no
/// square root is taken. A window of zero cells reduces to the squared
/// Euclidean distance for equal-length series.
///
/// # Options
///
/// | Key | Type | Default | Meaning |
/// |---|---|---|---|
/// | `window` | int | `-1` | Band radius in cells, `-1` for full |
/// | `window_fraction` | float | - | Band radius as a fraction of the longer series |
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Dtw {
    window: WarpingWindow,
}

impl Dtw {
    /// Canonical registry name.
    pub const NAME: &'static str = "dtw";

    /// Create an unconstrained DTW measure.
    #[must_use]
    pub fn full() -> Self {
        Self {
            window: WarpingWindow::Full,
        }
    }

    /// Create a DTW measure with an absolute band radius.
    #[must_use]
    pub fn with_window(radius: usize) -> Self {
        Self {
            window: WarpingWindow::Cells(radius),
        }
    }

    /// Create a DTW measure whose band radius is a fraction of the longer series.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::InvalidOptionValue`] | `fraction` is outside `[0, 1]` |
    pub fn with_window_fraction(fraction: f64) -> Result<Self, DistanceError> {
        let window = WarpingWindow::parse_fraction(WINDOW_FRACTION, &fraction.to_string())?;
        Ok(Self { window })
    }

    /// Squared Euclidean distance expressed as DTW with a zero-width window.
    #[must_use]
    pub fn euclidean() -> Self {
        Self::with_window(0)
    }

    /// Return the configured window.
    #[must_use]
    pub fn window(&self) -> WarpingWindow {
        self.window
    }

    pub(crate) fn parse_window_option(
        window: &mut WarpingWindow,
        key: &str,
        value: &str,
    ) -> Option<Result<(), DistanceError>> {
        let parsed = match key {
            WINDOW => WarpingWindow::parse_cells(key, value),
            WINDOW_FRACTION => WarpingWindow::parse_fraction(key, value),
            _ => return None,
        };
        Some(parsed.map(|w| *window = w))
    }

    pub(crate) fn write_window_option(window: &WarpingWindow, options: &mut Options) {
        window.write_options(options, WINDOW, WINDOW_FRACTION);
    }

    pub(crate) fn apply_option(&mut self, key: &str, value: &str) -> Option<Result<(), DistanceError>> {
        Self::parse_window_option(&mut self.window, key, value)
    }
}

impl DistanceMeasure for Dtw {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn distance(&self, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>, cutoff: f64) -> f64 {
        let constraint = self.window.resolve(a.len(), b.len());
        warp_cost(a.as_slice(), b.as_slice(), constraint, None, cutoff)
    }

    fn options(&self) -> Options {
        let mut options = Options::new();
        Self::write_window_option(&self.window, &mut options);
        options
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

/// Rolling two-row warp cost with optional weights and early abandoning.
///
/// Each row buffer has `bw + 2` slots. Index 0 and index `bw + 1` are INF
/// sentinels; active columns of row `i` occupy `1..=bw` starting at
/// `columns(i, m).start`. Predecessors outside the previous row's range
/// read INF.
///
/// When `weights` is given the pointwise cost of cell `(i, j)` is scaled by
/// `weights[|i - j|]`; it must hold at least `max(n, m)` entries.
///
/// The constraint must already reach the corner cell (see
/// [`BandConstraint::reaching_corner`]).
pub(crate) fn warp_cost(
    a: &[f64],
    b: &[f64],
    constraint: BandConstraint,
    weights: Option<&[f64]>,
    cutoff: f64,
) -> f64 {
    let n = a.len();
    let m = b.len();

    let bw = constraint.max_columns(m);
    let buf_width = bw + 2;

    let mut prev = vec![f64::INFINITY; buf_width];
    let mut curr = vec![f64::INFINITY; buf_width];
    let mut prev_range = 0..0;

    for i in 0..n {
        curr.fill(f64::INFINITY);

        let col_range = constraint.columns(i, m);
        let curr_start = col_range.start;
        let mut row_min = f64::INFINITY;

        for j in col_range.clone() {
            let diff = a[i] - b[j];
            let cost = match weights {
                Some(w) => w[i.abs_diff(j)] * diff * diff,
                None => diff * diff,
            };
            let cj = j - curr_start + 1;

            if i == 0 && j == 0 {
                curr[cj] = cost;
                row_min = row_min.min(cost);
                continue;
            }

            let left = if j > curr_start {
                curr[cj - 1]
            } else {
                f64::INFINITY
            };

            let above = if prev_range.contains(&j) {
                prev[j - prev_range.start + 1]
            } else {
                f64::INFINITY
            };

            let diag = if j > 0 && prev_range.contains(&(j - 1)) {
                prev[j - prev_range.start]
            } else {
                f64::INFINITY
            };

            let val = cost + left.min(above).min(diag);
            curr[cj] = val;
            row_min = row_min.min(val);
        }

        // Every path crosses each row, so the row minimum bounds the result.
        // The last row is settled by the corner check below.
        if i < n - 1 && row_min > cutoff {
            return f64::INFINITY;
        }

        prev_range = col_range;
        std::mem::swap(&mut prev, &mut curr);
    }

    // `prev` now holds row n-1.
    let result = prev[(m - 1) - prev_range.start + 1];
    if result > cutoff {
        return f64::INFINITY;
    }
    result
}
