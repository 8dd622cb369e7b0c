//! Edit distance with real penalty.

use crate::constraint::WarpingWindow;
use crate::dtw::Dtw;
use crate::error::DistanceError;
use crate::measure::{DistanceMeasure, unknown_option};
use crate::options::{Options, parse_value};
use crate::series::TimeSeriesView;

const G: &str = "g";

/// ERP distance.
///
/// An edit distance where a point can be matched against the other series
/// (cost `(a[i] - b[j])^2`) or against the constant gap value `g` (cost
/// `(x - g)^2`). The result is the accumulated squared cost.
///
/// # Options
///
/// | Key | Type | Default | Meaning |
/// |---|---|---|---|
/// | `g` | float | `0.0` | Gap value |
/// | `window` | int | `-1` | Band radius in cells, `-1` for full |
/// | `window_fraction` | float | - | Band radius as a fraction of the longer series |
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Erp {
    g: f64,
    window: WarpingWindow,
}

impl Erp {
    /// Canonical registry name.
    pub const NAME: &'static str = "erp";

    /// Create an ERP measure with gap value `g` and the given window.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::InvalidOptionValue`] | `g` is non-finite |
    pub fn new(g: f64, window: WarpingWindow) -> Result<Self, DistanceError> {
        let g = parse_finite(G, &g.to_string())?;
        Ok(Self { g, window })
    }

    /// Return the gap value.
    #[must_use]
    pub fn g(&self) -> f64 {
        self.g
    }

    /// Return the configured window.
    #[must_use]
    pub fn window(&self) -> WarpingWindow {
        self.window
    }
}

impl DistanceMeasure for Erp {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn distance(&self, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>, cutoff: f64) -> f64 {
        let (a, b) = (a.as_slice(), b.as_slice());
        let n = a.len();
        let m = b.len();
        // Matrix indices are one-based; row/column 0 is the empty prefix.
        let constraint = self.window.resolve(n, m);
        let gap_a = |i: usize| (a[i - 1] - self.g).powi(2);
        let gap_b = |j: usize| (b[j - 1] - self.g).powi(2);

        let mut prev = vec![f64::INFINITY; m + 1];
        let mut curr = vec![f64::INFINITY; m + 1];

        prev[0] = 0.0;
        for j in 1..=m {
            if constraint.contains(0, j) {
                prev[j] = prev[j - 1] + gap_b(j);
            }
        }

        for i in 1..=n {
            curr.fill(f64::INFINITY);
            if constraint.contains(i, 0) {
                curr[0] = prev[0] + gap_a(i);
            }
            let mut row_min = curr[0];

            for j in 1..=m {
                if !constraint.contains(i, j) {
                    continue;
                }
                let matched = prev[j - 1] + (a[i - 1] - b[j - 1]).powi(2);
                let skip_a = prev[j] + gap_a(i);
                let skip_b = curr[j - 1] + gap_b(j);
                let val = matched.min(skip_a).min(skip_b);
                curr[j] = val;
                row_min = row_min.min(val);
            }

            if i < n && row_min > cutoff {
                return f64::INFINITY;
            }
            std::mem::swap(&mut prev, &mut curr);
        }

        let result = prev[m];
        if result > cutoff {
            return f64::INFINITY;
        }
        result
    }

    fn options(&self) -> Options {
        let mut options = Options::new().with(G, self.g);
        Dtw::write_window_option(&self.window, &mut options);
        options
    }

    fn set_options(&mut self, options: &Options) -> Result<(), DistanceError> {
        let mut next = *self;
        for (key, value) in options.iter() {
            if key == G {
                next.g = parse_finite(key, value)?;
                continue;
            }
            Dtw::parse_window_option(&mut next.window, key, value)
                .ok_or_else(|| unknown_option(Self::NAME, key))??;
        }
        *self = next;
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn DistanceMeasure> {
        Box::new(*self)
    }
}

fn parse_finite(key: &str, value: &str) -> Result<f64, DistanceError> {
    let v: f64 = parse_value(key, value)?;
    if !v.is_finite() {
        return Err(DistanceError::InvalidOptionValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be finite".to_string(),
        });
    }
    Ok(v)
}
