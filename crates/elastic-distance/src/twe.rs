//! Time warp edit distance.

use crate::error::DistanceError;
use crate::measure::{DistanceMeasure, unknown_option};
use crate::options::{Options, parse_non_negative};
use crate::series::TimeSeriesView;

const NU: &str = "nu";
const LAMBDA: &str = "lambda";

/// TWE distance with time stamps `1..=n`.
///
/// Matching `(i, j)` costs the squared difference of the current and
/// previous samples plus `nu` times their time stamp gap. Deleting a sample
/// costs its squared step from the previous sample plus `nu + lambda`.
///
/// # Options
///
/// | Key | Type | Default | Meaning |
/// |---|---|---|---|
/// | `nu` | float | `1.0` | Stiffness |
/// | `lambda` | float | `1.0` | Deletion penalty |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Twe {
    nu: f64,
    lambda: f64,
}

impl Default for Twe {
    fn default() -> Self {
        Self {
            nu: 1.0,
            lambda: 1.0,
        }
    }
}

impl Twe {
    /// Canonical registry name.
    pub const NAME: &'static str = "twe";

    /// Create a TWE measure.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::InvalidOptionValue`] | `nu` or `lambda` is negative or non-finite |
    pub fn new(nu: f64, lambda: f64) -> Result<Self, DistanceError> {
        Ok(Self {
            nu: parse_non_negative(NU, &nu.to_string())?,
            lambda: parse_non_negative(LAMBDA, &lambda.to_string())?,
        })
    }

    /// Return the stiffness.
    #[must_use]
    pub fn nu(&self) -> f64 {
        self.nu
    }

    /// Return the deletion penalty.
    #[must_use]
    pub fn lambda(&self) -> f64 {
        self.lambda
    }
}

/// Squared step into sample `k` (one-based); the first sample steps from zero.
fn step_cost(x: &[f64], k: usize) -> f64 {
    if k > 1 {
        (x[k - 2] - x[k - 1]).powi(2)
    } else {
        x[0].powi(2)
    }
}

impl DistanceMeasure for Twe {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn distance(&self, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>, cutoff: f64) -> f64 {
        let (a, b) = (a.as_slice(), b.as_slice());
        let n = a.len();
        let m = b.len();
        let delete = self.lambda + self.nu;

        let step_b: Vec<f64> = (1..=m).map(|j| step_cost(b, j)).collect();

        let mut prev = vec![0.0; m + 1];
        let mut curr = vec![0.0; m + 1];
        for j in 1..=m {
            prev[j] = prev[j - 1] + step_b[j - 1];
        }

        for i in 1..=n {
            let step_a = step_cost(a, i);
            curr[0] = prev[0] + step_a;
            let mut row_min = curr[0];

            for j in 1..=m {
                let mut local = (a[i - 1] - b[j - 1]).powi(2);
                let mut htrans = i.abs_diff(j) as f64;
                if i > 1 && j > 1 {
                    local += (a[i - 2] - b[j - 2]).powi(2);
                    htrans *= 2.0;
                }
                let matched = prev[j - 1] + self.nu * htrans + local;
                let delete_a = prev[j] + step_a + delete;
                let delete_b = curr[j - 1] + step_b[j - 1] + delete;
                let val = matched.min(delete_a).min(delete_b);
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
        Options::new().with(NU, self.nu).with(LAMBDA, self.lambda)
    }

    fn set_options(&mut self, options: &Options) -> Result<(), DistanceError> {
        let mut next = *self;
        for (key, value) in options.iter() {
            match key {
                NU => next.nu = parse_non_negative(key, value)?,
                LAMBDA => next.lambda = parse_non_negative(key, value)?,
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
