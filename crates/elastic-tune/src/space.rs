//! Per-measure parameter space builders.
//!
//! Each builder returns a space whose sets carry a [`MEASURE`] dimension with
//! the canonical registry name, followed by that measure's option keys.
//! Data-dependent ranges are derived from a [`DatasetSummary`].

use elastic_distance::{Ddtw, Dtw, Erp, Lcss, Msm, Twe, Wddtw, Wdtw};

use crate::dataset::DatasetSummary;
use crate::error::ParamError;
use crate::params::{MEASURE, ParameterSpace, incremental_int_range, incremental_range, unique};

/// Names accepted by [`build_space`], in elastic-ensemble order.
pub const SPACE_NAMES: [&str; 11] = [
    "ed", "full_dtw", "dtw", "full_ddtw", "ddtw", "wdtw", "wddtw", "lcss", "erp", "msm", "twe",
];

/// Split/merge costs searched for MSM.
pub const MSM_COSTS: [f64; 100] = [
    0.01, 0.01375, 0.0175, 0.02125, 0.025, 0.02875, 0.0325, 0.03625, 0.04, 0.04375, 0.0475,
    0.05125, 0.055, 0.05875, 0.0625, 0.06625, 0.07, 0.07375, 0.0775, 0.08125, 0.085, 0.08875,
    0.0925, 0.09625, 0.1, 0.136, 0.172, 0.208, 0.244, 0.28, 0.316, 0.352, 0.388, 0.424, 0.46,
    0.496, 0.532, 0.568, 0.604, 0.64, 0.676, 0.712, 0.748, 0.784, 0.82, 0.856, 0.892, 0.928,
    0.964, 1.0, 1.36, 1.72, 2.08, 2.44, 2.8, 3.16, 3.52, 3.88, 4.24, 4.6, 4.96, 5.32, 5.68, 6.04,
    6.4, 6.76, 7.12, 7.48, 7.84, 8.2, 8.56, 8.92, 9.28, 9.64, 10.0, 13.6, 17.2, 20.8, 24.4, 28.0,
    31.6, 35.2, 38.8, 42.4, 46.0, 49.6, 53.2, 56.8, 60.4, 64.0, 67.6, 71.2, 74.8, 78.4, 82.0,
    85.6, 89.2, 92.8, 96.4, 100.0,
];

/// Stiffness values searched for TWE.
pub const TWE_NUS: [f64; 10] = [
    0.00001, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0,
];

/// Deletion penalties searched for TWE.
pub const TWE_LAMBDAS: [f64; 10] = [
    0.0,
    0.011111111,
    0.022222222,
    0.033333333,
    0.044444444,
    0.055555556,
    0.066666667,
    0.077777778,
    0.088888889,
    0.1,
];

const WINDOW_POINTS: usize = 100;
const WEIGHT_POINTS: usize = 100;
const STD_POINTS: usize = 10;
const BAND_POINTS: usize = 10;

fn measure_space(name: &str) -> Result<ParameterSpace, ParamError> {
    ParameterSpace::new().with_dimension(MEASURE, [name])
}

fn checked_length(summary: &dyn DatasetSummary) -> Result<i64, ParamError> {
    let length = summary.series_length();
    if length == 0 {
        return Err(ParamError::InvalidSummary {
            reason: "series length is zero".to_string(),
        });
    }
    i64::try_from(length).map_err(|_| ParamError::InvalidSummary {
        reason: format!("series length {length} is too large"),
    })
}

fn checked_std(summary: &dyn DatasetSummary) -> Result<f64, ParamError> {
    let std = summary.std_dev();
    if !std.is_finite() || std < 0.0 {
        return Err(ParamError::InvalidSummary {
            reason: format!("standard deviation {std} is not a finite non-negative number"),
        });
    }
    Ok(std)
}

fn window_values(summary: &dyn DatasetSummary) -> Result<Vec<i64>, ParamError> {
    let length = checked_length(summary)?;
    Ok(unique(incremental_int_range(0, length - 1, WINDOW_POINTS)?))
}

fn band_values(summary: &dyn DatasetSummary) -> Result<Vec<i64>, ParamError> {
    let length = checked_length(summary)?;
    Ok(unique(incremental_int_range(0, (length - 1) / 4, BAND_POINTS)?))
}

fn std_values(summary: &dyn DatasetSummary) -> Result<Vec<f64>, ParamError> {
    let std = checked_std(summary)?;
    Ok(unique(incremental_range(0.2 * std, std, STD_POINTS)?))
}

#[allow(clippy::cast_precision_loss)]
fn weight_values() -> Vec<f64> {
    (0..WEIGHT_POINTS)
        .map(|i| i as f64 / WEIGHT_POINTS as f64)
        .collect()
}

/// Lock-step squared Euclidean distance: DTW with a zero window.
///
/// # Errors
///
/// Infallible in practice; the signature matches the other builders.
pub fn ed_space() -> Result<ParameterSpace, ParamError> {
    measure_space(Dtw::NAME)?.with_dimension("window", [0_i64])
}

/// DTW with an unconstrained window.
///
/// # Errors
///
/// Infallible in practice; the signature matches the other builders.
pub fn full_dtw_space() -> Result<ParameterSpace, ParamError> {
    measure_space(Dtw::NAME)?.with_dimension("window", [-1_i64])
}

/// DDTW with an unconstrained window.
///
/// # Errors
///
/// Infallible in practice; the signature matches the other builders.
pub fn full_ddtw_space() -> Result<ParameterSpace, ParamError> {
    measure_space(Ddtw::NAME)?.with_dimension("window", [-1_i64])
}

/// DTW over up to 100 distinct windows in `[0, length - 1]`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ParamError::InvalidSummary`] | The series length is zero |
pub fn dtw_space(summary: &dyn DatasetSummary) -> Result<ParameterSpace, ParamError> {
    measure_space(Dtw::NAME)?.with_dimension("window", window_values(summary)?)
}

/// DDTW over the same windows as [`dtw_space`].
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ParamError::InvalidSummary`] | The series length is zero |
pub fn ddtw_space(summary: &dyn DatasetSummary) -> Result<ParameterSpace, ParamError> {
    measure_space(Ddtw::NAME)?.with_dimension("window", window_values(summary)?)
}

/// WDTW over `g` in `{0.00, 0.01, ..., 0.99}`.
///
/// # Errors
///
/// Infallible in practice; the signature matches the other builders.
pub fn wdtw_space() -> Result<ParameterSpace, ParamError> {
    measure_space(Wdtw::NAME)?.with_dimension("g", weight_values())
}

/// WDDTW over the same weights as [`wdtw_space`].
///
/// # Errors
///
/// Infallible in practice; the signature matches the other builders.
pub fn wddtw_space() -> Result<ParameterSpace, ParamError> {
    measure_space(Wddtw::NAME)?.with_dimension("g", weight_values())
}

/// LCSS over 10 tolerances in `[0.2σ, σ]` and 10 windows in `[0, (length - 1) / 4]`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ParamError::InvalidSummary`] | Zero length or non-finite standard deviation |
pub fn lcss_space(summary: &dyn DatasetSummary) -> Result<ParameterSpace, ParamError> {
    measure_space(Lcss::NAME)?
        .with_dimension("epsilon", std_values(summary)?)?
        .with_dimension("delta", band_values(summary)?)
}

/// ERP over 10 bands in `[0, (length - 1) / 4]` and 10 gap values in `[0.2σ, σ]`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ParamError::InvalidSummary`] | Zero length or non-finite standard deviation |
pub fn erp_space(summary: &dyn DatasetSummary) -> Result<ParameterSpace, ParamError> {
    measure_space(Erp::NAME)?
        .with_dimension("window", band_values(summary)?)?
        .with_dimension("g", std_values(summary)?)
}

/// MSM over [`MSM_COSTS`].
///
/// # Errors
///
/// Infallible in practice; the signature matches the other builders.
pub fn msm_space() -> Result<ParameterSpace, ParamError> {
    measure_space(Msm::NAME)?.with_dimension("cost", MSM_COSTS)
}

/// TWE over [`TWE_LAMBDAS`] × [`TWE_NUS`].
///
/// # Errors
///
/// Infallible in practice; the signature matches the other builders.
pub fn twe_space() -> Result<ParameterSpace, ParamError> {
    measure_space(Twe::NAME)?
        .with_dimension("lambda", TWE_LAMBDAS)?
        .with_dimension("nu", TWE_NUS)
}

/// Build a space by name; see [`SPACE_NAMES`].
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ParamError::UnknownSpace`] | `name` is not in [`SPACE_NAMES`] |
/// | [`ParamError::InvalidSummary`] | The summary cannot drive the builder |
pub fn build_space(name: &str, summary: &dyn DatasetSummary) -> Result<ParameterSpace, ParamError> {
    match name {
        "ed" => ed_space(),
        "full_dtw" => full_dtw_space(),
        "dtw" => dtw_space(summary),
        "full_ddtw" => full_ddtw_space(),
        "ddtw" => ddtw_space(summary),
        "wdtw" => wdtw_space(),
        "wddtw" => wddtw_space(),
        "lcss" => lcss_space(summary),
        "erp" => erp_space(summary),
        "msm" => msm_space(),
        "twe" => twe_space(),
        _ => Err(ParamError::UnknownSpace {
            name: name.to_string(),
        }),
    }
}

/// The eleven elastic-ensemble constituent spaces, in [`SPACE_NAMES`] order.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ParamError::InvalidSummary`] | The summary cannot drive a builder |
pub fn elastic_ensemble_spaces(
    summary: &dyn DatasetSummary,
) -> Result<Vec<ParameterSpace>, ParamError> {
    SPACE_NAMES
        .iter()
        .map(|name| build_space(name, summary))
        .collect()
}
