//! Elastic distance measures for time series.
//!
//! Pure math library with no I/O. Provides validated series types, the
//! [`DistanceMeasure`] abstraction with early-abandoning cutoffs, the DTW
//! family (DTW, WDTW, DDTW, WDDTW), LCSS, ERP, MSM and TWE kernels, and a
//! [`MeasureRegistry`] that builds measures from their canonical names and
//! flat option vectors.

mod constraint;
mod derivative;
mod dtw;
mod erp;
mod error;
mod lcss;
mod measure;
mod msm;
mod options;
mod registry;
mod series;
mod twe;
mod wdtw;

pub use constraint::{BandConstraint, WarpingWindow};
pub use derivative::{Ddtw, DerivativeCache, Wddtw, derivative};
pub use dtw::Dtw;
pub use erp::Erp;
pub use error::DistanceError;
pub use lcss::Lcss;
pub use measure::DistanceMeasure;
pub use msm::Msm;
pub use options::Options;
pub use registry::MeasureRegistry;
pub use series::{TimeSeries, TimeSeriesView};
pub use twe::Twe;
pub use wdtw::Wdtw;
