//! Parameter-space tuning of elastic distance measures.
//!
//! Builds per-measure [`ParameterSpace`]s from dataset statistics, scores each
//! candidate with a [`Classifier`] (typically the leave-one-out
//! [`NearestNeighbour`]), and keeps the best configuration overall or per
//! measure. Evaluations run sequentially or on a [`BoundedExecutor`].

mod classifier;
mod dataset;
mod error;
mod executor;
mod knn;
mod params;
mod space;
mod tuner;

pub use classifier::Classifier;
pub use dataset::{DatasetSummary, LabelledDataset};
pub use error::{ExecutorError, ParamError, TaskError, TuneError};
pub use executor::{BoundedExecutor, CancelToken, TaskHandle};
pub use knn::NearestNeighbour;
pub use params::{
    MEASURE, ParamValue, Parameter, ParameterSet, ParameterSpace, incremental_int_range,
    incremental_range, unique,
};
pub use space::{
    MSM_COSTS, SPACE_NAMES, TWE_LAMBDAS, TWE_NUS, build_space, ddtw_space, dtw_space, ed_space,
    elastic_ensemble_spaces, erp_space, full_ddtw_space, full_dtw_space, lcss_space, msm_space,
    twe_space, wddtw_space, wdtw_space,
};
pub use elastic_search::Seedable;
pub use tuner::{
    CandidateEvaluation, EvaluationRecord, SearchOrder, SpaceOrder, SpaceSummary, Tuner,
    TunerConfig, TuningOutcome, by_score,
};
