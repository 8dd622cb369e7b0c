//! Error types for parameter spaces, datasets, tuning and task execution.

use elastic_distance::DistanceError;

/// Errors from building parameter ranges and spaces.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    /// Returned when a range is requested with zero points.
    #[error("range size must be at least 1")]
    ZeroSizeRange,

    /// Returned when range bounds are non-finite or reversed.
    #[error("invalid range bounds [{min}, {max}]")]
    InvalidBounds {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// Returned when a dimension is added with no values.
    #[error("parameter \"{name}\" has no values")]
    EmptyDimension {
        /// Name of the parameter dimension.
        name: String,
    },

    /// Returned when a dataset summary cannot drive a builder.
    #[error("dataset summary is unusable: {reason}")]
    InvalidSummary {
        /// Why the summary was rejected.
        reason: String,
    },

    /// Returned when no space builder exists under the requested name.
    #[error("unknown parameter space \"{name}\"")]
    UnknownSpace {
        /// The name that was looked up.
        name: String,
    },
}

/// Errors from datasets, classifiers and the tuning loop.
#[derive(Debug, thiserror::Error)]
pub enum TuneError {
    /// Returned when a parameter space could not be built.
    #[error(transparent)]
    Param(#[from] ParamError),

    /// Returned when a measure or option is rejected.
    #[error(transparent)]
    Distance(#[from] DistanceError),

    /// Returned when the executor cannot be created.
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    /// Returned when a parallel evaluation did not complete.
    #[error(transparent)]
    Task(#[from] TaskError),

    /// Returned when a tuner setting is out of range.
    #[error("invalid tuner setting {field}: {reason}")]
    InvalidConfig {
        /// Name of the offending setting.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// Returned when a dataset has no series.
    #[error("dataset has zero series")]
    EmptyDataset,

    /// Returned when series and labels differ in count.
    #[error("dataset has {series} series but {labels} labels")]
    LabelCountMismatch {
        /// Number of series.
        series: usize,
        /// Number of labels.
        labels: usize,
    },

    /// Returned when a series differs in length from the first series.
    #[error("series {index} has length {got}, expected {expected}")]
    SeriesLengthMismatch {
        /// Zero-based index of the offending series.
        index: usize,
        /// Length of the first series.
        expected: usize,
        /// Length of the offending series.
        got: usize,
    },

    /// Returned when leave-one-out scoring is requested on fewer than two series.
    #[error("leave-one-out scoring needs at least 2 series, got {count}")]
    TooFewSeries {
        /// Number of series in the dataset.
        count: usize,
    },

    /// Returned when a classifier is used before training.
    #[error("classifier has not been trained")]
    NotTrained,

    /// Returned when a trained classifier reports no train score.
    #[error("classifier did not report a train score")]
    MissingTrainScore,

    /// Returned when the parameter space is empty after deduplication.
    #[error("parameter space is empty")]
    EmptySpace,

    /// Returned when every candidate evaluation failed.
    #[error("all {attempted} candidate evaluations failed")]
    AllEvaluationsFailed {
        /// Number of candidates attempted.
        attempted: usize,
    },
}

/// Errors from creating a [`BoundedExecutor`](crate::BoundedExecutor).
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// Returned when the concurrency bound is zero.
    #[error("max concurrency must be at least 1")]
    ZeroConcurrency,

    /// Returned when the worker pool cannot be built.
    #[error("failed to build worker pool")]
    PoolBuild {
        /// The underlying rayon error.
        #[from]
        source: rayon::ThreadPoolBuildError,
    },
}

/// Outcome of a single executor task that did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The task body panicked.
    #[error("task panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },

    /// The task was cancelled before it started.
    #[error("task was cancelled")]
    Cancelled,

    /// The batch deadline passed before the task finished.
    #[error("task timed out")]
    TimedOut,
}
