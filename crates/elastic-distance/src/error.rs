//! Error types for series validation, option parsing, and measure lookup.

/// Errors from time series validation and distance measure configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DistanceError {
    /// Returned when an empty slice is provided as a time series.
    #[error("time series must be non-empty")]
    EmptySeries,

    /// Returned when a time series contains NaN, infinity, or negative infinity.
    #[error("time series contains non-finite value at index {index}")]
    NonFiniteValue {
        /// Position of the first non-finite value found.
        index: usize,
    },

    /// Returned when a flat option vector has an odd number of entries.
    #[error("option vector must alternate keys and values, got {len} entries")]
    MalformedOptions {
        /// Number of entries in the rejected vector.
        len: usize,
    },

    /// Returned when the registry has no measure under the requested name.
    #[error("unknown distance measure \"{name}\"")]
    UnknownMeasure {
        /// The name that was looked up.
        name: String,
    },

    /// Returned when a measure does not recognise an option key.
    #[error("unknown option \"{key}\" for distance measure {measure}")]
    UnknownOption {
        /// Canonical name of the measure being configured.
        measure: &'static str,
        /// The unrecognised key.
        key: String,
    },

    /// Returned when an option value cannot be parsed or is out of range.
    #[error("invalid value \"{value}\" for option \"{key}\": {reason}")]
    InvalidOptionValue {
        /// The option key.
        key: String,
        /// The raw value that was rejected.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}
