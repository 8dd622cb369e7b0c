//! The training contract the tuning loop drives.

use elastic_distance::{Options, TimeSeriesView};
use elastic_search::Seedable;

use crate::dataset::LabelledDataset;
use crate::error::TuneError;

/// A configurable classifier that reports a score on its own training data.
///
/// The tuning loop seeds every candidate through [`Seedable::set_seed`], then
/// calls [`configure`](Classifier::configure), [`train`](Classifier::train)
/// and [`train_score`](Classifier::train_score).
pub trait Classifier: Seedable + Send {
    /// Apply an option vector.
    ///
    /// # Errors
    ///
    /// Implementations reject unknown keys and unparsable values.
    fn configure(&mut self, options: &Options) -> Result<(), TuneError>;

    /// Current configuration as an option vector.
    fn options(&self) -> Options;

    /// Fit to `data`, computing the train score as a side effect.
    ///
    /// # Errors
    ///
    /// Implementations reject datasets they cannot learn from.
    fn train(&mut self, data: &LabelledDataset) -> Result<(), TuneError>;

    /// Self-reported score on the training data, once trained.
    fn train_score(&self) -> Option<f64>;

    /// Predict the class label of `series`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TuneError::NotTrained`] | Called before [`train`](Classifier::train) |
    fn predict(&self, series: TimeSeriesView<'_>) -> Result<String, TuneError>;

    /// Fraction of `data` whose label is predicted correctly.
    ///
    /// # Errors
    ///
    /// Propagates any [`predict`](Classifier::predict) failure.
    #[allow(clippy::cast_precision_loss)]
    fn accuracy(&self, data: &LabelledDataset) -> Result<f64, TuneError> {
        let mut correct = 0usize;
        for (series, label) in data.series().iter().zip(data.labels()) {
            if self.predict(series.as_view())? == *label {
                correct += 1;
            }
        }
        Ok(correct as f64 / data.len() as f64)
    }
}
