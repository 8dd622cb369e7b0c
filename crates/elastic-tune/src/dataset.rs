//! Labelled series collections and the summary statistics space builders need.

use std::sync::Arc;

use elastic_distance::TimeSeries;

use crate::error::TuneError;

/// Summary statistics that drive data-dependent parameter ranges.
pub trait DatasetSummary {
    /// Length of every series in the dataset.
    fn series_length(&self) -> usize;

    /// Population standard deviation over every value of every series.
    fn std_dev(&self) -> f64;
}

/// Equal-length labelled series.
///
/// Cloning is cheap: rows and labels are shared.
#[derive(Debug, Clone)]
pub struct LabelledDataset {
    series: Arc<[TimeSeries]>,
    labels: Arc<[String]>,
    classes: Arc<[String]>,
    class_index: Arc<[usize]>,
}

impl LabelledDataset {
    /// Create a dataset from parallel series and label lists.
    ///
    /// Classes are numbered in first-seen order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TuneError::EmptyDataset`] | `series` is empty |
    /// | [`TuneError::LabelCountMismatch`] | `series` and `labels` differ in length |
    /// | [`TuneError::SeriesLengthMismatch`] | A series differs in length from the first |
    pub fn new(series: Vec<TimeSeries>, labels: Vec<String>) -> Result<Self, TuneError> {
        if series.is_empty() {
            return Err(TuneError::EmptyDataset);
        }
        if series.len() != labels.len() {
            return Err(TuneError::LabelCountMismatch {
                series: series.len(),
                labels: labels.len(),
            });
        }
        let expected = series[0].len();
        if let Some((index, bad)) = series.iter().enumerate().find(|(_, s)| s.len() != expected) {
            return Err(TuneError::SeriesLengthMismatch {
                index,
                expected,
                got: bad.len(),
            });
        }

        let mut classes: Vec<String> = Vec::new();
        let class_index = labels
            .iter()
            .map(|label| match classes.iter().position(|c| c == label) {
                Some(pos) => pos,
                None => {
                    classes.push(label.clone());
                    classes.len() - 1
                }
            })
            .collect::<Vec<_>>();

        Ok(Self {
            series: series.into(),
            labels: labels.into(),
            classes: classes.into(),
            class_index: class_index.into(),
        })
    }

    /// Number of series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Always false; construction rejects empty datasets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// All series in row order.
    #[must_use]
    pub fn series(&self) -> &[TimeSeries] {
        &self.series
    }

    /// All labels in row order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Label of row `index`.
    #[must_use]
    pub fn label(&self, index: usize) -> &str {
        &self.labels[index]
    }

    /// Distinct class labels in first-seen order.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Class index of row `index`, into [`classes`](LabelledDataset::classes).
    #[must_use]
    pub fn class_of(&self, index: usize) -> usize {
        self.class_index[index]
    }
}

impl DatasetSummary for LabelledDataset {
    fn series_length(&self) -> usize {
        self.series[0].len()
    }

    #[allow(clippy::cast_precision_loss)]
    fn std_dev(&self) -> f64 {
        let (sum, sum_sq, count) = self
            .series
            .iter()
            .flat_map(|s| s.as_ref().iter())
            .fold((0.0, 0.0, 0usize), |(sum, sum_sq, count), &x| {
                (sum + x, sum_sq + x * x, count + 1)
            });
        let n = count as f64;
        let mean = sum / n;
        (sum_sq / n - mean * mean).max(0.0).sqrt()
    }
}
