//! One-nearest-neighbour classification with leave-one-out train scoring.

use std::sync::Arc;

use elastic_distance::{DistanceMeasure, Dtw, MeasureRegistry, Options, TimeSeriesView};
use elastic_search::Seedable;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::classifier::Classifier;
use crate::dataset::LabelledDataset;
use crate::error::TuneError;
use crate::params::MEASURE;

/// 1-NN classifier over any registered distance measure.
///
/// Training stores the data and scores it by leave-one-out cross-validation,
/// in parallel over rows. Each neighbour search passes the best distance so
/// far as the cutoff, so losing candidates are abandoned early. Equidistant
/// neighbours are broken uniformly at random from the classifier's seed.
///
/// # Options
///
/// | Key | Meaning |
/// |---|---|
/// | `measure` | Canonical measure name; replaces the measure with its defaults |
/// | any other | Forwarded to the measure |
///
/// The default measure is full-window DTW and the default seed is 42.
#[derive(Debug, Clone)]
pub struct NearestNeighbour {
    registry: Arc<MeasureRegistry>,
    measure: Box<dyn DistanceMeasure>,
    train: Option<LabelledDataset>,
    train_score: Option<f64>,
    seed: u64,
}

impl NearestNeighbour {
    /// Create an untrained classifier using full-window DTW.
    #[must_use]
    pub fn new(registry: Arc<MeasureRegistry>) -> Self {
        Self::with_measure(registry, Box::new(Dtw::default()))
    }

    /// Create an untrained classifier using `measure`.
    #[must_use]
    pub fn with_measure(registry: Arc<MeasureRegistry>, measure: Box<dyn DistanceMeasure>) -> Self {
        Self {
            registry,
            measure,
            train: None,
            train_score: None,
            seed: 42,
        }
    }

    /// Borrow the configured measure.
    #[must_use]
    pub fn measure(&self) -> &dyn DistanceMeasure {
        self.measure.as_ref()
    }

    #[instrument(skip_all, fields(measure = self.measure.name(), n_series = data.len()))]
    #[allow(clippy::cast_precision_loss)]
    fn leave_one_out(&self, data: &LabelledDataset) -> f64 {
        let measure = self.measure.as_ref();
        let correct = (0..data.len())
            .into_par_iter()
            .filter(|&i| {
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(i as u64));
                nearest_class(measure, data.series()[i].as_view(), data, Some(i), &mut rng)
                    == data.class_of(i)
            })
            .count();
        let score = correct as f64 / data.len() as f64;
        debug!(correct, score, "leave-one-out complete");
        score
    }
}

/// Class of the nearest row of `data` to `query`, skipping row `exclude`.
///
/// `data` must hold at least one row besides `exclude`.
fn nearest_class(
    measure: &dyn DistanceMeasure,
    query: TimeSeriesView<'_>,
    data: &LabelledDataset,
    exclude: Option<usize>,
    rng: &mut ChaCha8Rng,
) -> usize {
    let mut best = f64::INFINITY;
    let mut ties: Vec<usize> = Vec::new();
    for (j, candidate) in data.series().iter().enumerate() {
        if exclude == Some(j) {
            continue;
        }
        let dist = measure.distance(query, candidate.as_view(), best);
        if ties.is_empty() || dist < best {
            best = dist;
            ties.clear();
            ties.push(data.class_of(j));
        } else if dist == best {
            ties.push(data.class_of(j));
        }
    }
    ties[rng.gen_range(0..ties.len())]
}

impl Classifier for NearestNeighbour {
    fn configure(&mut self, options: &Options) -> Result<(), TuneError> {
        match options.get(MEASURE) {
            Some(name) => {
                self.measure = self
                    .registry
                    .create_with_options(name, &options.without(MEASURE))?;
            }
            None => self.measure.set_options(options)?,
        }
        self.train = None;
        self.train_score = None;
        Ok(())
    }

    fn options(&self) -> Options {
        let mut options = Options::new().with(MEASURE, self.measure.name());
        options.extend(&self.measure.options());
        options
    }

    fn train(&mut self, data: &LabelledDataset) -> Result<(), TuneError> {
        if data.len() < 2 {
            return Err(TuneError::TooFewSeries { count: data.len() });
        }
        self.train_score = Some(self.leave_one_out(data));
        self.train = Some(data.clone());
        Ok(())
    }

    fn train_score(&self) -> Option<f64> {
        self.train_score
    }

    fn predict(&self, series: TimeSeriesView<'_>) -> Result<String, TuneError> {
        let data = self.train.as_ref().ok_or(TuneError::NotTrained)?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let class = nearest_class(self.measure.as_ref(), series, data, None, &mut rng);
        Ok(data.classes()[class].clone())
    }
}

impl Seedable for NearestNeighbour {
    fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}
