//! The tuning loop: evaluate candidate parameter sets, keep the best.

use std::cmp::Ordering;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use elastic_search::{
    BestPerTypeSelector, BoxedIterator, DynamicIterator, LinearIterator, RandomIterator,
    RoundRobinIterator, Seedable, Siphon, SpreadIterator, ThresholdIterator,
};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument, warn};

use crate::classifier::Classifier;
use crate::dataset::LabelledDataset;
use crate::error::{ParamError, TuneError};
use crate::executor::{BoundedExecutor, CancelToken};
use crate::params::{ParameterSet, ParameterSpace};

/// Order in which the sets of one space are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchOrder {
    /// Space order.
    #[default]
    Linear,
    /// Uniformly shuffled, each set at most once.
    Random,
    /// Centre-out binary order over the space.
    Spread,
}

/// Order in which the tuner moves between spaces.
///
/// A space is the group of candidate sets sharing one measure. Each draw
/// takes the next set from one space; a space leaves the rotation once it
/// runs out of sets or patience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpaceOrder {
    /// Cycle through the spaces in first-seen order.
    #[default]
    RoundRobin,
    /// Pick a remaining space uniformly at random for every draw.
    Random,
}

/// Configuration for a [`Tuner`].
///
/// Construct via [`TunerConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter         | Default  |
/// |-------------------|----------|
/// | `seed`            | 42       |
/// | `order`           | `Linear` |
/// | `space_order`     | `RoundRobin` |
/// | `max_evaluations` | `None`   |
/// | `patience`        | `None`   |
/// | `batch_timeout`   | `None`   |
#[derive(Debug, Clone, PartialEq)]
pub struct TunerConfig {
    pub(crate) seed: u64,
    pub(crate) order: SearchOrder,
    pub(crate) space_order: SpaceOrder,
    pub(crate) max_evaluations: Option<usize>,
    pub(crate) patience: Option<usize>,
    pub(crate) batch_timeout: Option<Duration>,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TunerConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            seed: 42,
            order: SearchOrder::Linear,
            space_order: SpaceOrder::RoundRobin,
            max_evaluations: None,
            patience: None,
            batch_timeout: None,
        }
    }

    // --- Setters ---

    /// Set the seed for random ordering, tie-breaking and candidate seeds.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the visiting order within each space.
    #[must_use]
    pub fn with_order(mut self, order: SearchOrder) -> Self {
        self.order = order;
        self
    }

    /// Set the order in which spaces take turns.
    #[must_use]
    pub fn with_space_order(mut self, space_order: SpaceOrder) -> Self {
        self.space_order = space_order;
        self
    }

    /// Cap the number of candidates evaluated across every space. `None`
    /// evaluates all.
    #[must_use]
    pub fn with_max_evaluations(mut self, max_evaluations: Option<usize>) -> Self {
        self.max_evaluations = max_evaluations;
        self
    }

    /// Retire a space after this many consecutive candidates from it
    /// without a better evaluation.
    #[must_use]
    pub fn with_patience(mut self, patience: Option<usize>) -> Self {
        self.patience = patience;
        self
    }

    /// Deadline for each parallel batch. Ignored without an executor.
    #[must_use]
    pub fn with_batch_timeout(mut self, batch_timeout: Option<Duration>) -> Self {
        self.batch_timeout = batch_timeout;
        self
    }

    // --- Getters ---

    /// Return the seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the visiting order within each space.
    #[must_use]
    pub fn order(&self) -> SearchOrder {
        self.order
    }

    /// Return the order in which spaces take turns.
    #[must_use]
    pub fn space_order(&self) -> SpaceOrder {
        self.space_order
    }

    /// Return the evaluation cap, if any.
    #[must_use]
    pub fn max_evaluations(&self) -> Option<usize> {
        self.max_evaluations
    }

    /// Return the patience, if any.
    #[must_use]
    pub fn patience(&self) -> Option<usize> {
        self.patience
    }

    /// Return the batch timeout, if any.
    #[must_use]
    pub fn batch_timeout(&self) -> Option<Duration> {
        self.batch_timeout
    }

    fn validate(&self) -> Result<(), TuneError> {
        if self.max_evaluations == Some(0) {
            return Err(TuneError::InvalidConfig {
                field: "max_evaluations",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.patience == Some(0) {
            return Err(TuneError::InvalidConfig {
                field: "patience",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// A trained classifier, the set that configured it, and its train score.
#[derive(Debug, Clone)]
pub struct CandidateEvaluation<C> {
    /// The trained classifier.
    pub classifier: C,
    /// The parameter set it was configured with.
    pub parameters: ParameterSet,
    /// Its self-reported train score.
    pub score: f64,
}

/// One line of the evaluation log. `score` is `None` when the candidate failed.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    /// The candidate set.
    pub parameters: ParameterSet,
    /// Its train score, if evaluation succeeded.
    pub score: Option<f64>,
}

/// How far the search got through one space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceSummary {
    /// Measure shared by the space's sets, if they name one.
    pub measure: Option<String>,
    /// Distinct sets in the space.
    pub size: usize,
    /// Sets handed out for evaluation.
    pub visited: usize,
}

/// Result of a tuning run.
#[derive(Debug)]
pub struct TuningOutcome<C> {
    selected: Vec<CandidateEvaluation<C>>,
    evaluations: Vec<EvaluationRecord>,
    spaces: Vec<SpaceSummary>,
}

impl<C> TuningOutcome<C> {
    /// The chosen candidate, or the first group's choice after per-group tuning.
    #[must_use]
    pub fn best(&self) -> &CandidateEvaluation<C> {
        &self.selected[0]
    }

    /// One chosen candidate per group, in first-seen group order.
    #[must_use]
    pub fn selected(&self) -> &[CandidateEvaluation<C>] {
        &self.selected
    }

    /// Every attempted candidate in evaluation order.
    #[must_use]
    pub fn evaluations(&self) -> &[EvaluationRecord] {
        &self.evaluations
    }

    /// Per-space progress, in first-seen space order.
    #[must_use]
    pub fn spaces(&self) -> &[SpaceSummary] {
        &self.spaces
    }

    /// Number of candidates that failed to evaluate.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.evaluations.iter().filter(|r| r.score.is_none()).count()
    }

    /// Take ownership of the chosen candidates.
    #[must_use]
    pub fn into_selected(self) -> Vec<CandidateEvaluation<C>> {
        self.selected
    }
}

/// Higher train score is better.
pub fn by_score<C>(a: &CandidateEvaluation<C>, b: &CandidateEvaluation<C>) -> Ordering {
    a.score.total_cmp(&b.score)
}

/// Selects classifier configurations from a parameter space.
///
/// The deduplicated space is split into one space per measure. Each space
/// has its own visiting order and its own patience, and the spaces take
/// turns by [`SpaceOrder`]. A candidate improves its space when the
/// comparator ranks it `Greater` than every earlier candidate from that
/// space; ties do not re-arm patience.
///
/// Every candidate is seeded from a generator seeded with the tuner's seed
/// before it is configured. Candidates are evaluated one at a time, or in
/// batches of the executor's concurrency bound when an executor is attached.
/// Results are always fed to the selectors on the calling thread.
#[derive(Debug, Clone, Default)]
pub struct Tuner {
    config: TunerConfig,
    executor: Option<Arc<BoundedExecutor>>,
}

impl Tuner {
    /// Create a sequential tuner.
    #[must_use]
    pub fn new(config: TunerConfig) -> Self {
        Self {
            config,
            executor: None,
        }
    }

    /// Evaluate candidates in parallel on `executor`.
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<BoundedExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Return the configuration.
    #[must_use]
    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    /// Tune one classifier over the space built from `data`, ranking by
    /// [`by_score`]. Ties for best are broken uniformly at random.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TuneError::InvalidConfig`] | A zero evaluation cap or patience |
    /// | [`TuneError::Param`] | `build` fails |
    /// | [`TuneError::EmptySpace`] | The space has no sets |
    /// | [`TuneError::AllEvaluationsFailed`] | No candidate produced a score |
    pub fn tune<C, S, B>(
        &self,
        supplier: S,
        build: B,
        data: &LabelledDataset,
    ) -> Result<TuningOutcome<C>, TuneError>
    where
        C: Classifier + 'static,
        S: Fn() -> C + Send + Sync + 'static,
        B: FnOnce(&LabelledDataset) -> Result<ParameterSpace, ParamError>,
    {
        self.tune_with(supplier, build, data, by_score)
    }

    /// [`Tuner::tune`] with a custom comparator; `Greater` means the first
    /// argument is better.
    ///
    /// # Errors
    ///
    /// As [`Tuner::tune`].
    pub fn tune_with<C, S, B, G>(
        &self,
        supplier: S,
        build: B,
        data: &LabelledDataset,
        compare: G,
    ) -> Result<TuningOutcome<C>, TuneError>
    where
        C: Classifier + 'static,
        S: Fn() -> C + Send + Sync + 'static,
        B: FnOnce(&LabelledDataset) -> Result<ParameterSpace, ParamError>,
        G: Fn(&CandidateEvaluation<C>, &CandidateEvaluation<C>) -> Ordering + Send + Sync + 'static,
    {
        self.run(supplier, build, data, |_| (), compare)
    }

    /// Tune over a union of spaces, keeping the best candidate per distance
    /// measure. Every measure gets its own patience, so a plateau in one
    /// space never cuts the search of another short.
    ///
    /// # Errors
    ///
    /// As [`Tuner::tune`].
    pub fn tune_per_group<C, S, B>(
        &self,
        supplier: S,
        build: B,
        data: &LabelledDataset,
    ) -> Result<TuningOutcome<C>, TuneError>
    where
        C: Classifier + 'static,
        S: Fn() -> C + Send + Sync + 'static,
        B: FnOnce(&LabelledDataset) -> Result<ParameterSpace, ParamError>,
    {
        self.run(
            supplier,
            build,
            data,
            |e: &CandidateEvaluation<C>| e.parameters.measure().unwrap_or_default().to_string(),
            by_score,
        )
    }

    #[instrument(
        skip_all,
        fields(order = ?self.config.order, space_order = ?self.config.space_order, seed = self.config.seed)
    )]
    fn run<C, S, B, K, KF, G>(
        &self,
        supplier: S,
        build: B,
        data: &LabelledDataset,
        key_fn: KF,
        compare: G,
    ) -> Result<TuningOutcome<C>, TuneError>
    where
        C: Classifier + 'static,
        S: Fn() -> C + Send + Sync + 'static,
        B: FnOnce(&LabelledDataset) -> Result<ParameterSpace, ParamError>,
        K: Eq + Hash + Clone,
        KF: Fn(&CandidateEvaluation<C>) -> K + Send + Sync + 'static,
        G: Fn(&CandidateEvaluation<C>, &CandidateEvaluation<C>) -> Ordering + Send + Sync + 'static,
    {
        self.config.validate()?;
        let mut space = build(data)?;
        let built = space.size();
        space.remove_duplicate_values();
        if space.is_empty() {
            return Err(TuneError::EmptySpace);
        }
        let candidates = space.size();
        let mut schedule = self.schedule(space);
        info!(
            candidates,
            duplicates = built - candidates,
            spaces = schedule.spaces.len(),
            "tuning started"
        );

        // Group keys never split a space, so each space's ties are a
        // superset of what the final selector keeps from it.
        let compare = Arc::new(compare);
        let per_space_compare = Arc::clone(&compare);
        let mut per_space = BestPerTypeSelector::new(
            |e: &CandidateEvaluation<C>| e.parameters.measure().map(str::to_owned),
            move |a: &CandidateEvaluation<C>, b: &CandidateEvaluation<C>| {
                (*per_space_compare)(a, b)
            },
            self.config.seed,
        );
        let mut evaluations = Vec::new();
        let supplier = Arc::new(supplier);
        let batch_size = self.executor.as_ref().map_or(1, |e| e.max_concurrency());

        loop {
            let batch: Vec<Scheduled> =
                std::iter::from_fn(|| schedule.next()).take(batch_size).collect();
            if batch.is_empty() {
                break;
            }
            for (scheduled, result) in self.evaluate_batch(&supplier, batch, data) {
                let Scheduled {
                    space: index,
                    parameters,
                    ..
                } = scheduled;
                match result {
                    Ok(evaluation) => {
                        let score = evaluation.score;
                        let measure = schedule.spaces[index].measure.clone();
                        let retained = per_space.add(evaluation);
                        if retained && per_space.group(&measure).len() == 1 {
                            schedule.improved(index);
                            debug!(%parameters, score, "new best in space");
                        }
                        evaluations.push(EvaluationRecord {
                            parameters,
                            score: Some(score),
                        });
                    }
                    Err(err) => {
                        warn!(%parameters, error = %err, "candidate evaluation failed");
                        evaluations.push(EvaluationRecord {
                            parameters,
                            score: None,
                        });
                    }
                }
            }
        }

        let mut selector = BestPerTypeSelector::new(
            key_fn,
            move |a: &CandidateEvaluation<C>, b: &CandidateEvaluation<C>| {
                (*compare)(a, b)
            },
            self.config.seed,
        );
        for (_, ties) in per_space.into_groups() {
            for evaluation in ties {
                selector.add(evaluation);
            }
        }
        let selected = selector.into_selected();
        let Some(best) = selected.first() else {
            return Err(TuneError::AllEvaluationsFailed {
                attempted: evaluations.len(),
            });
        };
        info!(
            evaluated = evaluations.len(),
            groups = selected.len(),
            best = best.score,
            "tuning finished"
        );
        Ok(TuningOutcome {
            selected,
            evaluations,
            spaces: schedule.summaries(),
        })
    }

    /// Split `space` by measure and wrap each part in its own ordered,
    /// patience-limited search.
    fn schedule(&self, space: ParameterSpace) -> Schedule {
        let patience = self.config.patience.unwrap_or(usize::MAX);
        let spaces: Vec<Space> = split_by_measure(space.into_sets())
            .into_iter()
            .enumerate()
            .map(|(i, (measure, sets))| {
                let size = sets.len();
                let ordered = self.ordered(sets, self.config.seed.wrapping_add(i as u64));
                Space {
                    measure,
                    size,
                    search: Siphon::new(
                        ThresholdIterator::new(ordered, patience),
                        LinearIterator::new(Vec::new()),
                    ),
                }
            })
            .collect();
        let indices: Vec<usize> = (0..spaces.len()).collect();
        let turns: BoxedIterator<usize> = match self.config.space_order {
            SpaceOrder::RoundRobin => Box::new(RoundRobinIterator::new(indices)),
            SpaceOrder::Random => Box::new(RandomIterator::new(indices, self.config.seed)),
        };
        Schedule {
            spaces,
            turns,
            remaining: self.config.max_evaluations.unwrap_or(usize::MAX),
            seeds: ChaCha8Rng::seed_from_u64(self.config.seed),
        }
    }

    fn ordered(&self, sets: Vec<ParameterSet>, seed: u64) -> BoxedIterator<ParameterSet> {
        match self.config.order {
            SearchOrder::Linear => Box::new(LinearIterator::new(sets)),
            SearchOrder::Random => Box::new(RandomIterator::without_replacement(sets, seed)),
            SearchOrder::Spread => Box::new(SpreadIterator::new(sets)),
        }
    }

    fn evaluate_batch<C, S>(
        &self,
        supplier: &Arc<S>,
        batch: Vec<Scheduled>,
        data: &LabelledDataset,
    ) -> Vec<(Scheduled, Result<CandidateEvaluation<C>, TuneError>)>
    where
        C: Classifier + 'static,
        S: Fn() -> C + Send + Sync + 'static,
    {
        let Some(executor) = &self.executor else {
            return batch
                .into_iter()
                .map(|scheduled| {
                    let result =
                        evaluate(supplier.as_ref(), &scheduled.parameters, scheduled.seed, data);
                    (scheduled, result)
                })
                .collect();
        };

        let tasks: Vec<_> = batch
            .iter()
            .map(|scheduled| {
                let supplier = Arc::clone(supplier);
                let parameters = scheduled.parameters.clone();
                let seed = scheduled.seed;
                let data = data.clone();
                move |_: &CancelToken| evaluate(supplier.as_ref(), &parameters, seed, &data)
            })
            .collect();
        let timeout = self.config.batch_timeout.unwrap_or(Duration::MAX);
        batch
            .into_iter()
            .zip(executor.invoke_all(tasks, timeout))
            .map(|(scheduled, outcome)| (scheduled, outcome.map_err(TuneError::from).and_then(|r| r)))
            .collect()
    }
}

type SpaceSearch =
    Siphon<ThresholdIterator<BoxedIterator<ParameterSet>>, LinearIterator<ParameterSet>>;

/// One measure's candidate sets. The siphon keeps every set handed out.
struct Space {
    measure: Option<String>,
    size: usize,
    search: SpaceSearch,
}

/// A candidate set drawn from a space, with the seed for its classifier.
struct Scheduled {
    space: usize,
    parameters: ParameterSet,
    seed: u64,
}

/// Draws candidate sets from the spaces in turn.
struct Schedule {
    spaces: Vec<Space>,
    turns: BoxedIterator<usize>,
    remaining: usize,
    seeds: ChaCha8Rng,
}

impl Schedule {
    fn next(&mut self) -> Option<Scheduled> {
        if self.remaining == 0 {
            return None;
        }
        while let Some(index) = self.turns.next() {
            let space = &mut self.spaces[index];
            let drawn: Option<ParameterSet> = space.search.next();
            match drawn {
                Some(parameters) => {
                    self.remaining -= 1;
                    return Some(Scheduled {
                        space: index,
                        parameters,
                        seed: self.seeds.next_u64(),
                    });
                }
                None => {
                    self.turns.remove();
                    debug!(
                        measure = ?space.measure,
                        visited = space.search.destination().len(),
                        size = space.size,
                        "space finished"
                    );
                }
            }
        }
        None
    }

    /// Re-arm the patience of space `index`.
    fn improved(&mut self, index: usize) {
        self.spaces[index].search.source_mut().reset_count();
    }

    fn summaries(&self) -> Vec<SpaceSummary> {
        self.spaces
            .iter()
            .map(|space| SpaceSummary {
                measure: space.measure.clone(),
                size: space.size,
                visited: space.search.destination().len(),
            })
            .collect()
    }
}

/// Group sets by measure, keeping first-seen order of both groups and sets.
fn split_by_measure(sets: Vec<ParameterSet>) -> Vec<(Option<String>, Vec<ParameterSet>)> {
    let mut groups: Vec<(Option<String>, Vec<ParameterSet>)> = Vec::new();
    for set in sets {
        let measure = set.measure().map(str::to_owned);
        match groups.iter_mut().find(|(m, _)| *m == measure) {
            Some((_, members)) => members.push(set),
            None => groups.push((measure, vec![set])),
        }
    }
    groups
}

impl Seedable for Tuner {
    fn set_seed(&mut self, seed: u64) {
        self.config.seed = seed;
    }

    fn seed(&self) -> u64 {
        self.config.seed
    }
}

fn evaluate<C, S>(
    supplier: &S,
    parameters: &ParameterSet,
    seed: u64,
    data: &LabelledDataset,
) -> Result<CandidateEvaluation<C>, TuneError>
where
    C: Classifier,
    S: Fn() -> C,
{
    let mut classifier = supplier();
    classifier.set_seed(seed);
    classifier.configure(&parameters.to_options())?;
    classifier.train(data)?;
    let score = classifier.train_score().ok_or(TuneError::MissingTrainScore)?;
    debug!(%parameters, score, "candidate evaluated");
    Ok(CandidateEvaluation {
        classifier,
        parameters: parameters.clone(),
        score,
    })
}
