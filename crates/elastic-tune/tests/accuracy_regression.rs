//! Accuracy regression tests for elastic-tune.
//!
//! End-to-end tuning of the 1-NN classifier on a small dataset with three
//! well separated classes, so every sensible configuration scores perfectly
//! and results are stable.

use std::sync::Arc;

use elastic_distance::{MeasureRegistry, TimeSeries};
use elastic_tune::{
    BoundedExecutor, Classifier, LabelledDataset, NearestNeighbour, ParamError, ParameterSpace,
    SPACE_NAMES, SearchOrder, SpaceOrder, Tuner, TunerConfig, dtw_space, elastic_ensemble_spaces,
    msm_space,
};

// ---------------------------------------------------------------------------
// Helper
// ---------------------------------------------------------------------------

/// Nine series in three tight classes around 0, 5 and 10.
fn archetype_data() -> LabelledDataset {
    let rows = [
        ([0.0, 0.0, 0.0, 0.0, 0.0, 0.0], "low"),
        ([0.1, 0.0, 0.0, 0.1, 0.0, 0.0], "low"),
        ([0.0, 0.1, 0.0, 0.0, 0.1, 0.0], "low"),
        ([5.0, 5.0, 5.0, 5.0, 5.0, 5.0], "mid"),
        ([5.1, 5.0, 5.0, 5.1, 5.0, 5.0], "mid"),
        ([5.0, 5.1, 5.0, 5.0, 5.1, 5.0], "mid"),
        ([10.0, 10.0, 10.0, 10.0, 10.0, 10.0], "high"),
        ([10.1, 10.0, 10.0, 10.1, 10.0, 10.0], "high"),
        ([10.0, 10.1, 10.0, 10.0, 10.1, 10.0], "high"),
    ];
    let series = rows
        .iter()
        .map(|(values, _)| TimeSeries::new(values.to_vec()).unwrap())
        .collect();
    let labels = rows.iter().map(|(_, label)| (*label).to_string()).collect();
    LabelledDataset::new(series, labels).unwrap()
}

fn supplier() -> impl Fn() -> NearestNeighbour + Send + Sync + 'static {
    let registry = Arc::new(MeasureRegistry::standard());
    move || NearestNeighbour::new(Arc::clone(&registry))
}

// ---------------------------------------------------------------------------
// a) tuned_dtw_scores_perfectly
// ---------------------------------------------------------------------------

#[test]
fn tuned_dtw_scores_perfectly() {
    let data = archetype_data();
    let outcome = Tuner::new(TunerConfig::new())
        .tune(supplier(), |d: &LabelledDataset| dtw_space(d), &data)
        .unwrap();
    let best = outcome.best();
    assert_eq!(best.score, 1.0);
    assert_eq!(best.parameters.measure(), Some("dtw"));
    // Windows 0..=5 over length-6 series.
    assert_eq!(outcome.evaluations().len(), 6);
    assert_eq!(best.classifier.train_score(), Some(1.0));
}

// ---------------------------------------------------------------------------
// b) tuned_classifier_predicts_unseen_series
// ---------------------------------------------------------------------------

#[test]
fn tuned_classifier_predicts_unseen_series() {
    let data = archetype_data();
    let outcome = Tuner::new(TunerConfig::new().with_order(SearchOrder::Spread))
        .tune(supplier(), |_: &LabelledDataset| msm_space(), &data)
        .unwrap();
    let clf = &outcome.best().classifier;
    let probe = TimeSeries::new(vec![4.9, 5.2, 5.0, 4.8, 5.1, 5.0]).unwrap();
    assert_eq!(clf.predict(probe.as_view()).unwrap(), "mid");
    assert_eq!(clf.options().get("measure"), Some("msm"));
}

// ---------------------------------------------------------------------------
// c) per_group_tuning_keeps_one_configuration_per_measure
// ---------------------------------------------------------------------------

#[test]
fn per_group_tuning_keeps_one_configuration_per_measure() {
    let data = archetype_data();
    let config = TunerConfig::new()
        .with_order(SearchOrder::Random)
        .with_max_evaluations(Some(120))
        .with_seed(7);
    let outcome = Tuner::new(config)
        .tune_per_group(
            supplier(),
            |d: &LabelledDataset| {
                let mut union = ParameterSpace::new();
                for space in elastic_ensemble_spaces(d)? {
                    union.add_all(space);
                }
                Ok(union)
            },
            &data,
        )
        .unwrap();

    assert_eq!(outcome.evaluations().len(), 120);
    let mut measures: Vec<_> = outcome
        .selected()
        .iter()
        .map(|e| e.parameters.measure().unwrap().to_string())
        .collect();
    let n_groups = measures.len();
    measures.sort();
    measures.dedup();
    assert_eq!(measures.len(), n_groups, "one candidate per measure");
    for evaluation in outcome.selected() {
        let group_max = outcome
            .evaluations()
            .iter()
            .filter(|r| r.parameters.measure() == evaluation.parameters.measure())
            .filter_map(|r| r.score)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(evaluation.score, group_max);
    }
}

// ---------------------------------------------------------------------------
// d) parallel_tuning_matches_sequential
// ---------------------------------------------------------------------------

#[test]
fn parallel_tuning_matches_sequential() {
    let data = archetype_data();
    let sequential = Tuner::new(TunerConfig::new())
        .tune(supplier(), |d: &LabelledDataset| dtw_space(d), &data)
        .unwrap();
    let executor = Arc::new(BoundedExecutor::new(4, 4).unwrap());
    let parallel = Tuner::new(TunerConfig::new())
        .with_executor(executor)
        .tune(supplier(), |d: &LabelledDataset| dtw_space(d), &data)
        .unwrap();
    assert_eq!(sequential.evaluations(), parallel.evaluations());
    assert_eq!(sequential.best().parameters, parallel.best().parameters);
}

// ---------------------------------------------------------------------------
// e) ensemble_space_set_is_complete
// ---------------------------------------------------------------------------

#[test]
fn ensemble_space_set_is_complete() {
    let data = archetype_data();
    let spaces = elastic_ensemble_spaces(&data).unwrap();
    assert_eq!(spaces.len(), SPACE_NAMES.len());
    let total: usize = spaces.iter().map(ParameterSpace::size).sum();
    // ed 1, full dtw 1, dtw 6, full ddtw 1, ddtw 6, wdtw 100, wddtw 100,
    // lcss 10 x 2, erp 2 x 10, msm 100, twe 100.
    assert_eq!(total, 1 + 1 + 6 + 1 + 6 + 100 + 100 + 20 + 20 + 100 + 100);
}

// ---------------------------------------------------------------------------
// f) every_measure_survives_patience
// ---------------------------------------------------------------------------

#[test]
fn every_measure_survives_patience() {
    let data = archetype_data();
    let ensemble = |d: &LabelledDataset| -> Result<ParameterSpace, ParamError> {
        let mut union = ParameterSpace::new();
        for space in elastic_ensemble_spaces(d)? {
            union.add_all(space);
        }
        Ok(union)
    };
    for space_order in [SpaceOrder::RoundRobin, SpaceOrder::Random] {
        let config = TunerConfig::new()
            .with_patience(Some(2))
            .with_space_order(space_order);
        let outcome = Tuner::new(config)
            .tune_per_group(supplier(), ensemble, &data)
            .unwrap();

        // ed and full dtw share the dtw space, full ddtw the ddtw space.
        assert_eq!(outcome.spaces().len(), 8);
        assert_eq!(outcome.selected().len(), 8, "{space_order:?}");
        assert!(outcome.spaces().iter().all(|s| s.visited >= 1 && s.visited <= s.size));
        let total: usize = outcome.spaces().iter().map(|s| s.size).sum();
        assert!(outcome.evaluations().len() < total);
    }
}
