//! Criterion benchmarks for elastic-tune: leave-one-out scoring and tuning runs.

use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};

use elastic_distance::{MeasureRegistry, Options, TimeSeries};
use elastic_tune::{
    BoundedExecutor, Classifier, LabelledDataset, NearestNeighbour, SearchOrder, Tuner,
    TunerConfig, dtw_space, lcss_space,
};

fn make_dataset() -> LabelledDataset {
    let offsets = [0.0, 1.5, 3.0, 4.5];
    let mut series = Vec::new();
    let mut labels = Vec::new();
    for (class, &offset) in offsets.iter().enumerate() {
        for j in 0..15 {
            let values: Vec<f64> = (0..64)
                .map(|i| (i as f64 * 0.1 + j as f64 * 0.05).sin() + offset)
                .collect();
            series.push(TimeSeries::new(values).unwrap());
            labels.push(format!("c{class}"));
        }
    }
    LabelledDataset::new(series, labels).unwrap()
}

fn bench_leave_one_out(c: &mut Criterion) {
    let data = make_dataset();
    let registry = Arc::new(MeasureRegistry::standard());
    for name in ["dtw", "wdtw", "msm", "twe"] {
        let mut clf = NearestNeighbour::new(Arc::clone(&registry));
        clf.configure(&Options::new().with("measure", name)).unwrap();
        c.bench_function(&format!("loocv_60x64_{name}"), |b| {
            b.iter(|| clf.train(&data).unwrap());
        });
    }
}

fn bench_tune_dtw(c: &mut Criterion) {
    let data = make_dataset();
    let registry = Arc::new(MeasureRegistry::standard());
    let tuner = Tuner::new(
        TunerConfig::new()
            .with_order(SearchOrder::Spread)
            .with_max_evaluations(Some(10)),
    );

    c.bench_function("tune_dtw_spread_10_60x64", |b| {
        b.iter(|| {
            let registry = Arc::clone(&registry);
            tuner
                .tune(
                    move || NearestNeighbour::new(Arc::clone(&registry)),
                    |d: &LabelledDataset| dtw_space(d),
                    &data,
                )
                .unwrap()
        });
    });
}

fn bench_tune_parallel(c: &mut Criterion) {
    let data = make_dataset();
    let registry = Arc::new(MeasureRegistry::standard());
    let executor = Arc::new(BoundedExecutor::new(4, 4).unwrap());
    let tuner = Tuner::new(TunerConfig::new().with_max_evaluations(Some(20)))
        .with_executor(executor);

    c.bench_function("tune_lcss_parallel4_20_60x64", |b| {
        b.iter(|| {
            let registry = Arc::clone(&registry);
            tuner
                .tune(
                    move || NearestNeighbour::new(Arc::clone(&registry)),
                    |d: &LabelledDataset| lcss_space(d),
                    &data,
                )
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_leave_one_out, bench_tune_dtw, bench_tune_parallel);
criterion_main!(benches);
