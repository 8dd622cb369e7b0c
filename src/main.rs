use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use elastic_distance::{MeasureRegistry, Options};
use elastic_io::{DatasetReader, ExperimentName, ResultWriter};
use elastic_tune::{
    BoundedExecutor, Classifier, DatasetSummary, LabelledDataset, NearestNeighbour, ParamError,
    ParameterSpace, SPACE_NAMES, SearchOrder, SpaceOrder, Tuner, TunerConfig, build_space,
};

#[derive(Parser)]
#[command(name = "elastic")]
#[command(about = "Elastic distance measures and parameter tuning for time series classification")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Search settings shared by every tuning run.
#[derive(Args, Debug, Clone)]
struct SearchArgs {
    /// Candidate order within each measure: "linear", "random", or "spread"
    #[arg(long, default_value = "linear")]
    order: String,

    /// How measures take turns: "round-robin" or "random"
    #[arg(long, default_value = "round-robin")]
    space_order: String,

    /// Stop after this many candidates
    #[arg(long)]
    max_evals: Option<usize>,

    /// Retire a measure after this many of its candidates without a strict improvement
    #[arg(long)]
    patience: Option<usize>,

    /// Evaluate up to this many candidates concurrently (1 = sequential)
    #[arg(long, default_value_t = 1)]
    parallel: usize,

    /// Per-batch time limit in seconds for concurrent evaluation
    #[arg(long)]
    batch_timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Tune 1-NN classifiers over one or more parameter spaces
    Tune {
        /// Path to the training CSV file (label,t0,t1,...)
        #[arg(long)]
        train: PathBuf,

        /// Path to a held-out CSV file scored with each selected configuration
        #[arg(long)]
        test: Option<PathBuf>,

        /// Comma-separated space names, or "all" for the full ensemble set
        #[arg(long, value_delimiter = ',', default_value = "all")]
        spaces: Vec<String>,

        /// Keep the best configuration per distance measure instead of one overall
        #[arg(long, default_value_t = false)]
        per_group: bool,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Compute the distance between two rows of a CSV file
    Distance {
        /// Path to the CSV file (label,t0,t1,...)
        #[arg(long)]
        data: PathBuf,

        /// Zero-based index of the first row
        #[arg(long)]
        first: usize,

        /// Zero-based index of the second row
        #[arg(long)]
        second: usize,

        /// Registered measure name
        #[arg(long, default_value = "dtw")]
        measure: String,

        /// Flat comma-separated key,value options, e.g. "window,3"
        #[arg(long, value_delimiter = ',')]
        options: Vec<String>,

        /// Abandon once the distance exceeds this bound (reported as null)
        #[arg(long)]
        cutoff: Option<f64>,
    },

    /// List registered measures and named parameter spaces
    Measures,
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TuneOutput {
    experiment: String,
    n_train: usize,
    n_test: Option<usize>,
    n_evaluated: usize,
    n_failed: usize,
    selected: Vec<SelectedOutput>,
    artifact: PathBuf,
}

#[derive(Serialize)]
struct SelectedOutput {
    options: Vec<String>,
    train_score: f64,
    test_accuracy: Option<f64>,
}

#[derive(Serialize)]
struct DistanceOutput {
    measure: String,
    options: Vec<String>,
    first: RowOutput,
    second: RowOutput,
    distance: Option<f64>,
}

#[derive(Serialize)]
struct RowOutput {
    index: usize,
    label: String,
}

#[derive(Serialize)]
struct MeasuresOutput {
    measures: Vec<MeasureOutput>,
    spaces: Vec<&'static str>,
}

#[derive(Serialize)]
struct MeasureOutput {
    name: &'static str,
    default_options: Vec<String>,
}

fn parse_order(s: &str) -> Result<SearchOrder> {
    match s {
        "linear" => Ok(SearchOrder::Linear),
        "random" => Ok(SearchOrder::Random),
        "spread" => Ok(SearchOrder::Spread),
        other => anyhow::bail!("unknown search order: {other} (expected linear, random, or spread)"),
    }
}

fn parse_space_order(s: &str) -> Result<SpaceOrder> {
    match s {
        "round-robin" => Ok(SpaceOrder::RoundRobin),
        "random" => Ok(SpaceOrder::Random),
        other => anyhow::bail!("unknown space order: {other} (expected round-robin or random)"),
    }
}

fn resolve_spaces(spaces: &[String]) -> Result<Vec<&'static str>> {
    if spaces.iter().any(|s| s == "all") {
        return Ok(SPACE_NAMES.to_vec());
    }
    spaces
        .iter()
        .map(|name| {
            SPACE_NAMES
                .iter()
                .copied()
                .find(|known| *known == name.as_str())
                .with_context(|| {
                    format!("unknown space: {name} (expected one of {})", SPACE_NAMES.join(", "))
                })
        })
        .collect()
}

fn build_tuner(seed: u64, search: &SearchArgs, threads: Option<usize>) -> Result<Tuner> {
    let config = TunerConfig::new()
        .with_seed(seed)
        .with_order(parse_order(&search.order)?)
        .with_space_order(parse_space_order(&search.space_order)?)
        .with_max_evaluations(search.max_evals)
        .with_patience(search.patience)
        .with_batch_timeout(search.batch_timeout_secs.map(Duration::from_secs));
    let tuner = Tuner::new(config);
    if search.parallel <= 1 {
        return Ok(tuner);
    }
    let executor = BoundedExecutor::new(search.parallel, threads.unwrap_or(search.parallel))
        .context("failed to build evaluation executor")?;
    info!(max_concurrency = search.parallel, "concurrent evaluation enabled");
    Ok(tuner.with_executor(Arc::new(executor)))
}

fn read_dataset(path: &Path) -> Result<LabelledDataset> {
    DatasetReader::new(path)
        .read()
        .with_context(|| format!("failed to read {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    let registry = Arc::new(MeasureRegistry::standard());

    match cli.command {
        Command::Tune {
            train,
            test,
            spaces,
            per_group,
            experiment,
            output_dir,
            search,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())
                .context("invalid experiment name")?;
            let train_data = read_dataset(&train)?;
            let test_data = test.as_deref().map(read_dataset).transpose()?;
            let space_names = resolve_spaces(&spaces)?;
            info!(
                n_train = train_data.len(),
                length = train_data.series_length(),
                spaces = ?space_names,
                per_group,
                "starting tuning run"
            );

            let tuner = build_tuner(cli.seed, &search, cli.threads)?;
            let supplier = {
                let registry = Arc::clone(&registry);
                move || NearestNeighbour::new(Arc::clone(&registry))
            };
            let build = |d: &LabelledDataset| -> Result<ParameterSpace, ParamError> {
                let mut union = ParameterSpace::new();
                for name in &space_names {
                    union.add_all(build_space(name, d)?);
                }
                Ok(union)
            };
            let outcome = if per_group {
                tuner.tune_per_group(supplier, build, &train_data)
            } else {
                tuner.tune(supplier, build, &train_data)
            }
            .context("tuning failed")?;

            let test_accuracy = outcome
                .selected()
                .iter()
                .map(|candidate| {
                    test_data
                        .as_ref()
                        .map(|data| candidate.classifier.accuracy(data))
                        .transpose()
                })
                .collect::<Result<Vec<_>, _>>()
                .context("failed to score held-out data")?;

            let writer = ResultWriter::new(&output_dir, experiment_name)
                .context("failed to create result writer")?;
            let artifact = writer
                .write_tuned(&train_data, &outcome, &test_accuracy)
                .context("failed to write tuning results")?;

            let output = TuneOutput {
                experiment,
                n_train: train_data.len(),
                n_test: test_data.as_ref().map(LabelledDataset::len),
                n_evaluated: outcome.evaluations().len(),
                n_failed: outcome.failed(),
                selected: outcome
                    .selected()
                    .iter()
                    .zip(&test_accuracy)
                    .map(|(candidate, &test_accuracy)| SelectedOutput {
                        options: candidate.parameters.to_options().to_flat(),
                        train_score: candidate.score,
                        test_accuracy,
                    })
                    .collect(),
                artifact,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Distance {
            data,
            first,
            second,
            measure,
            options,
            cutoff,
        } => {
            let dataset = read_dataset(&data)?;
            for index in [first, second] {
                anyhow::ensure!(
                    index < dataset.len(),
                    "row {index} out of range ({} rows in {})",
                    dataset.len(),
                    data.display()
                );
            }
            let options = Options::parse(&options).context("invalid measure options")?;
            let measure_impl = registry
                .create_with_options(&measure, &options)
                .with_context(|| format!("failed to configure measure {measure}"))?;

            let a = dataset.series()[first].as_view();
            let b = dataset.series()[second].as_view();
            let distance = match cutoff {
                Some(cutoff) => measure_impl.distance(a, b, cutoff),
                None => measure_impl.distance_unbounded(a, b),
            };
            info!(measure = %measure, distance, "computed distance");

            let output = DistanceOutput {
                measure,
                options: measure_impl.options().to_flat(),
                first: RowOutput {
                    index: first,
                    label: dataset.label(first).to_string(),
                },
                second: RowOutput {
                    index: second,
                    label: dataset.label(second).to_string(),
                },
                // JSON has no infinity; an abandoned computation is null.
                distance: distance.is_finite().then_some(distance),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Measures => {
            let measures = registry
                .names()
                .map(|name| {
                    let measure = registry.create(name)?;
                    Ok(MeasureOutput {
                        name,
                        default_options: measure.options().to_flat(),
                    })
                })
                .collect::<Result<Vec<_>, elastic_distance::DistanceError>>()?;
            let output = MeasuresOutput {
                measures,
                spaces: SPACE_NAMES.to_vec(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
