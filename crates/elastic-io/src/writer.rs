//! JSON result writer for tuning runs.

use std::fs;
use std::path::{Path, PathBuf};

use elastic_tune::{DatasetSummary, LabelledDataset, ParamValue, ParameterSet, TuningOutcome};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Writes tuning results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_tuned.json`.
#[derive(Debug)]
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Path of the tuning artifact, whether or not it has been written.
    #[must_use]
    pub fn tuned_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_tuned.json", self.experiment.as_str()))
    }

    /// Write a tuning outcome to `{experiment}_tuned.json`.
    ///
    /// `test_accuracy[i]` is the held-out accuracy of `outcome.selected()[i]`;
    /// missing entries are written as `null`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Serialize`] | The artifact cannot be encoded |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all, fields(experiment = %self.experiment))]
    pub fn write_tuned<C>(
        &self,
        train: &LabelledDataset,
        outcome: &TuningOutcome<C>,
        test_accuracy: &[Option<f64>],
    ) -> Result<PathBuf, IoError> {
        let path = self.tuned_path();

        let selected = outcome
            .selected()
            .iter()
            .enumerate()
            .map(|(i, candidate)| SelectedEntry {
                measure: candidate.parameters.measure(),
                parameters: parameter_entries(&candidate.parameters),
                train_score: candidate.score,
                test_accuracy: test_accuracy.get(i).copied().flatten(),
            })
            .collect();

        let evaluations = outcome
            .evaluations()
            .iter()
            .map(|record| EvaluationEntry {
                parameters: parameter_entries(&record.parameters),
                score: record.score,
            })
            .collect();

        let spaces = outcome
            .spaces()
            .iter()
            .map(|space| SpaceEntry {
                measure: space.measure.as_deref(),
                size: space.size,
                visited: space.visited,
            })
            .collect();

        let artifact = TunedArtifact {
            experiment: self.experiment.as_str(),
            n_series: train.len(),
            series_length: train.series_length(),
            classes: train.classes(),
            n_evaluated: outcome.evaluations().len(),
            n_failed: outcome.failed(),
            selected,
            spaces,
            evaluations,
        };

        let json = serde_json::to_string_pretty(&artifact).map_err(|e| IoError::Serialize {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), n_selected = artifact.selected.len(), "wrote tuning results");
        Ok(path)
    }
}

fn parameter_entries(set: &ParameterSet) -> Vec<ParameterEntry<'_>> {
    set.iter()
        .map(|p| ParameterEntry {
            name: &p.name,
            value: json_value(&p.value),
        })
        .collect()
}

fn json_value(value: &ParamValue) -> serde_json::Value {
    match value {
        ParamValue::Int(i) => serde_json::Value::from(*i),
        ParamValue::Float(x) => serde_json::Value::from(*x),
        ParamValue::Text(s) => serde_json::Value::from(s.as_str()),
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct TunedArtifact<'a> {
    experiment: &'a str,
    n_series: usize,
    series_length: usize,
    classes: &'a [String],
    n_evaluated: usize,
    n_failed: usize,
    selected: Vec<SelectedEntry<'a>>,
    spaces: Vec<SpaceEntry<'a>>,
    evaluations: Vec<EvaluationEntry<'a>>,
}

#[derive(Serialize)]
struct SelectedEntry<'a> {
    measure: Option<&'a str>,
    parameters: Vec<ParameterEntry<'a>>,
    train_score: f64,
    test_accuracy: Option<f64>,
}

#[derive(Serialize)]
struct SpaceEntry<'a> {
    measure: Option<&'a str>,
    size: usize,
    visited: usize,
}

#[derive(Serialize)]
struct EvaluationEntry<'a> {
    parameters: Vec<ParameterEntry<'a>>,
    score: Option<f64>,
}

#[derive(Serialize)]
struct ParameterEntry<'a> {
    name: &'a str,
    value: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use elastic_distance::{MeasureRegistry, TimeSeries};
    use elastic_tune::{MEASURE, NearestNeighbour, ParameterSpace, Tuner, TunerConfig};
    use tempfile::TempDir;

    fn dataset() -> LabelledDataset {
        let rows = [
            ("a", vec![0.0, 0.0, 1.0, 0.0]),
            ("a", vec![0.0, 1.0, 0.0, 0.0]),
            ("b", vec![5.0, 5.0, 6.0, 5.0]),
            ("b", vec![5.0, 6.0, 5.0, 5.0]),
        ];
        let (labels, series): (Vec<String>, Vec<TimeSeries>) = rows
            .into_iter()
            .map(|(l, v)| (l.to_string(), TimeSeries::new(v).unwrap()))
            .unzip();
        LabelledDataset::new(series, labels).unwrap()
    }

    fn outcome(data: &LabelledDataset) -> TuningOutcome<NearestNeighbour> {
        let registry = Arc::new(MeasureRegistry::standard());
        let space = ParameterSpace::new()
            .with_dimension(MEASURE, ["dtw"])
            .unwrap()
            .with_dimension("window", [0_i64, 2])
            .unwrap();
        Tuner::new(TunerConfig::new())
            .tune(
                move || NearestNeighbour::new(Arc::clone(&registry)),
                |_: &LabelledDataset| Ok(space),
                data,
            )
            .unwrap()
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn new_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("runs").join("today");
        let writer =
            ResultWriter::new(&nested, ExperimentName::new("exp".into()).unwrap()).unwrap();
        assert!(nested.is_dir());
        assert_eq!(writer.tuned_path(), nested.join("exp_tuned.json"));
    }

    #[test]
    fn write_tuned_json_structure() {
        let data = dataset();
        let outcome = outcome(&data);
        let dir = TempDir::new().unwrap();
        let writer =
            ResultWriter::new(dir.path(), ExperimentName::new("unit".into()).unwrap()).unwrap();
        let path = writer.write_tuned(&data, &outcome, &[Some(0.75)]).unwrap();

        let content = read_json(&path);
        assert_eq!(content["experiment"], "unit");
        assert_eq!(content["n_series"], 4);
        assert_eq!(content["series_length"], 4);
        assert_eq!(content["classes"], serde_json::json!(["a", "b"]));
        assert_eq!(content["n_evaluated"], 2);
        assert_eq!(content["n_failed"], 0);

        let selected = content["selected"].as_array().unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0]["measure"], "dtw");
        assert_eq!(selected[0]["train_score"], 1.0);
        assert_eq!(selected[0]["test_accuracy"], 0.75);
        let params = selected[0]["parameters"].as_array().unwrap();
        assert_eq!(params[0]["name"], "measure");
        assert_eq!(params[1]["name"], "window");
        assert!(params[1]["value"].is_i64());

        assert_eq!(
            content["spaces"],
            serde_json::json!([{ "measure": "dtw", "size": 2, "visited": 2 }])
        );

        let evaluations = content["evaluations"].as_array().unwrap();
        assert_eq!(evaluations.len(), 2);
        assert!(evaluations.iter().all(|e| e["score"].is_f64()));
    }

    #[test]
    fn missing_test_accuracy_is_null() {
        let data = dataset();
        let outcome = outcome(&data);
        let dir = TempDir::new().unwrap();
        let writer =
            ResultWriter::new(dir.path(), ExperimentName::new("no_test".into()).unwrap()).unwrap();
        let path = writer.write_tuned(&data, &outcome, &[]).unwrap();
        assert!(read_json(&path)["selected"][0]["test_accuracy"].is_null());
    }

    #[test]
    fn parameter_values_keep_their_kind() {
        assert_eq!(json_value(&ParamValue::Int(3)), serde_json::json!(3));
        assert_eq!(json_value(&ParamValue::Float(0.5)), serde_json::json!(0.5));
        assert_eq!(json_value(&ParamValue::Text("msm".into())), serde_json::json!("msm"));
    }
}
