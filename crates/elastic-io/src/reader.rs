//! CSV reader for labelled time series with full input validation.

use std::path::{Path, PathBuf};

use elastic_distance::TimeSeries;
use elastic_tune::{DatasetSummary, LabelledDataset};
use tracing::{debug, info, instrument};

use crate::IoError;

/// Reads labelled time series from a CSV file.
///
/// Expected CSV format:
/// - Header row required (first column is the class label, remaining are positional time steps)
/// - `label,t0,t1,...,tn`
/// - One row per series, all rows must have the same number of columns
///
/// Labels may repeat; each distinct label is a class.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::NoTimeSteps`] | Header has no column after the label |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::EmptyLabel`] | Label cell is blank |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
#[derive(Debug)]
pub struct DatasetReader {
    path: PathBuf,
}

impl DatasetReader {
    /// Create a new reader for the given CSV file path.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a [`LabelledDataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<LabelledDataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // Flexible rows let the row-length check below report the offending label.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?;
        let expected_cols = header.len();
        if expected_cols < 2 {
            return Err(IoError::NoTimeSteps {
                path: self.path.clone(),
            });
        }
        debug!(expected_cols, "read CSV header");

        let mut labels = Vec::new();
        let mut series = Vec::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            let label = record.get(0).unwrap_or("");

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    label: label.to_string(),
                    expected: expected_cols,
                    got: record.len(),
                });
            }
            if label.is_empty() {
                return Err(IoError::EmptyLabel {
                    path: self.path.clone(),
                    row_index,
                });
            }

            let mut values = Vec::with_capacity(expected_cols - 1);
            for (col_index, raw) in record.iter().skip(1).enumerate() {
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        col_index,
                        raw: raw.to_string(),
                    })?;
                values.push(value);
            }

            // Values are finite and the header guarantees at least one column.
            let ts = TimeSeries::new(values).map_err(|e| IoError::Dataset {
                path: self.path.clone(),
                source: e.into(),
            })?;
            labels.push(label.to_string());
            series.push(ts);
        }

        if series.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let dataset = LabelledDataset::new(series, labels).map_err(|e| IoError::Dataset {
            path: self.path.clone(),
            source: e,
        })?;
        info!(
            n_series = dataset.len(),
            n_classes = dataset.classes().len(),
            length = dataset.series_length(),
            "loaded labelled dataset"
        );
        Ok(dataset)
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn valid_csv_reads_rows_and_classes() {
        let csv = "label,t0,t1,t2\nup,1.0,2.0,3.0\ndown,3.0,2.0,1.0\nup,0.5,1.5,2.5\n";
        let f = write_csv(csv);
        let ds = DatasetReader::new(f.path()).read().unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.series_length(), 3);
        assert_eq!(ds.classes(), ["up".to_string(), "down".to_string()]);
        assert_eq!(ds.label(2), "up");
        assert_eq!(ds.series()[1].as_ref(), &[3.0, 2.0, 1.0]);
    }

    #[test]
    fn whitespace_around_cells_is_trimmed() {
        let csv = "label, t0, t1\n a , 1.0 , 2.0\n";
        let f = write_csv(csv);
        let ds = DatasetReader::new(f.path()).read().unwrap();
        assert_eq!(ds.label(0), "a");
        assert_eq!(ds.series()[0].as_ref(), &[1.0, 2.0]);
    }

    #[test]
    fn error_file_not_found() {
        let result = DatasetReader::new(Path::new("/nonexistent/file.csv")).read();
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }

    #[test]
    fn error_header_without_time_steps() {
        let f = write_csv("label\na\n");
        let result = DatasetReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::NoTimeSteps { .. })));
    }

    #[test]
    fn error_empty_dataset() {
        let f = write_csv("label,t0,t1,t2\n");
        let result = DatasetReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::EmptyDataset { .. })));
    }

    #[test]
    fn error_inconsistent_row_length() {
        let csv = "label,t0,t1,t2\na,1.0,2.0,3.0\nb,1.0,2.0\n";
        let f = write_csv(csv);
        let result = DatasetReader::new(f.path()).read();
        assert!(matches!(
            result,
            Err(IoError::InconsistentRowLength { row_index: 1, expected: 4, got: 3, .. })
        ));
    }

    #[test]
    fn error_empty_label() {
        let csv = "label,t0,t1\na,1.0,2.0\n,3.0,4.0\n";
        let f = write_csv(csv);
        let result = DatasetReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::EmptyLabel { row_index: 1, .. })));
    }

    #[test]
    fn error_non_finite_nan() {
        let f = write_csv("label,t0,t1\na,1.0,NaN\n");
        let result = DatasetReader::new(f.path()).read();
        assert!(matches!(
            result,
            Err(IoError::NonFiniteValue { row_index: 0, col_index: 1, .. })
        ));
    }

    #[test]
    fn error_non_finite_inf() {
        let f = write_csv("label,t0,t1\na,inf,1.0\n");
        let result = DatasetReader::new(f.path()).read();
        assert!(matches!(
            result,
            Err(IoError::NonFiniteValue { col_index: 0, .. })
        ));
    }

    #[test]
    fn error_unparseable_value() {
        let f = write_csv("label,t0,t1\na,1.0,abc\n");
        let result = DatasetReader::new(f.path()).read();
        match result {
            Err(IoError::NonFiniteValue { raw, .. }) => assert_eq!(raw, "abc"),
            other => panic!("expected NonFiniteValue, got {other:?}"),
        }
    }
}
