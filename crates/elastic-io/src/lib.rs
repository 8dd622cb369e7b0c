//! File I/O, validation, and serialization for elastic tuning runs.
//!
//! [`DatasetReader`] turns a `label,t0,t1,...` CSV into a validated
//! [`LabelledDataset`](elastic_tune::LabelledDataset), and [`ResultWriter`]
//! records a tuning outcome as a pretty-printed JSON artifact.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::ExperimentName;
pub use error::IoError;
pub use reader::DatasetReader;
pub use writer::ResultWriter;
