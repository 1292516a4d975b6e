//! CSV persistence for cohort records.
//!
//! This crate writes generated (or narrated) record sequences to CSV files and
//! reads them back for verification and narration.
//!
//! # Example
//!
//! ```ignore
//! use cohort_csv::{timestamped_output_path, CohortCsvWriter};
//!
//! let path = timestamped_output_path("patient_data", chrono::Local::now())?;
//! let writer = CohortCsvWriter::new(config.column_names());
//!
//! let metrics = writer.write(&path, &records)?;
//! ```

mod error;
mod paths;
mod reader;
mod writer;

pub use error::CsvError;
pub use paths::{narrated_output_path, timestamped_output_path, OUTPUT_PREFIX};
pub use reader::{read_records, require_columns};
pub use writer::{columns_from_records, CohortCsvWriter, WriteMetrics, DEFAULT_BUFFER_SIZE};
