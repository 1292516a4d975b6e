//! Error types for CSV persistence.

use thiserror::Error;

/// Errors that can occur while writing or reading record files.
#[derive(Error, Debug)]
pub enum CsvError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The input file lacks columns the caller needs.
    #[error(
        "Missing required columns: {}. Available columns: {}",
        missing.join(", "),
        available.join(", ")
    )]
    MissingColumns {
        missing: Vec<String>,
        available: Vec<String>,
    },
}
