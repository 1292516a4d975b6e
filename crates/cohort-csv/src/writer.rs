//! CSV writer for record sequences.

use crate::error::CsvError;
use cohort_core::PatientRecord;
use csv::Writer;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Default buffer size for CSV writing.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Metrics from a write operation.
#[derive(Debug, Clone, Default)]
pub struct WriteMetrics {
    /// Number of rows written, excluding the header.
    pub rows_written: u64,
    /// Total time taken.
    pub total_duration: Duration,
    /// Output file size in bytes.
    pub file_size_bytes: u64,
}

impl WriteMetrics {
    /// Calculate rows per second.
    pub fn rows_per_second(&self) -> f64 {
        if self.total_duration.as_secs_f64() > 0.0 {
            self.rows_written as f64 / self.total_duration.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Writes records as CSV rows in a fixed column order.
#[derive(Debug, Clone)]
pub struct CohortCsvWriter {
    columns: Vec<String>,
    include_header: bool,
}

impl CohortCsvWriter {
    /// Create a writer for the given columns.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let writer = CohortCsvWriter::new(config.column_names());
    /// ```
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            include_header: true,
        }
    }

    /// Set whether to include a header row in the CSV output.
    pub fn with_header(mut self, include_header: bool) -> Self {
        self.include_header = include_header;
        self
    }

    /// Column order used for every row.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Write `records` to `output_path`, replacing any existing file.
    ///
    /// A field missing from a record is written as an empty string; fields
    /// not named in the column list are dropped.
    pub fn write<P: AsRef<Path>>(
        &self,
        output_path: P,
        records: &[PatientRecord],
    ) -> Result<WriteMetrics, CsvError> {
        let start_time = Instant::now();
        let mut metrics = WriteMetrics::default();

        let output_path = output_path.as_ref();
        info!(
            "Writing {} records to CSV file '{}'",
            records.len(),
            output_path.display()
        );

        let file = File::create(output_path)?;
        let buf_writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);
        let mut writer = Writer::from_writer(buf_writer);

        if self.include_header {
            writer.write_record(&self.columns)?;
        }

        for record in records {
            let row = self
                .columns
                .iter()
                .map(|column| record.get(column).unwrap_or(""));
            writer.write_record(row)?;

            metrics.rows_written += 1;

            if metrics.rows_written % 10000 == 0 {
                debug!("Written {} rows", metrics.rows_written);
            }
        }

        writer.flush()?;
        let inner = writer
            .into_inner()
            .map_err(|e| CsvError::Io(std::io::Error::other(e.to_string())))?;
        drop(inner);

        metrics.file_size_bytes = std::fs::metadata(output_path)?.len();
        metrics.total_duration = start_time.elapsed();

        info!(
            "CSV write complete: {} rows, {} bytes in {:?} ({:.0} rows/sec)",
            metrics.rows_written,
            metrics.file_size_bytes,
            metrics.total_duration,
            metrics.rows_per_second()
        );

        Ok(metrics)
    }
}

/// Ordered union of the field names of `records`, in first-seen order.
pub fn columns_from_records(records: &[PatientRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for name in record.field_names() {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn records() -> Vec<PatientRecord> {
        vec![
            PatientRecord::new([("race", "Black"), ("gender", "Male")]),
            PatientRecord::new([("race", "White"), ("gender", "Female")]),
        ]
    }

    #[test]
    fn test_metrics() {
        let metrics = WriteMetrics {
            rows_written: 1000,
            total_duration: Duration::from_secs(10),
            file_size_bytes: 100000,
        };

        assert_eq!(metrics.rows_per_second(), 100.0);
        assert_eq!(WriteMetrics::default().rows_per_second(), 0.0);
    }

    #[test]
    fn test_write_csv() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("test.csv");

        let metrics = CohortCsvWriter::new(["race", "gender"])
            .write(&output_path, &records())
            .unwrap();

        assert_eq!(metrics.rows_written, 2);
        assert!(metrics.file_size_bytes > 0);

        let content = std::fs::read_to_string(&output_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["race,gender", "Black,Male", "White,Female"]);
    }

    #[test]
    fn test_write_without_header() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("test.csv");

        CohortCsvWriter::new(["race", "gender"])
            .with_header(false)
            .write(&output_path, &records())
            .unwrap();

        let content = std::fs::read_to_string(&output_path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_missing_fields_written_empty() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("test.csv");

        CohortCsvWriter::new(["race", "narrative", "gender"])
            .write(&output_path, &records())
            .unwrap();

        let content = std::fs::read_to_string(&output_path).unwrap();
        assert_eq!(content.lines().nth(1), Some("Black,,Male"));
    }

    #[test]
    fn test_values_are_escaped() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("test.csv");
        let record = PatientRecord::new([("narrative", "It hurts, \"a lot\".\nReally.")]);

        CohortCsvWriter::new(["narrative"])
            .write(&output_path, &[record])
            .unwrap();

        let content = std::fs::read_to_string(&output_path).unwrap();
        assert_eq!(
            content,
            "narrative\n\"It hurts, \"\"a lot\"\".\nReally.\"\n"
        );
    }

    #[test]
    fn test_empty_record_list_writes_header_only() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("test.csv");

        let metrics = CohortCsvWriter::new(["race"])
            .write(&output_path, &[])
            .unwrap();

        assert_eq!(metrics.rows_written, 0);
        assert_eq!(std::fs::read_to_string(&output_path).unwrap(), "race\n");
    }

    #[test]
    fn test_columns_from_records_first_seen_order() {
        let records = vec![
            PatientRecord::new([("race", "Black"), ("gender", "Male")]),
            PatientRecord::new([("race", "White"), ("narrative", "text"), ("gender", "Female")]),
            PatientRecord::new([("first_name", "Ada")]),
        ];

        assert_eq!(
            columns_from_records(&records),
            vec!["race", "gender", "narrative", "first_name"]
        );
        assert!(columns_from_records(&[]).is_empty());
    }
}
