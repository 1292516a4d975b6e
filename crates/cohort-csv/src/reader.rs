//! Reading record files back in.

use crate::error::CsvError;
use cohort_core::PatientRecord;
use std::path::Path;
use tracing::info;

/// Read a headered CSV file into records, preserving header order.
pub fn read_records<P: AsRef<Path>>(
    path: P,
) -> Result<(Vec<String>, Vec<PatientRecord>), CsvError> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(PatientRecord::new(
            headers.iter().map(String::as_str).zip(row.iter()),
        ));
    }

    info!(
        "Loaded {} records with columns [{}] from '{}'",
        records.len(),
        headers.join(", "),
        path.display()
    );

    Ok((headers, records))
}

/// Fail with [`CsvError::MissingColumns`] unless every `required` column is present.
pub fn require_columns<S: AsRef<str>>(headers: &[String], required: &[S]) -> Result<(), CsvError> {
    let missing: Vec<String> = required
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !headers.iter().any(|h| h == name))
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CsvError::MissingColumns {
            missing,
            available: headers.to_vec(),
        })
    }
}
