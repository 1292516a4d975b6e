//! Output file naming.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

/// File name prefix of generated cohort files.
pub const OUTPUT_PREFIX: &str = "stratified_patient_data";

/// `dir/stratified_patient_data_YYYYmmdd_HHMMSS.csv`, creating `dir` if needed.
pub fn timestamped_output_path<P, Tz>(dir: P, now: DateTime<Tz>) -> std::io::Result<PathBuf>
where
    P: AsRef<Path>,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    Ok(dir.join(format!(
        "{OUTPUT_PREFIX}_{}.csv",
        now.format("%Y%m%d_%H%M%S")
    )))
}

/// `<stem>_with_narratives.csv` next to `input`.
pub fn narrated_output_path<P: AsRef<Path>>(input: P) -> PathBuf {
    let input = input.as_ref();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "patients".to_string());
    input.with_file_name(format!("{stem}_with_narratives.csv"))
}
