//! Cohort verify command handler.

use anyhow::Context;
use clap::Args;
use cohort_core::CohortConfiguration;
use cohort_csv::{read_records, require_columns};
use cohort_verify::{verify_stratification, StratificationReport};
use std::path::PathBuf;

/// Arguments for the verify command.
#[derive(Args, Clone, Debug)]
pub struct VerifyArgs {
    /// Path to the cohort configuration YAML file
    #[arg(long, value_name = "PATH")]
    pub config: PathBuf,

    /// CSV file to check
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,
}

/// Run the verify command. Fails unless the file is perfectly stratified.
pub fn run_verify(args: VerifyArgs) -> anyhow::Result<StratificationReport> {
    let config = CohortConfiguration::from_file(&args.config)
        .with_context(|| format!("Failed to load cohort configuration from {:?}", args.config))?;
    config
        .validate_structure()
        .with_context(|| format!("Invalid cohort configuration in {:?}", args.config))?;

    let (headers, records) = read_records(&args.input)
        .with_context(|| format!("Failed to read {:?}", args.input))?;
    require_columns(&headers, &config.column_names())
        .with_context(|| format!("{:?} does not match the cohort configuration", args.input))?;

    let report = verify_stratification(&records, &config);
    print!("{report}");
    println!("\n{}", report.summary());

    if report.is_perfect() {
        tracing::info!("Verification completed successfully");
        Ok(report)
    } else {
        Err(anyhow::anyhow!(
            "Verification failed - {}",
            report.summary()
        ))
    }
}
