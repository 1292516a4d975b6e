//! Cohort generate command handler.

use crate::cohort::prompt::prompt_total;
use anyhow::Context;
use clap::Args;
use cohort_core::CohortConfiguration;
use cohort_csv::{timestamped_output_path, CohortCsvWriter};
use cohort_generator::{GroupAllocation, StratifiedCohortGenerator};
use cohort_verify::verify_stratification;
use std::path::PathBuf;

/// Arguments for the generate command.
#[derive(Args, Clone, Debug)]
pub struct GenerateArgs {
    /// Path to the cohort configuration YAML file
    #[arg(long, value_name = "PATH")]
    pub config: PathBuf,

    /// Number of patients to generate (prompted for when omitted)
    #[arg(long)]
    pub total: Option<u64>,

    /// Random seed for a reproducible ordering (drawn at random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory the timestamped CSV file is written to
    #[arg(long, default_value = "patient_data")]
    pub output_dir: PathBuf,

    /// Skip printing the stratification report
    #[arg(long)]
    pub no_verify: bool,

    /// Print the allocation without generating or writing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the generate command. Returns the written file, if any.
pub fn run_generate(args: GenerateArgs) -> anyhow::Result<Option<PathBuf>> {
    let config = CohortConfiguration::from_file(&args.config)
        .with_context(|| format!("Failed to load cohort configuration from {:?}", args.config))?;
    config
        .validate_structure()
        .with_context(|| format!("Invalid cohort configuration in {:?}", args.config))?;

    let minimum = config.minimum_population();
    tracing::info!(
        "{} strata × {} combinations: at least {} patients required",
        config.weighted_cardinality(),
        config.combination_count(),
        minimum
    );

    let total = match args.total {
        Some(total) => total,
        None => prompt_total(std::io::stdin().lock(), std::io::stdout(), minimum)?,
    };

    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!("Using seed {seed} (pass --seed {seed} to reproduce this run)");

    let mut generator = StratifiedCohortGenerator::new(config.clone(), seed);
    let allocation = generator
        .allocation(total)
        .context("Failed to allocate strata")?;
    print_allocation(&config, &allocation);

    if args.dry_run {
        tracing::info!("Dry run: nothing generated");
        return Ok(None);
    }

    let records = generator
        .generate(total)
        .context("Failed to generate cohort")?;

    let output_path = timestamped_output_path(&args.output_dir, chrono::Local::now())
        .with_context(|| format!("Failed to create output directory {:?}", args.output_dir))?;
    CohortCsvWriter::new(config.column_names())
        .write(&output_path, &records)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    println!(
        "\nGenerated {} patients and saved to {}",
        records.len(),
        output_path.display()
    );

    if !args.no_verify {
        let report = verify_stratification(&records, &config);
        print!("{report}");
        if !report.is_perfect() {
            tracing::warn!("{}", report.summary());
        }
    }

    Ok(Some(output_path))
}

fn print_allocation(config: &CohortConfiguration, allocation: &GroupAllocation) {
    println!("\nAllocation by {}:", config.weighted.name);
    for group in allocation.groups() {
        println!(
            "  {}: {} patients ({} × {} combinations){}",
            group.value,
            group.size,
            group.sets,
            allocation.combination_count(),
            if group.forced_minimum {
                ", raised to one full set"
            } else {
                ""
            }
        );
    }
    println!("  Total: {} patients", allocation.total());
}
