//! Command-line interface for cohort-synth
//!
//! # Usage Examples
//!
//! ## Generate
//! ```bash
//! # Prompt for the population size, random seed
//! cohort-synth generate --config config/pain_study.yaml
//!
//! # Reproducible run, allocation only
//! cohort-synth generate --config config/pain_study.yaml --total 250 --seed 7 --dry-run
//! ```
//!
//! ## Verify
//! ```bash
//! cohort-synth verify --config config/pain_study.yaml --input patient_data/cohort.csv
//! ```
//!
//! ## Narrate
//! ```bash
//! cohort-synth narrate --input patient_data/cohort.csv \
//!   --config config/pain_study.yaml \
//!   --temperature-range 0.1,1.0 \
//!   --with-names
//! ```

use clap::{Parser, Subcommand};
use cohort_synth::cohort::generate::{run_generate, GenerateArgs};
use cohort_synth::cohort::narrate::{run_narrate, NarrateArgs};
use cohort_synth::cohort::verify::{run_verify, VerifyArgs};

#[derive(Parser)]
#[command(name = "cohort-synth")]
#[command(about = "A tool for generating perfectly stratified synthetic patient cohorts")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a stratified cohort and write it to a timestamped CSV file
    Generate(GenerateArgs),

    /// Check that a cohort CSV file is perfectly stratified
    Verify(VerifyArgs),

    /// Attach generated names and narratives to a cohort CSV file
    Narrate(NarrateArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => {
            run_generate(args)?;
        }
        Commands::Verify(args) => {
            run_verify(args)?;
        }
        Commands::Narrate(args) => {
            run_narrate(args).await?;
        }
    }

    Ok(())
}
