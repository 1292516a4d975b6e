//! Cohort narrate command handler.

use crate::CompletionOpts;
use anyhow::Context;
use clap::Args;
use cohort_core::CohortConfiguration;
use cohort_csv::{
    columns_from_records, narrated_output_path, read_records, require_columns, CohortCsvWriter,
};
use cohort_narrative::{
    AnthropicClient, BatchNarrator, CompletionClient, NameGenerator, NarrativeGenerator,
    RetryPolicy, TemperaturePolicy, DEFAULT_TEMPERATURE,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Arguments for the narrate command.
#[derive(Args, Clone, Debug)]
pub struct NarrateArgs {
    /// Generated cohort CSV file
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,

    /// Output CSV file (default: <input stem>_with_narratives.csv)
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Cohort configuration; when given, the input must contain every dimension column
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Attempts per record before it is skipped
    #[arg(long, default_value = "3")]
    pub max_attempts: u32,

    /// Seconds to wait between attempts
    #[arg(long, default_value = "0")]
    pub retry_delay_secs: u64,

    /// Fixed sampling temperature
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE, conflicts_with = "temperature_range")]
    pub temperature: f64,

    /// Draw each temperature uniformly from MIN,MAX (rounded to one decimal)
    #[arg(long, value_name = "MIN,MAX", value_parser = parse_temperature_range)]
    pub temperature_range: Option<(f64, f64)>,

    /// Also generate a unique first and last name per patient
    #[arg(long)]
    pub with_names: bool,

    /// Completion service options
    #[command(flatten)]
    pub completion: CompletionOpts,
}

impl NarrateArgs {
    pub fn temperature_policy(&self) -> TemperaturePolicy {
        match self.temperature_range {
            Some((min, max)) => TemperaturePolicy::Uniform { min, max },
            None => TemperaturePolicy::Fixed(self.temperature),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_secs(self.retry_delay_secs),
        )
    }
}

/// Parse `MIN,MAX` into a temperature range.
pub fn parse_temperature_range(s: &str) -> Result<(f64, f64), String> {
    let (min, max) = s
        .split_once(',')
        .ok_or_else(|| format!("expected MIN,MAX, got '{s}'"))?;
    let min: f64 = min
        .trim()
        .parse()
        .map_err(|e| format!("invalid minimum '{min}': {e}"))?;
    let max: f64 = max
        .trim()
        .parse()
        .map_err(|e| format!("invalid maximum '{max}': {e}"))?;
    if !(min.is_finite() && max.is_finite()) || min < 0.0 || min > max {
        return Err(format!(
            "temperature range must satisfy 0 <= MIN <= MAX, got {min},{max}"
        ));
    }
    Ok((min, max))
}

/// Run the narrate command against the Anthropic API.
pub async fn run_narrate(args: NarrateArgs) -> anyhow::Result<Option<PathBuf>> {
    let client = AnthropicClient::new(&args.completion.api_key, &args.completion.model)
        .context("Failed to build completion client")?
        .with_base_url(&args.completion.api_url);

    narrate_with_client(args, Arc::new(client)).await
}

/// Run the narrate command with any completion backend.
///
/// Returns the written file, or `None` when the input holds no records.
pub async fn narrate_with_client<C>(
    args: NarrateArgs,
    client: Arc<C>,
) -> anyhow::Result<Option<PathBuf>>
where
    C: CompletionClient + ?Sized,
{
    let (headers, records) = read_records(&args.input)
        .with_context(|| format!("Failed to read {:?}", args.input))?;

    if let Some(config_path) = &args.config {
        let config = CohortConfiguration::from_file(config_path).with_context(|| {
            format!("Failed to load cohort configuration from {config_path:?}")
        })?;
        require_columns(&headers, &config.column_names())
            .with_context(|| format!("{:?} does not match the cohort configuration", args.input))?;
    }

    if records.is_empty() {
        tracing::warn!("{:?} contains no patients; nothing to narrate", args.input);
        return Ok(None);
    }

    tracing::info!(
        "Processing {} patients from {}",
        records.len(),
        args.input.display()
    );

    let narratives = NarrativeGenerator::new(client.clone())
        .with_temperature(args.temperature_policy())
        .with_max_tokens(args.completion.max_tokens)
        .with_retry(args.retry_policy());
    let mut narrator = BatchNarrator::new(narratives);
    if args.with_names {
        narrator =
            narrator.with_names(NameGenerator::new(client.clone()).with_retry(args.retry_policy()));
    }

    let outcome = narrator.run(&records).await;

    if outcome.narrated.is_empty() {
        anyhow::bail!("No patients were processed. Output file will not be created.");
    }

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| narrated_output_path(&args.input));
    CohortCsvWriter::new(columns_from_records(&outcome.narrated))
        .write(&output_path, &outcome.narrated)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    println!(
        "\nGenerated narratives for {} patients and saved them to {}",
        outcome.narrated.len(),
        output_path.display()
    );
    if !outcome.failures.is_empty() {
        println!("{} patients could not be narrated", outcome.failures.len());
    }

    Ok(Some(output_path))
}
