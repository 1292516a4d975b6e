//! Cohort-synth library
//!
//! A library for generating perfectly stratified synthetic patient cohorts,
//! checking their balance, and attaching generated narratives.
//!
//! # Features
//!
//! - Stratified generation: one weighted dimension sets the group sizes, every
//!   combination of the uniform dimensions appears equally often in each group
//! - Reproducibility: a seed fixes the output, order included
//! - Verification: recount any record file against its configuration
//! - Narratives: optional names and first-person narratives from a completion API
//!
//! # Workspace Crates
//!
//! - `cohort_core` - Configuration and record types
//! - `cohort_generator` - Allocation and generation
//! - `cohort_verify` - Stratification report
//! - `cohort_csv` - CSV persistence
//! - `cohort_narrative` - Completion client and narrative generators
//!
//! # CLI Usage
//!
//! ```bash
//! # Generate 100 patients (96 after rounding) into patient_data/
//! cohort-synth generate --config config/pain_study.yaml --total 100 --seed 42
//!
//! # Re-check a file
//! cohort-synth verify --config config/pain_study.yaml \
//!   --input patient_data/stratified_patient_data_20250602_121539.csv
//!
//! # Add narratives
//! ANTHROPIC_API_KEY=... cohort-synth narrate \
//!   --input patient_data/stratified_patient_data_20250602_121539.csv --with-names
//! ```

use clap::Parser;
use cohort_narrative::{DEFAULT_API_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};

pub mod cohort;

#[derive(Parser, Clone, Debug)]
pub struct CompletionOpts {
    /// Anthropic API key
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Messages API root URL
    #[arg(long, default_value = DEFAULT_API_URL, env = "ANTHROPIC_API_URL")]
    pub api_url: String,

    /// Model used for names and narratives
    #[arg(long, default_value = DEFAULT_MODEL, env = "ANTHROPIC_MODEL")]
    pub model: String,

    /// Token budget per narrative
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,
}
