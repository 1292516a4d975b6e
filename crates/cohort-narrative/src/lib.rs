//! Narrative generation for cohort records.
//!
//! Generated cohorts carry only categorical fields. This crate asks a text
//! completion service for a unique patient name and a first-person narrative
//! per record and attaches them as new fields, leaving the stratified fields
//! untouched.
//!
//! - [`CompletionClient`] - The seam between generators and the completion
//!   backend ([`AnthropicClient`] over HTTP, [`ScriptedClient`] offline)
//! - [`NameGenerator`] / [`NarrativeGenerator`] - Retrying, validating generators
//! - [`BatchNarrator`] - Runs both over a record list and collects failures
//!
//! # Example
//!
//! ```ignore
//! use cohort_narrative::{AnthropicClient, BatchNarrator, NarrativeGenerator, DEFAULT_MODEL};
//!
//! let client = AnthropicClient::new(api_key, DEFAULT_MODEL)?;
//! let mut narrator = BatchNarrator::new(NarrativeGenerator::new(client));
//!
//! let outcome = narrator.run(&records).await;
//! println!("{} narrated, {} failed", outcome.narrated.len(), outcome.failures.len());
//! ```

mod batch;
mod client;
mod error;
mod json;
mod names;
mod narrative;
mod retry;
mod scripted;

pub use batch::{BatchNarrator, BatchOutcome, RecordFailure};
pub use client::{
    AnthropicClient, CompletionClient, CompletionRequest, ANTHROPIC_VERSION, DEFAULT_API_URL,
    DEFAULT_MODEL,
};
pub use error::NarrativeError;
pub use json::extract_json;
pub use names::{NameGenerator, NameRegistry, PatientName, NAME_MAX_TOKENS, NAME_TEMPERATURE};
pub use narrative::{
    GeneratedNarrative, NarrativeGenerator, TemperaturePolicy, DEFAULT_MAX_TOKENS,
    DEFAULT_TEMPERATURE, NOVELTY_WINDOW,
};
pub use retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
pub use scripted::ScriptedClient;
