//! Unique patient name generation.

use crate::client::{CompletionClient, CompletionRequest};
use crate::error::NarrativeError;
use crate::json::extract_json;
use crate::retry::RetryPolicy;
use cohort_core::PatientRecord;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{info, warn};

/// Token budget for a name completion.
pub const NAME_MAX_TOKENS: u32 = 100;

/// Sampling temperature for names.
pub const NAME_TEMPERATURE: f64 = 0.7;

/// How many taken names are quoted back to the model.
const TAKEN_NAMES_IN_PROMPT: usize = 50;

const NAME_SYSTEM_PROMPT: &str = "You are helping generate culturally appropriate names for a \
medical study. Generate a full name (first and last) that would be typical for someone with \
the patient characteristics given. Return the result as a JSON object with 'first_name' and \
'last_name' fields. Only return the JSON, no other text.";

/// A generated first and last name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PatientName {
    pub first_name: String,
    pub last_name: String,
}

impl PatientName {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Full names already assigned in this run, in assignment order.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    taken: HashSet<String>,
    order: Vec<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a full name is taken.
    pub fn contains(&self, full_name: &str) -> bool {
        self.taken.contains(full_name)
    }

    /// Record a name; returns `false` when it was already taken.
    pub fn register(&mut self, name: &PatientName) -> bool {
        let full_name = name.full_name();
        if self.taken.insert(full_name.clone()) {
            self.order.push(full_name);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn recent(&self, n: usize) -> &[String] {
        &self.order[self.order.len().saturating_sub(n)..]
    }
}

/// Asks the completion service for a name that fits a record and is not taken.
pub struct NameGenerator<C> {
    client: C,
    retry: RetryPolicy,
}

impl<C: CompletionClient> NameGenerator<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Generate a name for `record` and register it in `registry`.
    ///
    /// A name that is already registered counts as a failed attempt.
    pub async fn generate(
        &self,
        record: &PatientRecord,
        registry: &mut NameRegistry,
    ) -> Result<PatientName, NarrativeError> {
        let request = CompletionRequest {
            system: NAME_SYSTEM_PROMPT.to_string(),
            prompt: name_prompt(record, registry),
            max_tokens: NAME_MAX_TOKENS,
            temperature: NAME_TEMPERATURE,
        };

        let max_attempts = self.retry.attempts();
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            let result = match self.client.complete(&request).await {
                Ok(text) => parse_name(&text).and_then(|name| {
                    if registry.contains(&name.full_name()) {
                        Err(NarrativeError::DuplicateName(name.full_name()))
                    } else {
                        Ok(name)
                    }
                }),
                Err(e) => Err(e),
            };

            match result {
                Ok(name) => {
                    registry.register(&name);
                    info!("Generated name: {}", name.full_name());
                    return Ok(name);
                }
                Err(e) => {
                    warn!(
                        "Name generation failed (attempt {}/{}): {}",
                        attempt, max_attempts, e
                    );
                    last_error = Some(e);
                    if attempt < max_attempts {
                        self.retry.pause().await;
                    }
                }
            }
        }

        Err(NarrativeError::Exhausted {
            attempts: max_attempts,
            last_error: Box::new(last_error.unwrap_or(NarrativeError::MalformedResponse(
                "no attempt was made".to_string(),
            ))),
        })
    }
}

fn name_prompt(record: &PatientRecord, registry: &NameRegistry) -> String {
    let mut prompt = String::from("Please generate a name given the following information:\n");
    for (name, value) in record.fields() {
        prompt.push_str(&format!("{}: {}\n", display_label(name), value));
    }

    let taken = registry.recent(TAKEN_NAMES_IN_PROMPT);
    if !taken.is_empty() {
        prompt.push_str("\nThe following names are already taken; choose a different one:\n");
        prompt.push_str(&taken.join(", "));
        prompt.push('\n');
    }
    prompt
}

fn parse_name(text: &str) -> Result<PatientName, NarrativeError> {
    let value: serde_json::Value = serde_json::from_str(extract_json(text))?;
    let field = |key: &'static str| {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or(NarrativeError::MissingField(key))
    };
    Ok(PatientName {
        first_name: field("first_name")?,
        last_name: field("last_name")?,
    })
}

/// `pain_intensity` → `Pain Intensity`.
pub(crate) fn display_label(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
