//! Narrative generation with novelty conditioning.

use crate::client::{CompletionClient, CompletionRequest};
use crate::error::NarrativeError;
use crate::json::extract_json;
use crate::names::display_label;
use crate::retry::RetryPolicy;
use cohort_core::PatientRecord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

/// Default token budget for a narrative completion.
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// Default fixed sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Number of earlier narratives quoted in each prompt.
pub const NOVELTY_WINDOW: usize = 3;

const NARRATIVE_SYSTEM_PROMPT: &str = "You are helping with a psychological study that analyzes \
the moral convictions of medical professionals confronted with the possibility of administering \
assisted dying to patients. Participants are presented with patient narratives seeking assisted \
dying. Your task is to write a short, realistic narrative for one patient based on the \
characteristics provided.

The narrative must:
1. Be written in the first person from the patient's perspective.
2. Explain their situation and their wish to pursue assisted dying.
3. Mention that they have their family's approval.
4. Be distinctly different from the previous narratives in structure, word choice, emotional \
tone and reasoning.

Do not mention the patient's occupation, the type of illness, how the illness affects them, \
personal interests or hobbies, or personal and cultural beliefs.

Respond with a JSON object with the fields \"gender\" (string) and \"narrative\" (string), \
without markdown formatting or code blocks.";

/// How the sampling temperature is chosen for each attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemperaturePolicy {
    /// Always use the same temperature.
    Fixed(f64),
    /// Draw uniformly from `[min, max]`, rounded to one decimal.
    ///
    /// A NaN or infinite bound is ignored. With no finite bound left,
    /// [`DEFAULT_TEMPERATURE`] is used.
    Uniform { min: f64, max: f64 },
}

impl Default for TemperaturePolicy {
    fn default() -> Self {
        Self::Fixed(DEFAULT_TEMPERATURE)
    }
}

impl TemperaturePolicy {
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        match *self {
            Self::Fixed(t) => t,
            Self::Uniform { min, max } => {
                let (lo, hi) = match (min.is_finite(), max.is_finite()) {
                    (true, true) => (min.min(max), min.max(max)),
                    (true, false) => (min, min),
                    (false, true) => (max, max),
                    (false, false) => return DEFAULT_TEMPERATURE,
                };
                let t = if lo < hi && (hi - lo).is_finite() {
                    rng.gen_range(lo..=hi)
                } else {
                    lo
                };
                (t * 10.0).round() / 10.0
            }
        }
    }
}

/// A narrative accepted from the completion service.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedNarrative {
    pub narrative: String,
    /// Gender stated by the model.
    pub gender: String,
    /// Temperature actually sent with the successful request.
    pub temperature: f64,
    /// A `temperature` value the model put in its own JSON, if any.
    pub ai_suggested_temperature: Option<String>,
}

/// Writes first-person narratives for records.
pub struct NarrativeGenerator<C> {
    client: C,
    temperature: TemperaturePolicy,
    max_tokens: u32,
    retry: RetryPolicy,
    rng: StdRng,
}

impl<C: CompletionClient> NarrativeGenerator<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            temperature: TemperaturePolicy::default(),
            max_tokens: DEFAULT_MAX_TOKENS,
            retry: RetryPolicy::default(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_temperature(mut self, temperature: TemperaturePolicy) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Seed the RNG used for [`TemperaturePolicy::Uniform`].
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Generate a narrative for `record`, steering away from `previous`.
    ///
    /// Only the last [`NOVELTY_WINDOW`] entries of `previous` are quoted.
    pub async fn generate(
        &mut self,
        record: &PatientRecord,
        previous: &[String],
    ) -> Result<GeneratedNarrative, NarrativeError> {
        let system = system_prompt(previous);
        let prompt = narrative_prompt(record);
        let max_attempts = self.retry.attempts();
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            let temperature = self.temperature.sample(&mut self.rng);
            debug!("Using temperature {temperature} (attempt {attempt}/{max_attempts})");

            let request = CompletionRequest {
                system: system.clone(),
                prompt: prompt.clone(),
                max_tokens: self.max_tokens,
                temperature,
            };

            let result = match self.client.complete(&request).await {
                Ok(text) => parse_narrative(&text, temperature),
                Err(e) => Err(e),
            };

            match result {
                Ok(narrative) => {
                    if let Some(suggested) = &narrative.ai_suggested_temperature {
                        info!("Model suggested temperature {suggested}");
                    }
                    return Ok(narrative);
                }
                Err(e) => {
                    warn!(
                        "Narrative generation failed (attempt {}/{}): {}",
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

fn system_prompt(previous: &[String]) -> String {
    let recent = &previous[previous.len().saturating_sub(NOVELTY_WINDOW)..];
    if recent.is_empty() {
        return NARRATIVE_SYSTEM_PROMPT.to_string();
    }

    let examples = recent
        .iter()
        .enumerate()
        .map(|(i, n)| format!("Narrative {}:\n{}", i + 1, n))
        .collect::<Vec<_>>()
        .join("\n---\n");
    format!("{NARRATIVE_SYSTEM_PROMPT}\n\nPreviously generated narratives:\n{examples}")
}

fn narrative_prompt(record: &PatientRecord) -> String {
    let mut prompt = String::from(
        "Please generate a unique patient narrative for assisted dying based on the following information:\n",
    );
    for (name, value) in record.fields() {
        prompt.push_str(&format!("{}: {}\n", display_label(name), value));
    }
    prompt
}

fn parse_narrative(text: &str, temperature: f64) -> Result<GeneratedNarrative, NarrativeError> {
    let value: serde_json::Value = serde_json::from_str(extract_json(text))?;

    let field = |key: &'static str| {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .ok_or(NarrativeError::MissingField(key))
    };

    let ai_suggested_temperature = match value.get("temperature") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };

    Ok(GeneratedNarrative {
        narrative: field("narrative")?,
        gender: field("gender")?,
        temperature,
        ai_suggested_temperature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedClient;
    use std::sync::Arc;

    fn record() -> PatientRecord {
        PatientRecord::new([
            ("race", "Asian"),
            ("gender", "Female"),
            ("pain_intensity", "high"),
        ])
    }

    #[test]
    fn test_fixed_temperature() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(TemperaturePolicy::default().sample(&mut rng), 0.7);
        assert_eq!(TemperaturePolicy::Fixed(0.25).sample(&mut rng), 0.25);
    }

    #[test]
    fn test_uniform_temperature_rounded_within_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let policy = TemperaturePolicy::Uniform { min: 0.1, max: 1.0 };
        for _ in 0..200 {
            let t = policy.sample(&mut rng);
            assert!((0.1..=1.0).contains(&t), "{t}");
            assert!(((t * 10.0).round() - t * 10.0).abs() < 1e-9, "{t}");
        }
    }

    #[test]
    fn test_uniform_temperature_ignores_non_finite_bounds() {
        let mut rng = StdRng::seed_from_u64(3);

        let nan_min = TemperaturePolicy::Uniform { min: f64::NAN, max: 0.4 };
        assert_eq!(nan_min.sample(&mut rng), 0.4);

        let infinite_max = TemperaturePolicy::Uniform { min: 0.2, max: f64::INFINITY };
        assert_eq!(infinite_max.sample(&mut rng), 0.2);

        let neither = TemperaturePolicy::Uniform { min: f64::NAN, max: f64::NEG_INFINITY };
        assert_eq!(neither.sample(&mut rng), DEFAULT_TEMPERATURE);
    }

    #[test]
    fn test_system_prompt_quotes_last_three() {
        let previous: Vec<String> = (1..=5).map(|i| format!("story {i}")).collect();
        let prompt = system_prompt(&previous);

        assert!(!prompt.contains("story 2"));
        assert!(prompt.contains("Narrative 1:\nstory 3"));
        assert!(prompt.contains("Narrative 3:\nstory 5"));
        assert_eq!(system_prompt(&[]), NARRATIVE_SYSTEM_PROMPT);
    }

    #[test]
    fn test_prompt_lists_record_fields() {
        let prompt = narrative_prompt(&record());
        assert!(prompt.contains("Race: Asian\n"));
        assert!(prompt.contains("Pain Intensity: high\n"));
    }

    #[test]
    fn test_parse_narrative() {
        let parsed = parse_narrative(
            r#"{"gender": "Female", "narrative": "I am ready.", "temperature": 0.9}"#,
            0.7,
        )
        .unwrap();

        assert_eq!(parsed.narrative, "I am ready.");
        assert_eq!(parsed.gender, "Female");
        assert_eq!(parsed.temperature, 0.7);
        assert_eq!(parsed.ai_suggested_temperature.as_deref(), Some("0.9"));

        let plain = parse_narrative(r#"{"gender": "Male", "narrative": "x"}"#, 0.5).unwrap();
        assert_eq!(plain.ai_suggested_temperature, None);

        assert!(matches!(
            parse_narrative(r#"{"narrative": "x"}"#, 0.5),
            Err(NarrativeError::MissingField("gender"))
        ));
    }

    #[tokio::test]
    async fn test_generate_retries_until_valid() {
        let client = Arc::new(ScriptedClient::new([
            "I cannot produce JSON today.",
            "```json\n{\"gender\": \"Female\", \"narrative\": \"My family agrees.\"}\n```",
        ]));
        let mut generator = NarrativeGenerator::new(client.clone()).with_max_tokens(300);

        let narrative = generator
            .generate(&record(), &["older".to_string()])
            .await
            .unwrap();

        assert_eq!(narrative.narrative, "My family agrees.");
        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].max_tokens, 300);
        assert_eq!(requests[0].temperature, 0.7);
        assert!(requests[0].system.contains("older"));
    }

    #[tokio::test]
    async fn test_generate_gives_up_after_max_attempts() {
        let client = Arc::new(ScriptedClient::new(["bad", "bad", "bad", "bad"]));
        let mut generator = NarrativeGenerator::new(client.clone())
            .with_retry(RetryPolicy::new(2, std::time::Duration::ZERO));

        let err = generator.generate(&record(), &[]).await.unwrap_err();

        assert!(matches!(err, NarrativeError::Exhausted { attempts: 2, .. }));
        assert_eq!(client.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_uniform_temperature_is_recorded() {
        let client = ScriptedClient::new([r#"{"gender": "Female", "narrative": "x"}"#]);
        let mut generator = NarrativeGenerator::new(client)
            .with_temperature(TemperaturePolicy::Uniform { min: 0.3, max: 0.3 })
            .with_seed(5);

        let narrative = generator.generate(&record(), &[]).await.unwrap();
        assert_eq!(narrative.temperature, 0.3);
    }
}
