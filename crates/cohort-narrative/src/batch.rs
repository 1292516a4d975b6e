//! Sequential narration of a whole record list.

use crate::client::CompletionClient;
use crate::error::NarrativeError;
use crate::names::{NameGenerator, NameRegistry};
use crate::narrative::NarrativeGenerator;
use cohort_core::PatientRecord;
use tracing::{error, info, warn};

/// A record that could not be narrated.
#[derive(Debug)]
pub struct RecordFailure {
    /// Zero-based position of the record in the input.
    pub position: usize,
    pub error: NarrativeError,
}

/// Result of a batch run.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Records with narrative fields attached, in input order.
    pub narrated: Vec<PatientRecord>,
    pub failures: Vec<RecordFailure>,
}

/// Drives name and narrative generation over a record list.
pub struct BatchNarrator<C> {
    narratives: NarrativeGenerator<C>,
    names: Option<NameGenerator<C>>,
    registry: NameRegistry,
    history: Vec<String>,
}

impl<C: CompletionClient> BatchNarrator<C> {
    pub fn new(narratives: NarrativeGenerator<C>) -> Self {
        Self {
            narratives,
            names: None,
            registry: NameRegistry::new(),
            history: Vec::new(),
        }
    }

    /// Also give every record a unique first and last name.
    pub fn with_names(mut self, names: NameGenerator<C>) -> Self {
        self.names = Some(names);
        self
    }

    /// Names assigned so far.
    pub fn registry(&self) -> &NameRegistry {
        &self.registry
    }

    /// Narrate `records` one at a time. A failing record is skipped and the
    /// batch continues.
    pub async fn run(&mut self, records: &[PatientRecord]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for (position, record) in records.iter().enumerate() {
            info!("Processing patient {} of {}", position + 1, records.len());

            match self.narrate(record).await {
                Ok(narrated) => outcome.narrated.push(narrated),
                Err(e) => {
                    error!("Failed to narrate patient {}: {}", position + 1, e);
                    outcome.failures.push(RecordFailure { position, error: e });
                }
            }
        }

        info!(
            "Narrated {} of {} patients ({} failed)",
            outcome.narrated.len(),
            records.len(),
            outcome.failures.len()
        );

        outcome
    }

    async fn narrate(&mut self, record: &PatientRecord) -> Result<PatientRecord, NarrativeError> {
        let mut narrated = record.clone();

        if let Some(names) = &self.names {
            let name = names.generate(record, &mut self.registry).await?;
            narrated = narrated
                .with_field("first_name", name.first_name)
                .with_field("last_name", name.last_name);
        }

        let generated = self.narratives.generate(&narrated, &self.history).await?;

        match record.get("gender") {
            None => narrated = narrated.with_field("gender", generated.gender.as_str()),
            Some(stratified) if !stratified.eq_ignore_ascii_case(&generated.gender) => {
                warn!(
                    "Model wrote a '{}' narrative for a record stratified as '{}'; keeping '{}'",
                    generated.gender, stratified, stratified
                );
            }
            Some(_) => {}
        }

        narrated = narrated
            .with_field("narrative", generated.narrative.as_str())
            .with_field("temperature", generated.temperature.to_string());
        if let Some(suggested) = &generated.ai_suggested_temperature {
            narrated = narrated.with_field("ai_suggested_temperature", suggested.as_str());
        }

        self.history.push(generated.narrative);
        Ok(narrated)
    }
}
