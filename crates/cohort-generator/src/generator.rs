//! Stratified cohort generator producing perfectly balanced record lists.

use crate::allocation::{allocate_groups, GroupAllocation};
use cohort_core::{CohortConfiguration, ConfigError, PatientRecord};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Error type for generator operations.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// The requested population size is not a positive integer
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The weighted proportions are negative or do not sum to 1.0
    #[error("Invalid distribution: {0}")]
    InvalidDistribution(String),

    /// The requested population cannot hold one balanced set per stratum
    #[error(
        "Insufficient sample size: requested {requested} patients, \
         need at least {minimum} for one balanced set per stratum"
    )]
    InsufficientSampleSize { requested: u64, minimum: u64 },

    /// The configuration is malformed
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
}

/// Generator that partitions a population into exactly balanced strata.
///
/// The only randomness is the final ordering, drawn from the injected RNG.
/// With the same seed, configuration and total the output is identical,
/// including order.
pub struct StratifiedCohortGenerator<R = StdRng> {
    /// Dimensions and target proportions
    config: CohortConfiguration,
    /// Source of the shuffles
    rng: R,
}

impl StratifiedCohortGenerator<StdRng> {
    /// Create a generator with a seeded RNG for reproducible output.
    pub fn new(config: CohortConfiguration, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    /// Create a generator seeded from system entropy.
    pub fn from_entropy(config: CohortConfiguration) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<R: Rng> StratifiedCohortGenerator<R> {
    /// Create a generator drawing from any RNG.
    pub fn with_rng(config: CohortConfiguration, rng: R) -> Self {
        Self { config, rng }
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &CohortConfiguration {
        &self.config
    }

    /// Compute the allocation table `generate` would use, without generating.
    pub fn allocation(&self, total_patients: u64) -> Result<GroupAllocation, GeneratorError> {
        allocate_groups(total_patients, &self.config)
    }

    /// Generate a shuffled, perfectly stratified cohort.
    ///
    /// The realized length is the allocation total: possibly less than
    /// `total_patients` because of rounding, never less than `C × K`.
    pub fn generate(&mut self, total_patients: u64) -> Result<Vec<PatientRecord>, GeneratorError> {
        let allocation = allocate_groups(total_patients, &self.config)?;

        info!(
            "Generating {} patients ({} requested) across {} strata of '{}'",
            allocation.total(),
            total_patients,
            allocation.groups().len(),
            self.config.weighted.name
        );

        let combinations = self.config.combinations();
        let weighted_name = self.config.weighted.name.as_str();
        let uniform_names: Vec<&str> = self.config.uniform.iter().map(|d| d.name.as_str()).collect();

        let mut records = Vec::with_capacity(allocation.total() as usize);

        for group in allocation.groups() {
            let mut block = Vec::with_capacity(group.size as usize);

            for _ in 0..group.sets {
                for combination in &combinations {
                    let fields = std::iter::once((weighted_name, group.value.as_str())).chain(
                        uniform_names
                            .iter()
                            .copied()
                            .zip(combination.iter().map(String::as_str)),
                    );
                    block.push(PatientRecord::new(fields));
                }
            }

            debug!(
                "Stratum '{}': {} patients ({} sets of {}){}",
                group.value,
                group.size,
                group.sets,
                allocation.combination_count(),
                if group.forced_minimum {
                    ", raised to the one-set minimum"
                } else {
                    ""
                }
            );

            block.shuffle(&mut self.rng);
            records.extend(block);
        }

        records.shuffle(&mut self.rng);

        Ok(records)
    }
}
