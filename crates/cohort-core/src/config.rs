//! Cohort configuration for the cohort-synth framework.
//!
//! A cohort is described by exactly one *weighted* dimension, whose values carry
//! target proportions and define the strata, and zero or more *uniform*
//! dimensions, whose values are implicitly equally weighted and must be perfectly
//! balanced inside every stratum.
//!
//! ## YAML Layout
//!
//! ```yaml
//! weighted:
//!   name: race
//!   distribution:
//!     - { value: Black, proportion: 0.25 }
//!     - { value: White, proportion: 0.75 }
//! uniform:
//!   - { name: gender, values: [Male, Female] }
//!   - { name: age_group, values: [middle aged, old aged] }
//! ```
//!
//! Lists are used instead of maps so that declaration order is preserved; the
//! generator's output under a fixed seed depends on it.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error reading configuration file
    #[error("Failed to read cohort configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A dimension has no values
    #[error("Dimension '{0}' has no values")]
    EmptyDimension(String),

    /// A dimension has an empty name
    #[error("Dimension names must not be empty")]
    EmptyName,

    /// Two dimensions share a name
    #[error("Dimension '{0}' is declared more than once")]
    DuplicateDimension(String),

    /// A value occurs twice inside one dimension
    #[error("Value '{value}' is repeated in dimension '{dimension}'")]
    DuplicateValue { dimension: String, value: String },
}

// ============================================================================
// Dimensions
// ============================================================================

/// One value of the weighted dimension with its target proportion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedValue {
    /// Category label (e.g. "Black")
    pub value: String,

    /// Target share of the population, in `[0, 1]`
    pub proportion: f64,
}

impl WeightedValue {
    pub fn new(value: impl Into<String>, proportion: f64) -> Self {
        Self {
            value: value.into(),
            proportion,
        }
    }
}

/// The distribution-bearing dimension. Each of its values defines one stratum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedDimension {
    /// Dimension name, used as the column name (e.g. "race")
    pub name: String,

    /// Values with their target proportions, in declaration order
    pub distribution: Vec<WeightedValue>,
}

impl WeightedDimension {
    pub fn new(name: impl Into<String>, distribution: Vec<WeightedValue>) -> Self {
        Self {
            name: name.into(),
            distribution,
        }
    }

    /// Get the category labels in declaration order.
    pub fn values(&self) -> Vec<&str> {
        self.distribution.iter().map(|w| w.value.as_str()).collect()
    }

    /// Check whether `value` is one of the configured labels.
    pub fn contains(&self, value: &str) -> bool {
        self.distribution.iter().any(|w| w.value == value)
    }

    /// Sum of all configured proportions.
    pub fn proportion_sum(&self) -> f64 {
        self.distribution.iter().map(|w| w.proportion).sum()
    }
}

/// An equally weighted dimension that must be balanced inside each stratum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniformDimension {
    /// Dimension name, used as the column name (e.g. "gender")
    pub name: String,

    /// Possible values in declaration order
    pub values: Vec<String>,
}

impl UniformDimension {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether `value` is one of the configured values.
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

// ============================================================================
// Cohort Configuration
// ============================================================================

/// Full cohort configuration: one weighted dimension plus the uniform dimensions.
///
/// There is no process-wide default; callers construct or load a configuration
/// and pass it explicitly to the generator and the verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortConfiguration {
    /// The stratifying dimension
    pub weighted: WeightedDimension,

    /// Dimensions balanced within each stratum
    #[serde(default)]
    pub uniform: Vec<UniformDimension>,
}

impl CohortConfiguration {
    /// Create a configuration from its dimensions.
    pub fn new(weighted: WeightedDimension, uniform: Vec<UniformDimension>) -> Self {
        Self { weighted, uniform }
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    ///
    /// Parsing does not validate; call [`validate_structure`](Self::validate_structure)
    /// or let the generator do it.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Number of weighted values (`K`).
    pub fn weighted_cardinality(&self) -> u64 {
        self.weighted.distribution.len() as u64
    }

    /// Number of combinations of the uniform dimensions (`C`).
    ///
    /// The empty product is 1: with no uniform dimensions every record of a
    /// stratum is the same (empty) combination.
    pub fn combination_count(&self) -> u64 {
        self.uniform
            .iter()
            .fold(1u64, |acc, d| acc.saturating_mul(d.values.len() as u64))
    }

    /// Smallest population that yields one full combinatorial set per stratum (`C × K`).
    pub fn minimum_population(&self) -> u64 {
        self.combination_count()
            .saturating_mul(self.weighted_cardinality())
    }

    /// Column names in record order: the weighted dimension, then each uniform dimension.
    pub fn column_names(&self) -> Vec<&str> {
        let mut names = vec![self.weighted.name.as_str()];
        names.extend(self.uniform.iter().map(|d| d.name.as_str()));
        names
    }

    /// Full Cartesian product of the uniform dimensions' values.
    ///
    /// Each combination lists one value per uniform dimension in declaration
    /// order; the last dimension varies fastest.
    pub fn combinations(&self) -> Vec<Vec<String>> {
        if self.uniform.is_empty() {
            return vec![Vec::new()];
        }

        self.uniform
            .iter()
            .map(|d| d.values.iter().cloned())
            .multi_cartesian_product()
            .collect()
    }

    /// Validate the shape of the configuration.
    ///
    /// Proportion arithmetic is not checked here; the generator reports a bad
    /// distribution separately.
    pub fn validate_structure(&self) -> Result<(), ConfigError> {
        let mut seen_names = HashSet::new();

        if self.weighted.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        seen_names.insert(self.weighted.name.as_str());

        if self.weighted.distribution.is_empty() {
            return Err(ConfigError::EmptyDimension(self.weighted.name.clone()));
        }
        check_unique_values(
            &self.weighted.name,
            self.weighted.distribution.iter().map(|w| w.value.as_str()),
        )?;

        for dimension in &self.uniform {
            if dimension.name.trim().is_empty() {
                return Err(ConfigError::EmptyName);
            }
            if !seen_names.insert(dimension.name.as_str()) {
                return Err(ConfigError::DuplicateDimension(dimension.name.clone()));
            }
            if dimension.values.is_empty() {
                return Err(ConfigError::EmptyDimension(dimension.name.clone()));
            }
            check_unique_values(&dimension.name, dimension.values.iter().map(String::as_str))?;
        }

        Ok(())
    }
}

fn check_unique_values<'a>(
    dimension: &str,
    values: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value) {
            return Err(ConfigError::DuplicateValue {
                dimension: dimension.to_string(),
                value: value.to_string(),
            });
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
