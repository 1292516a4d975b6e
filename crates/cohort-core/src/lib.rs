//! Core types for the cohort-synth framework.
//!
//! This crate provides the foundational types shared by every other crate
//! in the workspace:
//!
//! - [`CohortConfiguration`] - The weighted dimension plus the uniform dimensions,
//!   loaded from YAML
//! - [`WeightedDimension`] / [`UniformDimension`] - The two kinds of categorical axes
//! - [`PatientRecord`] - One synthetic patient as an ordered name → value mapping
//!
//! # Architecture
//!
//! ```text
//! cohort-core (this crate)
//!    │
//!    ├─── cohort-generator   (allocates strata and enumerates records)
//!    ├─── cohort-verify      (recounts combinations per stratum)
//!    ├─── cohort-csv         (writes and reads record sequences)
//!    └─── cohort-narrative   (attaches names and narratives to records)
//! ```
//!
//! # Example
//!
//! ```rust
//! use cohort_core::CohortConfiguration;
//!
//! let config = CohortConfiguration::from_yaml(r#"
//! weighted:
//!   name: race
//!   distribution:
//!     - { value: Black, proportion: 0.5 }
//!     - { value: White, proportion: 0.5 }
//! uniform:
//!   - { name: gender, values: [Male, Female] }
//! "#).unwrap();
//!
//! assert_eq!(config.combination_count(), 2);
//! assert_eq!(config.minimum_population(), 4);
//! ```

pub mod config;
pub mod record;

// Re-exports for convenience
pub use config::{
    CohortConfiguration, ConfigError, UniformDimension, WeightedDimension, WeightedValue,
};
pub use record::PatientRecord;
