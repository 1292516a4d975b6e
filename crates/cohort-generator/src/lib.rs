//! Stratified cohort generator for cohort-synth.
//!
//! This crate provides the [`StratifiedCohortGenerator`], which turns a target
//! population size and a [`CohortConfiguration`](cohort_core::CohortConfiguration)
//! into a list of synthetic patient records such that, within every value of the
//! weighted dimension, every combination of the uniform dimensions occurs the same
//! number of times.
//!
//! # Architecture
//!
//! ```text
//! CohortConfiguration (YAML)      total_patients
//!            │                          │
//!            └────────────┬─────────────┘
//!                         ▼
//!               ┌───────────────────┐
//!               │  allocate_groups  │  floor(N × p), round down to a
//!               └─────────┬─────────┘  multiple of C, at least C
//!                         ▼
//!         ┌───────────────────────────────┐
//!         │  StratifiedCohortGenerator    │
//!         │                               │
//!         │  - full Cartesian copies      │
//!         │  - shuffle per stratum        │
//!         │  - shuffle concatenation      │
//!         │  - rng (StdRng, seedable)     │
//!         └───────────────┬───────────────┘
//!                         ▼
//!              Vec<PatientRecord>
//! ```
//!
//! # Example
//!
//! ```rust
//! use cohort_core::CohortConfiguration;
//! use cohort_generator::StratifiedCohortGenerator;
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
//! let mut generator = StratifiedCohortGenerator::new(config, 42);
//! let records = generator.generate(10).unwrap();
//! assert_eq!(records.len(), 8);
//! ```

pub mod allocation;
pub mod generator;

// Re-exports for convenience
pub use allocation::{allocate_groups, GroupAllocation, GroupSize, DISTRIBUTION_TOLERANCE};
pub use generator::{GeneratorError, StratifiedCohortGenerator};
