//! Stratification verifier for cohort-synth.
//!
//! This crate recounts a record sequence against a cohort configuration and
//! reports, per value of the weighted dimension, whether every combination of
//! uniform-dimension values occurs equally often. It performs no I/O: records
//! may come straight from the generator or from a CSV file read back in.
//!
//! # Example
//!
//! ```ignore
//! use cohort_verify::verify_stratification;
//!
//! let records = generator.generate(100)?;
//! let report = verify_stratification(&records, generator.config());
//!
//! assert!(report.is_perfect());
//! println!("{report}");
//! ```

pub mod report;
pub mod verifier;

pub use report::{
    CombinationCount, DistributionEntry, ForeignValue, GroupReport, StratificationReport,
};
pub use verifier::verify_stratification;
