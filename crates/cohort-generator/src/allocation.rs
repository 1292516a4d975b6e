//! Group-size allocation for the weighted dimension.
//!
//! Each weighted value `v` with proportion `p_v` receives
//! `floor(floor(N × p_v) / C) × C` records, where `C` is the number of
//! uniform-dimension combinations. A value whose share rounds down to zero is
//! still given one full combinatorial set (`C` records): small requested totals
//! favor coverage of every stratum over fidelity to the configured proportions.
//! As a consequence the realized population may be smaller than requested
//! (rounding) or, with skewed distributions, larger than the naive share.

use crate::generator::GeneratorError;
use cohort_core::CohortConfiguration;

/// Allowed deviation of the proportion sum from 1.0.
pub const DISTRIBUTION_TOLERANCE: f64 = 1e-6;

/// Allocated size of one stratum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSize {
    /// Weighted-dimension value
    pub value: String,
    /// Number of records in this stratum (a multiple of `C`)
    pub size: u64,
    /// Number of full Cartesian copies (`size / C`)
    pub sets: u64,
    /// Whether the one-set minimum overrode a proportional share of zero
    pub forced_minimum: bool,
}

/// Sub-population size per weighted value, in configuration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupAllocation {
    groups: Vec<GroupSize>,
    combination_count: u64,
    total: u64,
}

impl GroupAllocation {
    /// All strata in configuration order.
    pub fn groups(&self) -> &[GroupSize] {
        &self.groups
    }

    /// Get the allocation for one weighted value.
    pub fn get(&self, value: &str) -> Option<&GroupSize> {
        self.groups.iter().find(|g| g.value == value)
    }

    /// Number of uniform combinations (`C`) the sizes are multiples of.
    pub fn combination_count(&self) -> u64 {
        self.combination_count
    }

    /// Realized population size.
    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Check the weighted proportions: finite, non-negative, summing to 1.0.
pub fn validate_distribution(config: &CohortConfiguration) -> Result<(), GeneratorError> {
    for weighted in &config.weighted.distribution {
        if !weighted.proportion.is_finite() || weighted.proportion < 0.0 {
            return Err(GeneratorError::InvalidDistribution(format!(
                "proportion for '{}' must be a non-negative number, got {}",
                weighted.value, weighted.proportion
            )));
        }
    }

    let sum = config.weighted.proportion_sum();
    if (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE {
        return Err(GeneratorError::InvalidDistribution(format!(
            "proportions for '{}' sum to {sum}, expected 1.0",
            config.weighted.name
        )));
    }

    Ok(())
}

/// Compute the allocation table for `total_patients`.
///
/// Runs every precondition check of the generator, in order: positive total,
/// well-formed configuration, valid distribution, `total_patients >= C × K`.
pub fn allocate_groups(
    total_patients: u64,
    config: &CohortConfiguration,
) -> Result<GroupAllocation, GeneratorError> {
    if total_patients == 0 {
        return Err(GeneratorError::InvalidInput(
            "total_patients must be a positive integer".to_string(),
        ));
    }

    config.validate_structure()?;
    validate_distribution(config)?;

    let minimum = config.minimum_population();
    if total_patients < minimum {
        return Err(GeneratorError::InsufficientSampleSize {
            requested: total_patients,
            minimum,
        });
    }

    let combination_count = config.combination_count();
    let groups: Vec<GroupSize> = config
        .weighted
        .distribution
        .iter()
        .map(|weighted| {
            // The float product can round past the request near the top of the range.
            let raw = ((total_patients as f64 * weighted.proportion).floor() as u64)
                .min(total_patients);
            let rounded = (raw / combination_count) * combination_count;
            let (size, forced_minimum) = if rounded == 0 {
                (combination_count, true)
            } else {
                (rounded, false)
            };
            GroupSize {
                value: weighted.value.clone(),
                size,
                sets: size / combination_count,
                forced_minimum,
            }
        })
        .collect();

    let total = groups
        .iter()
        .try_fold(0u64, |acc, g| acc.checked_add(g.size))
        .filter(|total| usize::try_from(*total).is_ok())
        .ok_or_else(|| {
            GeneratorError::InvalidInput(format!(
                "{total_patients} patients cannot be allocated: the stratified population \
                 does not fit in memory"
            ))
        })?;

    Ok(GroupAllocation {
        groups,
        combination_count,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohort_core::{UniformDimension, WeightedDimension, WeightedValue};

    fn config(distribution: &[(&str, f64)], uniform_sizes: &[usize]) -> CohortConfiguration {
        CohortConfiguration::new(
            WeightedDimension::new(
                "race",
                distribution
                    .iter()
                    .map(|(v, p)| WeightedValue::new(*v, *p))
                    .collect(),
            ),
            uniform_sizes
                .iter()
                .enumerate()
                .map(|(i, n)| {
                    UniformDimension::new(format!("dim{i}"), (0..*n).map(|j| format!("v{j}")))
                })
                .collect(),
        )
    }

    fn pain_study() -> CohortConfiguration {
        config(
            &[
                ("Black", 0.25),
                ("White", 0.25),
                ("Hispanic", 0.25),
                ("Asian", 0.25),
            ],
            &[2, 2, 2],
        )
    }

    #[test]
    fn test_worked_example_allocation() {
        let allocation = allocate_groups(100, &pain_study()).unwrap();

        assert_eq!(allocation.combination_count(), 8);
        for group in allocation.groups() {
            assert_eq!(group.size, 24, "group {}", group.value);
            assert_eq!(group.sets, 3);
            assert!(!group.forced_minimum);
        }
        assert_eq!(allocation.total(), 96);
    }

    #[test]
    fn test_exact_minimum_gives_one_set_each() {
        let allocation = allocate_groups(32, &pain_study()).unwrap();
        assert!(allocation.groups().iter().all(|g| g.size == 8 && g.sets == 1));
        assert_eq!(allocation.total(), 32);
    }

    #[test]
    fn test_below_minimum_rejected() {
        let err = allocate_groups(31, &pain_study()).unwrap_err();
        assert!(matches!(
            err,
            GeneratorError::InsufficientSampleSize {
                requested: 31,
                minimum: 32
            }
        ));
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn test_zero_total_rejected() {
        assert!(matches!(
            allocate_groups(0, &pain_study()),
            Err(GeneratorError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_skewed_distribution_forces_minimum_set() {
        let skewed = config(&[("A", 0.97), ("B", 0.03)], &[2, 2, 2]);
        let allocation = allocate_groups(100, &skewed).unwrap();

        assert_eq!(allocation.get("A").unwrap().size, 96);
        let b = allocation.get("B").unwrap();
        assert_eq!(b.size, 8);
        assert!(b.forced_minimum);
        // Coverage wins over proportion: realized total exceeds the request.
        assert_eq!(allocation.total(), 104);
    }

    #[test]
    fn test_zero_proportion_still_gets_one_set() {
        let allocation = allocate_groups(16, &config(&[("A", 1.0), ("B", 0.0)], &[2, 4])).unwrap();
        assert_eq!(allocation.get("A").unwrap().size, 16);
        assert_eq!(allocation.get("B").unwrap().size, 8);
    }

    #[test]
    fn test_floor_uses_float_product() {
        // 100 × 0.29 is 28.999..., floored to 28, then rounded down to 28 (C = 2).
        let allocation = allocate_groups(100, &config(&[("A", 0.29), ("B", 0.71)], &[2])).unwrap();
        assert_eq!(allocation.get("A").unwrap().size, 28);
        assert_eq!(allocation.get("B").unwrap().size, 70);
    }

    #[test]
    fn test_no_uniform_dimensions() {
        let allocation = allocate_groups(10, &config(&[("A", 0.5), ("B", 0.5)], &[])).unwrap();
        assert_eq!(allocation.combination_count(), 1);
        assert_eq!(allocation.total(), 10);
    }

    #[test]
    fn test_share_never_exceeds_request() {
        // 2^53 + 3 is not representable as f64 and rounds up to 2^53 + 4.
        let total = (1u64 << 53) + 3;
        let allocation = allocate_groups(total, &config(&[("A", 1.0)], &[])).unwrap();
        assert_eq!(allocation.get("A").unwrap().size, total);
        assert_eq!(allocation.total(), total);
    }

    #[test]
    fn test_overflowing_total_rejected() {
        let err = allocate_groups(u64::MAX, &config(&[("A", 1.0), ("B", 0.0)], &[])).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidInput(_)));
    }

    #[test]
    fn test_distribution_must_sum_to_one() {
        let err = allocate_groups(100, &config(&[("A", 0.5), ("B", 0.4)], &[2])).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidDistribution(_)));
    }

    #[test]
    fn test_distribution_within_tolerance_accepted() {
        let near = config(&[("A", 0.333_333_3), ("B", 0.333_333_3), ("C", 0.333_333_4)], &[2]);
        assert!(allocate_groups(60, &near).is_ok());
    }

    #[test]
    fn test_negative_proportion_rejected() {
        let err = allocate_groups(100, &config(&[("A", 1.2), ("B", -0.2)], &[2])).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidDistribution(msg) if msg.contains("'B'")));
    }

    #[test]
    fn test_nan_proportion_rejected() {
        let err = allocate_groups(100, &config(&[("A", f64::NAN)], &[2])).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidDistribution(_)));
    }

    #[test]
    fn test_structural_error_reported_before_distribution() {
        let broken = config(&[("A", 0.5)], &[0]);
        assert!(matches!(
            allocate_groups(100, &broken),
            Err(GeneratorError::InvalidConfiguration(_))
        ));
    }
}
