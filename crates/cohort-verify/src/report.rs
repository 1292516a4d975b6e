//! Stratification report types.

use std::fmt;

/// Count of one uniform-dimension combination inside a stratum.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinationCount {
    /// One value per uniform dimension, in configuration order.
    pub values: Vec<String>,
    /// Number of records with this combination.
    pub count: u64,
    /// Share of the stratum, in percent.
    pub percentage: f64,
}

/// Balance result for one value of the weighted dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupReport {
    /// Weighted-dimension value.
    pub value: String,
    /// Number of records in this stratum.
    pub total: u64,
    /// `total / C`, the count every combination should have.
    pub expected_per_combination: u64,
    /// Every combination, including those that never occur.
    pub combinations: Vec<CombinationCount>,
    /// Whether every combination occurs equally often.
    pub balanced: bool,
}

impl GroupReport {
    /// A stratum without any records is reported but not judged.
    pub fn is_present(&self) -> bool {
        self.total > 0
    }
}

/// Share of the population held by one weighted value.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionEntry {
    /// Weighted-dimension value.
    pub value: String,
    /// Number of records.
    pub count: u64,
    /// Share of all counted records, in percent.
    pub percentage: f64,
}

/// A record field that is missing or holds a value outside the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignValue {
    /// Position of the record in the verified sequence.
    pub position: usize,
    /// Dimension name.
    pub dimension: String,
    /// Offending value, `None` when the field is missing.
    pub value: Option<String>,
}

/// Verification report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StratificationReport {
    /// Name of the weighted dimension.
    pub weighted_dimension: String,
    /// Uniform dimension names, in configuration order.
    pub uniform_dimensions: Vec<String>,
    /// Number of records examined.
    pub total_records: u64,
    /// Number of records counted (those without foreign values).
    pub counted_records: u64,
    /// Number of uniform-dimension combinations (`C`).
    pub combination_count: u64,
    /// Per-stratum balance results, in configuration order.
    pub groups: Vec<GroupReport>,
    /// Overall weighted-dimension distribution, in configuration order.
    pub distribution: Vec<DistributionEntry>,
    /// Fields outside the configured value sets.
    pub foreign_values: Vec<ForeignValue>,
}

impl StratificationReport {
    /// Check if every present stratum is balanced and every value is configured.
    pub fn is_perfect(&self) -> bool {
        self.counted_records > 0
            && self.foreign_values.is_empty()
            && self
                .groups
                .iter()
                .filter(|g| g.is_present())
                .all(|g| g.balanced)
    }

    /// Get the report for one stratum.
    pub fn group(&self, value: &str) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.value == value)
    }

    /// Get a summary string.
    pub fn summary(&self) -> String {
        if self.is_perfect() {
            format!(
                "Stratification PERFECT: {} records across {} strata",
                self.total_records,
                self.groups.iter().filter(|g| g.is_present()).count()
            )
        } else {
            let unbalanced = self
                .groups
                .iter()
                .filter(|g| g.is_present() && !g.balanced)
                .count();
            format!(
                "Stratification FAILED: {} unbalanced strata, {} foreign values out of {} records",
                unbalanced,
                self.foreign_values.len(),
                self.total_records
            )
        }
    }
}

impl fmt::Display for StratificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in self.groups.iter().filter(|g| g.is_present()) {
            writeln!(f)?;
            writeln!(
                f,
                "Verification for {} group ({} patients):",
                group.value, group.total
            )?;
            writeln!(
                f,
                "Perfect stratification: {}",
                if group.balanced { "Yes" } else { "No" }
            )?;
            for combination in &group.combinations {
                writeln!(
                    f,
                    "  {} ({:.1}%)",
                    combination.values.join(", "),
                    combination.percentage
                )?;
            }
        }

        if !self.foreign_values.is_empty() {
            writeln!(f)?;
            writeln!(f, "Values outside the configuration:")?;
            for foreign in &self.foreign_values {
                match &foreign.value {
                    Some(value) => writeln!(
                        f,
                        "  record {}: {} = '{}'",
                        foreign.position, foreign.dimension, value
                    )?,
                    None => writeln!(
                        f,
                        "  record {}: {} is missing",
                        foreign.position, foreign.dimension
                    )?,
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "Overall {} distribution:", self.weighted_dimension)?;
        for entry in &self.distribution {
            writeln!(
                f,
                "{}: {} patients ({:.1}%)",
                entry.value, entry.count, entry.percentage
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(value: &str, counts: &[u64]) -> GroupReport {
        let total: u64 = counts.iter().sum();
        GroupReport {
            value: value.to_string(),
            total,
            expected_per_combination: total / counts.len() as u64,
            combinations: counts
                .iter()
                .enumerate()
                .map(|(i, &count)| CombinationCount {
                    values: vec![format!("v{i}")],
                    count,
                    percentage: if total > 0 {
                        100.0 * count as f64 / total as f64
                    } else {
                        0.0
                    },
                })
                .collect(),
            balanced: counts.windows(2).all(|w| w[0] == w[1]),
        }
    }

    fn report(groups: Vec<GroupReport>) -> StratificationReport {
        let counted = groups.iter().map(|g| g.total).sum();
        StratificationReport {
            weighted_dimension: "race".to_string(),
            uniform_dimensions: vec!["gender".to_string()],
            total_records: counted,
            counted_records: counted,
            groups,
            ..Default::default()
        }
    }

    #[test]
    fn test_report_perfect() {
        let report = report(vec![group("A", &[2, 2]), group("B", &[1, 1])]);
        assert!(report.is_perfect());
        assert!(report.summary().starts_with("Stratification PERFECT"));
    }

    #[test]
    fn test_report_unbalanced() {
        let report = report(vec![group("A", &[2, 2]), group("B", &[2, 1])]);
        assert!(!report.is_perfect());
        assert!(report.summary().contains("1 unbalanced strata"));
    }

    #[test]
    fn test_absent_group_not_judged() {
        let report = report(vec![group("A", &[2, 2]), group("B", &[0, 0])]);
        assert!(!report.group("B").unwrap().is_present());
        assert!(report.is_perfect());
    }

    #[test]
    fn test_empty_report_not_perfect() {
        assert!(!StratificationReport::default().is_perfect());
    }

    #[test]
    fn test_foreign_values_fail_report() {
        let mut report = report(vec![group("A", &[1, 1])]);
        report.foreign_values.push(ForeignValue {
            position: 3,
            dimension: "gender".to_string(),
            value: Some("Other".to_string()),
        });
        assert!(!report.is_perfect());
        assert!(report.to_string().contains("record 3: gender = 'Other'"));
    }

    #[test]
    fn test_display_lists_groups_and_distribution() {
        let mut report = report(vec![group("A", &[2, 2]), group("B", &[0, 0])]);
        report.distribution = vec![
            DistributionEntry {
                value: "A".to_string(),
                count: 4,
                percentage: 100.0,
            },
            DistributionEntry {
                value: "B".to_string(),
                count: 0,
                percentage: 0.0,
            },
        ];

        let text = report.to_string();
        assert!(text.contains("Verification for A group (4 patients):"));
        assert!(text.contains("Perfect stratification: Yes"));
        assert!(text.contains("  v0 (50.0%)"));
        assert!(!text.contains("Verification for B group"));
        assert!(text.contains("Overall race distribution:"));
        assert!(text.contains("A: 4 patients (100.0%)"));
        assert!(text.contains("B: 0 patients (0.0%)"));
    }
}
