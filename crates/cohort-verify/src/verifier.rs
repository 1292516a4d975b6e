//! Stratification verifier implementation.
//!
//! The verifier is a pure function of a record sequence and a configuration.
//! Each record is mapped to a stratum index and a combination index; the
//! combination index is the mixed-radix number formed by the positions of its
//! uniform values, which matches the order of
//! [`CohortConfiguration::combinations`].

use crate::report::{
    CombinationCount, DistributionEntry, ForeignValue, GroupReport, StratificationReport,
};
use cohort_core::{CohortConfiguration, PatientRecord};
use tracing::{debug, warn};

/// Recount every (stratum, combination) cell of `records` and judge the balance.
pub fn verify_stratification(
    records: &[PatientRecord],
    config: &CohortConfiguration,
) -> StratificationReport {
    let combinations = config.combinations();
    let strata = config.weighted.values();
    let mut cells = vec![vec![0u64; combinations.len()]; strata.len()];
    let mut foreign_values = Vec::new();
    let mut counted_records = 0u64;

    for (position, record) in records.iter().enumerate() {
        match locate(record, config, position) {
            Ok((stratum, combination)) => {
                cells[stratum][combination] += 1;
                counted_records += 1;
            }
            Err(mut foreign) => foreign_values.append(&mut foreign),
        }
    }

    if !foreign_values.is_empty() {
        warn!(
            "{} field values fall outside the cohort configuration",
            foreign_values.len()
        );
    }

    let combination_count = combinations.len() as u64;
    let groups: Vec<GroupReport> = strata
        .iter()
        .zip(&cells)
        .map(|(value, counts)| {
            let total: u64 = counts.iter().sum();
            let balanced = counts.windows(2).all(|w| w[0] == w[1]);
            debug!("Stratum '{}': {} records, balanced={}", value, total, balanced);

            GroupReport {
                value: value.to_string(),
                total,
                expected_per_combination: total.checked_div(combination_count).unwrap_or(0),
                combinations: combinations
                    .iter()
                    .zip(counts)
                    .map(|(values, &count)| CombinationCount {
                        values: values.clone(),
                        count,
                        percentage: percentage(count, total),
                    })
                    .collect(),
                balanced,
            }
        })
        .collect();

    let distribution = groups
        .iter()
        .map(|g| DistributionEntry {
            value: g.value.clone(),
            count: g.total,
            percentage: percentage(g.total, counted_records),
        })
        .collect();

    StratificationReport {
        weighted_dimension: config.weighted.name.clone(),
        uniform_dimensions: config.uniform.iter().map(|d| d.name.clone()).collect(),
        total_records: records.len() as u64,
        counted_records,
        combination_count,
        groups,
        distribution,
        foreign_values,
    }
}

/// Map a record to its (stratum index, combination index).
fn locate(
    record: &PatientRecord,
    config: &CohortConfiguration,
    position: usize,
) -> Result<(usize, usize), Vec<ForeignValue>> {
    let mut foreign = Vec::new();

    let stratum = match record.get(&config.weighted.name) {
        Some(value) => {
            let index = config
                .weighted
                .distribution
                .iter()
                .position(|w| w.value == value);
            if index.is_none() {
                foreign.push(ForeignValue {
                    position,
                    dimension: config.weighted.name.clone(),
                    value: Some(value.to_string()),
                });
            }
            index
        }
        None => {
            foreign.push(ForeignValue {
                position,
                dimension: config.weighted.name.clone(),
                value: None,
            });
            None
        }
    };

    let mut combination = 0usize;
    for dimension in &config.uniform {
        let value = record.get(&dimension.name);
        match value.and_then(|v| dimension.values.iter().position(|x| x == v)) {
            Some(index) => combination = combination * dimension.values.len() + index,
            None => foreign.push(ForeignValue {
                position,
                dimension: dimension.name.clone(),
                value: value.map(str::to_string),
            }),
        }
    }

    match stratum {
        Some(stratum) if foreign.is_empty() => Ok((stratum, combination)),
        _ => Err(foreign),
    }
}

fn percentage(count: u64, total: u64) -> f64 {
    if total > 0 {
        100.0 * count as f64 / total as f64
    } else {
        0.0
    }
}
