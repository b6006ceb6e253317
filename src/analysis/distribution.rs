//! Record distributions by year and by language.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::normalize::NormalizedRecord;

/// Record counts per publication year, plus records without a year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct YearDistribution {
    pub by_year: BTreeMap<i32, usize>,
    pub unknown: usize,
}

/// Counts records per year, ascending.
#[must_use]
pub fn count_by_year(records: &[NormalizedRecord]) -> YearDistribution {
    let mut distribution = YearDistribution::default();
    for record in records {
        match record.record.year {
            Some(year) => *distribution.by_year.entry(year).or_default() += 1,
            None => distribution.unknown += 1,
        }
    }
    distribution
}

/// Counts records per language, most common first.
///
/// Unset languages are grouped under an empty label. Equal counts are
/// ordered by label.
#[must_use]
pub fn count_by_language(records: &[NormalizedRecord]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        let language = record.record.language.as_deref().unwrap_or_default().trim();
        *counts.entry(language.to_string()).or_default() += 1;
    }
    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
