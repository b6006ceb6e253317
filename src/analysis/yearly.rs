//! Token-by-year counts over a contiguous year range.

use std::collections::HashSet;

use tracing::{debug, instrument};

use super::LabeledMatrix;

/// Per-year presence counts of selected tokens.
///
/// Columns span every year from the earliest to the latest known year, so
/// years without records appear with zero counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearTokenMatrix {
    matrix: LabeledMatrix<String, i32>,
}

impl YearTokenMatrix {
    /// Counts, for each record with a known year, the distinct `top` tokens it contains.
    ///
    /// The year range is taken from every record with a known year, whether
    /// or not it contains a selected token. Records without a year are skipped.
    #[instrument(skip_all, fields(top = top.len()))]
    pub fn build<I, D, S>(documents: I, top: &[String]) -> Self
    where
        I: IntoIterator<Item = (Option<i32>, D)>,
        D: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selected: HashSet<&str> = top.iter().map(String::as_str).collect();
        let mut hits: Vec<(i32, Vec<String>)> = Vec::new();
        let mut skipped = 0usize;

        for (year, document) in documents {
            let Some(year) = year else {
                skipped += 1;
                continue;
            };
            let mut present: Vec<String> = Vec::new();
            for token in document {
                let token = token.as_ref();
                if selected.contains(token) && !present.iter().any(|seen| seen == token) {
                    present.push(token.to_string());
                }
            }
            hits.push((year, present));
        }

        let years: Vec<i32> = match (
            hits.iter().map(|(year, _)| *year).min(),
            hits.iter().map(|(year, _)| *year).max(),
        ) {
            (Some(first), Some(last)) => (first..=last).collect(),
            _ => Vec::new(),
        };

        let mut matrix = LabeledMatrix::zeros(top.to_vec(), years);
        for (year, present) in &hits {
            for token in present {
                matrix.increment(token, year);
            }
        }

        debug!(records = hits.len(), skipped, "built year matrix");
        Self { matrix }
    }

    /// Records from `year` containing `token`.
    #[must_use]
    pub fn get(&self, token: &str, year: i32) -> Option<usize> {
        self.matrix.get(&token.to_string(), &year)
    }

    /// Year axis, ascending and contiguous.
    #[must_use]
    pub fn years(&self) -> &[i32] {
        self.matrix.column_labels()
    }

    /// Records containing `token` over all years.
    #[must_use]
    pub fn token_total(&self, token: &str) -> Option<usize> {
        self.matrix.row_sum(&token.to_string())
    }

    #[must_use]
    pub fn matrix(&self) -> &LabeledMatrix<String, i32> {
        &self.matrix
    }
}
