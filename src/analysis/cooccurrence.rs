//! Pairwise cooccurrence over a selected token set.

use std::collections::HashSet;

use tracing::{debug, instrument};

use super::LabeledMatrix;

/// Token-by-token cooccurrence counts.
///
/// A cell counts the records in which both tokens appear. A token repeated in
/// one record counts once for that record, so the diagonal holds per-record
/// presence rather than raw frequency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooccurrenceMatrix {
    matrix: LabeledMatrix<String, String>,
}

impl CooccurrenceMatrix {
    /// Counts cooccurrences of the `top` tokens across `documents`.
    ///
    /// Both axes are `top` in the given order.
    #[instrument(skip_all, fields(top = top.len()))]
    pub fn build<I, D, S>(documents: I, top: &[String]) -> Self
    where
        I: IntoIterator<Item = D>,
        D: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selected: HashSet<&str> = top.iter().map(String::as_str).collect();
        let mut matrix = LabeledMatrix::zeros(top.to_vec(), top.to_vec());
        let mut records = 0usize;

        for document in documents {
            records += 1;
            let mut present: Vec<String> = Vec::new();
            for token in document {
                let token = token.as_ref();
                if selected.contains(token) && !present.iter().any(|seen| seen == token) {
                    present.push(token.to_string());
                }
            }
            for src in &present {
                for dst in &present {
                    matrix.increment(src, dst);
                }
            }
        }

        debug!(records, "built cooccurrence matrix");
        Self { matrix }
    }

    /// Records containing both tokens, `None` if either is outside the token set.
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<usize> {
        self.matrix.get(&a.to_string(), &b.to_string())
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        self.matrix.row_labels()
    }

    #[must_use]
    pub fn matrix(&self) -> &LabeledMatrix<String, String> {
        &self.matrix
    }
}
