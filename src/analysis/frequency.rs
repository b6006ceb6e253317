//! Token frequency counting with first-seen tie breaking.

use std::collections::HashMap;

/// Multiset count of tokens that remembers the order tokens were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenFrequency {
    counts: HashMap<String, usize>,
    order: Vec<String>,
}

impl TokenFrequency {
    /// Counts every token of every document, duplicates included.
    pub fn from_documents<I, D, S>(documents: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut frequency = Self::default();
        for document in documents {
            for token in document {
                frequency.add(token.as_ref());
            }
        }
        frequency
    }

    /// Adds one occurrence of `token`.
    pub fn add(&mut self, token: &str) {
        if let Some(count) = self.counts.get_mut(token) {
            *count += 1;
        } else {
            self.counts.insert(token.to_string(), 1);
            self.order.push(token.to_string());
        }
    }

    /// Occurrences of `token`, zero when never seen.
    #[must_use]
    pub fn count(&self, token: &str) -> usize {
        self.counts.get(token).copied().unwrap_or(0)
    }

    /// Number of distinct tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total occurrences across all tokens.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Tokens with counts in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.order
            .iter()
            .map(|token| (token.as_str(), self.count(token)))
    }

    /// All tokens by descending count; equal counts keep first-seen order.
    #[must_use]
    pub fn ranked(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self.iter().collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// The `n` most frequent tokens, see [`ranked`](Self::ranked).
    #[must_use]
    pub fn top_n(&self, n: usize) -> Vec<String> {
        self.ranked()
            .into_iter()
            .take(n)
            .map(|(token, _)| token.to_string())
            .collect()
    }
}
