//! Keyword and noun counting.
//!
//! Counting works on token lists, one per record: either the record's
//! keywords or the nouns tagged from its abstract. Raw frequency is a
//! multiset count; cooccurrence and year counts use per-record presence.
//!
//! The token lists that choose the top-N vocabulary and the token lists that
//! are scanned for occurrences may come from different sources, see
//! [`analyze`].

mod cooccurrence;
mod distribution;
mod frequency;
mod matrix;
mod tagger;
mod yearly;

pub use cooccurrence::CooccurrenceMatrix;
pub use distribution::{YearDistribution, count_by_language, count_by_year};
pub use frequency::TokenFrequency;
pub use matrix::LabeledMatrix;
pub use tagger::{NounTagger, StopWordTagger, extract_nouns, load_stop_words};
pub use yearly::YearTokenMatrix;

use std::fmt;
use std::str::FromStr;

use tracing::{info, instrument};

use crate::normalize::NormalizedRecord;

/// Where a record's token list comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenSource {
    /// The normalized keyword list.
    #[default]
    Keywords,
    /// Nouns tagged from the abstract; empty when the abstract is unset.
    AbstractNouns,
}

impl TokenSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keywords => "keywords",
            Self::AbstractNouns => "nouns",
        }
    }
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keywords" | "keyword" => Ok(Self::Keywords),
            "nouns" | "noun" | "abstract" => Ok(Self::AbstractNouns),
            other => Err(format!(
                "unknown token source '{other}', expected 'keywords' or 'nouns'"
            )),
        }
    }
}

/// Builds one token list per record, in record order.
#[must_use]
pub fn token_lists(
    records: &[NormalizedRecord],
    source: TokenSource,
    tagger: &dyn NounTagger,
) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|record| match source {
            TokenSource::Keywords => record.keyword_list().to_vec(),
            TokenSource::AbstractNouns => record
                .record
                .abstract_text
                .as_deref()
                .map(|text| extract_nouns(tagger, text))
                .unwrap_or_default(),
        })
        .collect()
}

/// All aggregates for one counting run.
#[derive(Debug, Clone)]
pub struct TokenAnalysis {
    /// Frequencies of the occurrence-source tokens.
    pub frequency: TokenFrequency,
    /// Selected vocabulary, most frequent first.
    pub top: Vec<String>,
    pub cooccurrence: CooccurrenceMatrix,
    pub yearly: YearTokenMatrix,
}

/// Selects the top-N tokens from `vocabulary` lists and counts them in `occurrence` lists.
#[instrument(skip(records, tagger), fields(records = records.len()))]
pub fn analyze(
    records: &[NormalizedRecord],
    vocabulary: TokenSource,
    occurrence: TokenSource,
    top_n: usize,
    tagger: &dyn NounTagger,
) -> TokenAnalysis {
    let occurrence_lists = token_lists(records, occurrence, tagger);
    let frequency = TokenFrequency::from_documents(&occurrence_lists);

    let top = if vocabulary == occurrence {
        frequency.top_n(top_n)
    } else {
        TokenFrequency::from_documents(token_lists(records, vocabulary, tagger)).top_n(top_n)
    };

    let cooccurrence = CooccurrenceMatrix::build(&occurrence_lists, &top);
    let yearly = YearTokenMatrix::build(
        records
            .iter()
            .map(|record| record.record.year)
            .zip(&occurrence_lists),
        &top,
    );

    info!(
        distinct_tokens = frequency.len(),
        total_tokens = frequency.total(),
        selected = top.len(),
        years = yearly.years().len(),
        "counted tokens"
    );

    TokenAnalysis {
        frequency,
        top,
        cooccurrence,
        yearly,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_record;
    use crate::record::ArticleRecord;

    fn record(keyword: &str, abstract_text: Option<&str>, year: Option<i32>) -> NormalizedRecord {
        let mut record = ArticleRecord::new("t", "u");
        record.keyword = Some(keyword.to_string());
        record.abstract_text = abstract_text.map(String::from);
        record.year = year;
        normalize_record(record)
    }

    fn whitespace_tagger(text: &str) -> Vec<String> {
        text.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_token_source_parse() {
        assert_eq!("keywords".parse::<TokenSource>(), Ok(TokenSource::Keywords));
        assert_eq!("Nouns".parse::<TokenSource>(), Ok(TokenSource::AbstractNouns));
        assert!("titles".parse::<TokenSource>().is_err());
    }

    #[test]
    fn test_token_lists_nouns_from_abstract() {
        let records = vec![record("k", Some("music therapy a"), None), record("k", None, None)];
        let lists = token_lists(&records, TokenSource::AbstractNouns, &whitespace_tagger);
        assert_eq!(lists, vec![vec!["music".to_string(), "therapy".to_string()], vec![]]);
    }

    #[test]
    fn test_analyze_keywords_example() {
        let records = vec![
            record("music , therapy", None, Some(2018)),
            record("music , autism", None, Some(2019)),
        ];
        let analysis = analyze(
            &records,
            TokenSource::Keywords,
            TokenSource::Keywords,
            3,
            &whitespace_tagger,
        );

        assert_eq!(analysis.frequency.count("music"), 2);
        assert_eq!(analysis.frequency.count("therapy"), 1);
        assert_eq!(analysis.frequency.count("autism"), 1);
        assert_eq!(analysis.top, vec!["music", "therapy", "autism"]);
        assert_eq!(analysis.cooccurrence.get("music", "music"), Some(2));
        assert_eq!(analysis.cooccurrence.get("therapy", "autism"), Some(0));
        assert_eq!(analysis.yearly.get("music", 2019), Some(1));
    }

    #[test]
    fn test_analyze_keyword_vocabulary_counted_in_nouns() {
        let records = vec![
            record("음악치료", Some("음악치료 효과 음악치료"), Some(2020)),
            record("음악치료 , 자폐", Some("자폐 아동"), Some(2020)),
        ];
        let analysis = analyze(
            &records,
            TokenSource::Keywords,
            TokenSource::AbstractNouns,
            2,
            &whitespace_tagger,
        );

        assert_eq!(analysis.top, vec!["음악치료", "자폐"]);
        // Frequency comes from the nouns and counts duplicates.
        assert_eq!(analysis.frequency.count("음악치료"), 2);
        assert_eq!(analysis.cooccurrence.get("음악치료", "음악치료"), Some(1));
        assert_eq!(analysis.cooccurrence.get("음악치료", "자폐"), Some(0));
        assert_eq!(analysis.yearly.get("자폐", 2020), Some(1));
    }
}
