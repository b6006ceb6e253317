//! Document set assembly for topic modeling.
//!
//! The builder filters normalized records and turns each survivor into one
//! space-joined token string. Every dropped record is counted in a
//! [`DropReport`] by the first filter that removed it.

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::analysis::{NounTagger, TokenSource, extract_nouns};
use crate::normalize::NormalizedRecord;

/// Record filters applied before building documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusFilter {
    /// Languages whose records are dropped, matched case-insensitively.
    pub excluded_languages: Vec<String>,
}

impl CorpusFilter {
    #[must_use]
    pub fn excluding<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded_languages: languages.into_iter().map(Into::into).collect(),
        }
    }

    fn excludes(&self, language: Option<&str>) -> bool {
        let Some(language) = language.map(|language| language.trim().to_lowercase()) else {
            return false;
        };
        self.excluded_languages
            .iter()
            .any(|excluded| excluded.trim().to_lowercase() == language)
    }
}

/// Why a record was left out of the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Duplicate,
    NonArticle,
    ExcludedLanguage,
    MissingAbstract,
}

/// Counts of records kept and dropped, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropReport {
    pub input: usize,
    pub kept: usize,
    pub duplicate: usize,
    pub non_article: usize,
    pub excluded_language: usize,
    pub missing_abstract: usize,
}

impl DropReport {
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.duplicate + self.non_article + self.excluded_language + self.missing_abstract
    }

    fn record(&mut self, reason: DropReason) {
        match reason {
            DropReason::Duplicate => self.duplicate += 1,
            DropReason::NonArticle => self.non_article += 1,
            DropReason::ExcludedLanguage => self.excluded_language += 1,
            DropReason::MissingAbstract => self.missing_abstract += 1,
        }
    }
}

/// One document of the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusDocument {
    pub title: String,
    /// Space-joined tokens. May be empty when a kept record yields no tokens.
    pub text: String,
}

/// Builds corpus documents from normalized records.
pub struct CorpusBuilder<'a> {
    filter: CorpusFilter,
    source: TokenSource,
    tagger: &'a dyn NounTagger,
}

impl std::fmt::Debug for CorpusBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusBuilder")
            .field("filter", &self.filter)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl<'a> CorpusBuilder<'a> {
    #[must_use]
    pub fn new(filter: CorpusFilter, source: TokenSource, tagger: &'a dyn NounTagger) -> Self {
        Self {
            filter,
            source,
            tagger,
        }
    }

    /// First filter that rejects `record`, checked in fixed order.
    fn drop_reason(&self, record: &NormalizedRecord) -> Option<DropReason> {
        if record.flags.is_duplicated {
            Some(DropReason::Duplicate)
        } else if record.flags.non_article {
            Some(DropReason::NonArticle)
        } else if self.filter.excludes(record.record.language.as_deref()) {
            Some(DropReason::ExcludedLanguage)
        } else if record
            .record
            .abstract_text
            .as_deref()
            .is_none_or(|text| text.trim().is_empty())
        {
            Some(DropReason::MissingAbstract)
        } else {
            None
        }
    }

    fn tokens(&self, record: &NormalizedRecord) -> Vec<String> {
        match self.source {
            TokenSource::Keywords => record.keyword_list().to_vec(),
            TokenSource::AbstractNouns => record
                .record
                .abstract_text
                .as_deref()
                .map(|text| extract_nouns(self.tagger, text))
                .unwrap_or_default(),
        }
    }

    /// Filters `records` and emits one document per kept record, in input order.
    #[instrument(skip(self, records), fields(records = records.len(), source = %self.source))]
    pub fn build(&self, records: &[NormalizedRecord]) -> (Vec<CorpusDocument>, DropReport) {
        let mut report = DropReport {
            input: records.len(),
            ..DropReport::default()
        };
        let mut documents = Vec::with_capacity(records.len());

        for record in records {
            if let Some(reason) = self.drop_reason(record) {
                debug!(url = %record.record.url, ?reason, "dropped record");
                report.record(reason);
                continue;
            }
            documents.push(CorpusDocument {
                title: record.record.title.clone(),
                text: self.tokens(record).join(" "),
            });
        }
        report.kept = documents.len();

        info!(
            input = report.input,
            kept = report.kept,
            duplicate = report.duplicate,
            non_article = report.non_article,
            excluded_language = report.excluded_language,
            missing_abstract = report.missing_abstract,
            "built corpus"
        );

        (documents, report)
    }
}
