//! Record normalization: raw field strings into structured sub-fields.
//!
//! Every transform is row-local. A pattern miss on one row leaves that row's
//! derived field unset and never affects other rows.

mod audit;

pub use audit::{AuditError, ColumnAudit, EmptinessAudit, audit_unset};

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{info, instrument};

use crate::patterns::compile_static_regex;
use crate::record::{ArticleRecord, collapse_whitespace};

/// Delimiter between keywords in the raw keyword text.
pub const KEYWORD_DELIMITER: &str = " , ";

static AUTHOR_GAP_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"[ \n\t]{2,}"));
static VOL_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"Vol\.\s*(\d+)"));
static NO_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"No\.\s*(\d+)"));
static PAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(\d+)(?:\s*-\s*(\d+))?"));

/// Flags an operator sets by hand on the normalized table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CurationFlags {
    pub is_duplicated: bool,
    pub non_article: bool,
}

/// Volume and issue numbers parsed from the raw volume/issue text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolNo {
    pub vol: Option<u32>,
    pub no: Option<u32>,
}

/// Start and end pages parsed from the raw page text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRange {
    pub start: Option<u32>,
    pub end: Option<u32>,
}

/// A record after normalization.
///
/// `record.author` and `record.keyword` are moved into [`authors`] and
/// [`keywords`] as sequences, so they are always `None` on the inner record.
/// Unset keyword text becomes an empty keyword sequence.
///
/// [`authors`]: NormalizedRecord::authors
/// [`keywords`]: NormalizedRecord::keywords
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub record: ArticleRecord,
    pub authors: Option<Vec<String>>,
    pub keywords: Vec<String>,
    pub vol: Option<u32>,
    pub no: Option<u32>,
    pub page_start: Option<u32>,
    pub page_end: Option<u32>,
    pub flags: CurationFlags,
}

impl NormalizedRecord {
    /// Keyword sequence, empty when the raw keyword text was unset or blank.
    #[must_use]
    pub fn keyword_list(&self) -> &[String] {
        &self.keywords
    }
}

/// Per-derived-field unset counts from a [`normalize_table`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeSummary {
    pub records: usize,
    pub authors_unset: usize,
    pub keywords_empty: usize,
    pub vol_unset: usize,
    pub no_unset: usize,
    pub page_start_unset: usize,
    pub page_end_unset: usize,
    pub abstract_unset: usize,
}

/// Splits raw author text into an ordered list of names.
///
/// Runs of two or more whitespace characters are layout noise in the source
/// markup and are removed; `", "` collapses to `","` before splitting.
/// Empty pieces are dropped, so a lone author or a trailing comma never
/// produces blank entries.
#[must_use]
pub fn split_authors(raw: &str) -> Vec<String> {
    let compact = AUTHOR_GAP_RE.replace_all(raw, "");
    compact
        .replace(", ", ",")
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// Parses `Vol.<n>` and `No.<n>` markers independently.
#[must_use]
pub fn parse_volno(raw: &str) -> VolNo {
    VolNo {
        vol: capture_number(&VOL_RE, raw, 1),
        no: capture_number(&NO_RE, raw, 1),
    }
}

/// Splits raw keyword text on [`KEYWORD_DELIMITER`].
///
/// Unset or blank input yields an empty sequence.
#[must_use]
pub fn split_keywords(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Vec::new();
    };
    raw.split(KEYWORD_DELIMITER)
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(String::from)
        .collect()
}

/// Parses a page range. A single page sets only `start`.
#[must_use]
pub fn parse_page(raw: &str) -> PageRange {
    PageRange {
        start: capture_number(&PAGE_RE, raw, 1),
        end: capture_number(&PAGE_RE, raw, 2),
    }
}

/// Trims and collapses whitespace runs to single spaces. Idempotent.
#[must_use]
pub fn normalize_abstract(raw: &str) -> String {
    collapse_whitespace(raw)
}

fn capture_number(re: &Regex, text: &str, group: usize) -> Option<u32> {
    re.captures(text)?.get(group)?.as_str().parse().ok()
}

/// Normalizes one record.
#[must_use]
pub fn normalize_record(mut record: ArticleRecord) -> NormalizedRecord {
    let authors = record.author.take().map(|raw| split_authors(&raw));
    let keywords = split_keywords(record.keyword.take().as_deref());
    let volno = record.volno.as_deref().map(parse_volno).unwrap_or_default();
    let page = record.page.as_deref().map(parse_page).unwrap_or_default();
    record.abstract_text = record.abstract_text.as_deref().map(normalize_abstract);

    NormalizedRecord {
        record,
        authors,
        keywords,
        vol: volno.vol,
        no: volno.no,
        page_start: page.start,
        page_end: page.end,
        flags: CurationFlags::default(),
    }
}

/// Normalizes every record and reports how many derived fields stayed unset.
#[instrument(skip(records), fields(records = records.len()))]
pub fn normalize_table(records: Vec<ArticleRecord>) -> (Vec<NormalizedRecord>, NormalizeSummary) {
    let normalized: Vec<NormalizedRecord> = records.into_iter().map(normalize_record).collect();

    let count = |unset: fn(&NormalizedRecord) -> bool| normalized.iter().filter(|r| unset(r)).count();
    let summary = NormalizeSummary {
        records: normalized.len(),
        authors_unset: count(|r| r.authors.is_none()),
        keywords_empty: count(|r| r.keywords.is_empty()),
        vol_unset: count(|r| r.vol.is_none()),
        no_unset: count(|r| r.no.is_none()),
        page_start_unset: count(|r| r.page_start.is_none()),
        page_end_unset: count(|r| r.page_end.is_none()),
        abstract_unset: count(|r| r.record.abstract_text.is_none()),
    };

    info!(
        records = summary.records,
        authors_unset = summary.authors_unset,
        keywords_empty = summary.keywords_empty,
        vol_unset = summary.vol_unset,
        no_unset = summary.no_unset,
        page_start_unset = summary.page_start_unset,
        page_end_unset = summary.page_end_unset,
        abstract_unset = summary.abstract_unset,
        "normalized records"
    );

    (normalized, summary)
}
