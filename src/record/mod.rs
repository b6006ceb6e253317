//! Article metadata records.
//!
//! An [`ArticleRecord`] is one scraped article. `title` and `url` form the
//! crawl key and are always present; every other attribute is an explicit
//! `Option` so that "not rendered on the page" stays distinguishable from an
//! empty value.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::patterns::compile_static_regex;

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?:^|\D)(\d{4})(?:\D|$)"));

/// One scraped article, as extracted from its detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleRecord {
    /// Article title taken from the listing page.
    pub title: String,
    /// Absolute detail-page URL.
    pub url: String,
    pub author: Option<String>,
    pub organization: Option<String>,
    /// Venue (journal) name.
    pub name: Option<String>,
    /// Raw volume/issue text, e.g. `2018 Vol.10 No.2`.
    pub volno: Option<String>,
    pub year: Option<i32>,
    pub language: Option<String>,
    /// Raw keyword text, items separated by ` , `.
    pub keyword: Option<String>,
    pub kdc: Option<String>,
    pub kci: Option<String>,
    pub media: Option<String>,
    /// Raw page range text, e.g. `123-145`.
    pub page: Option<String>,
    pub citation: Option<String>,
    pub link: Option<String>,
    pub abstract_text: Option<String>,
    pub location: Option<String>,
}

impl ArticleRecord {
    /// Creates a record holding only its crawl key.
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Optional attributes of an [`ArticleRecord`] that a detail-page label can populate.
///
/// Each variant is a setter tag: [`Field::assign`] writes a value into the
/// matching attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Author,
    Organization,
    Name,
    VolNo,
    Year,
    Language,
    Keyword,
    Kdc,
    Kci,
    Media,
    Page,
    Citation,
    Link,
    Abstract,
    Location,
}

/// Outcome of assigning a value to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// The value was stored.
    Stored,
    /// The value could not be interpreted for this field; the field is unchanged.
    Rejected,
}

impl Field {
    /// All fields in raw table column order.
    pub const ALL: [Field; 15] = [
        Field::Author,
        Field::Organization,
        Field::Name,
        Field::VolNo,
        Field::Year,
        Field::Language,
        Field::Keyword,
        Field::Kdc,
        Field::Kci,
        Field::Media,
        Field::Page,
        Field::Citation,
        Field::Link,
        Field::Abstract,
        Field::Location,
    ];

    /// Column name used in raw and normalized tables.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Organization => "organization",
            Self::Name => "name",
            Self::VolNo => "volno",
            Self::Year => "year",
            Self::Language => "language",
            Self::Keyword => "keyword",
            Self::Kdc => "kdc",
            Self::Kci => "kci",
            Self::Media => "media",
            Self::Page => "page",
            Self::Citation => "citation",
            Self::Link => "link",
            Self::Abstract => "abstract",
            Self::Location => "location",
        }
    }

    /// Looks up a field by its column name.
    #[must_use]
    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.column() == column)
    }

    /// Writes `value` into the attribute this field names.
    ///
    /// `year` only accepts text containing a four-digit group; anything else
    /// is rejected and leaves the year unset.
    pub fn assign(self, record: &mut ArticleRecord, value: String) -> Assignment {
        let slot = match self {
            Self::Year => {
                return match parse_year(&value) {
                    Some(year) => {
                        record.year = Some(year);
                        Assignment::Stored
                    }
                    None => Assignment::Rejected,
                };
            }
            Self::Author => &mut record.author,
            Self::Organization => &mut record.organization,
            Self::Name => &mut record.name,
            Self::VolNo => &mut record.volno,
            Self::Language => &mut record.language,
            Self::Keyword => &mut record.keyword,
            Self::Kdc => &mut record.kdc,
            Self::Kci => &mut record.kci,
            Self::Media => &mut record.media,
            Self::Page => &mut record.page,
            Self::Citation => &mut record.citation,
            Self::Link => &mut record.link,
            Self::Abstract => &mut record.abstract_text,
            Self::Location => &mut record.location,
        };
        *slot = Some(value);
        Assignment::Stored
    }

    /// Reads the attribute as text, `None` when unset.
    #[must_use]
    pub fn get(self, record: &ArticleRecord) -> Option<String> {
        let text = match self {
            Self::Year => return record.year.map(|year| year.to_string()),
            Self::Author => &record.author,
            Self::Organization => &record.organization,
            Self::Name => &record.name,
            Self::VolNo => &record.volno,
            Self::Language => &record.language,
            Self::Keyword => &record.keyword,
            Self::Kdc => &record.kdc,
            Self::Kci => &record.kci,
            Self::Media => &record.media,
            Self::Page => &record.page,
            Self::Citation => &record.citation,
            Self::Link => &record.link,
            Self::Abstract => &record.abstract_text,
            Self::Location => &record.location,
        };
        text.clone()
    }

    /// Whether values for this field get their whitespace runs collapsed on extraction.
    #[must_use]
    pub fn collapses_whitespace(self) -> bool {
        matches!(self, Self::VolNo | Self::Keyword)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Extracts a publication year from free text (first standalone run of four digits).
#[must_use]
pub fn parse_year(text: &str) -> Option<i32> {
    YEAR_RE
        .captures(text)
        .and_then(|captures| captures.get(1))
        .and_then(|year| year.as_str().parse().ok())
}

/// Collapses every run of whitespace to a single space and trims both ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_has_only_crawl_key() {
        let record = ArticleRecord::new("Title", "http://example.com/a");
        assert_eq!(record.title, "Title");
        assert_eq!(record.url, "http://example.com/a");
        for field in Field::ALL {
            assert_eq!(field.get(&record), None, "{field} should start unset");
        }
    }

    #[test]
    fn test_assign_and_get_roundtrip_every_text_field() {
        let mut record = ArticleRecord::new("t", "u");
        for field in Field::ALL.into_iter().filter(|f| *f != Field::Year) {
            let value = format!("value-{field}");
            assert_eq!(field.assign(&mut record, value.clone()), Assignment::Stored);
            assert_eq!(field.get(&record), Some(value));
        }
    }

    #[test]
    fn test_assign_year_parses_integer() {
        let mut record = ArticleRecord::new("t", "u");
        assert_eq!(
            Field::Year.assign(&mut record, "2018".to_string()),
            Assignment::Stored
        );
        assert_eq!(record.year, Some(2018));
    }

    #[test]
    fn test_assign_year_rejects_non_numeric() {
        let mut record = ArticleRecord::new("t", "u");
        assert_eq!(
            Field::Year.assign(&mut record, "unknown".to_string()),
            Assignment::Rejected
        );
        assert_eq!(record.year, None);
    }

    #[test]
    fn test_empty_string_is_not_unset() {
        let mut record = ArticleRecord::new("t", "u");
        Field::Kdc.assign(&mut record, String::new());
        assert_eq!(record.kdc, Some(String::new()));
    }

    #[test]
    fn test_parse_year_variants() {
        assert_eq!(parse_year("2020"), Some(2020));
        assert_eq!(parse_year(" 2019년 "), Some(2019));
        assert_eq!(parse_year("12345"), None);
        assert_eq!(parse_year("Vol.10 2017"), Some(2017));
        assert_eq!(parse_year(""), None);
    }

    #[test]
    fn test_from_column_matches_column_names() {
        for field in Field::ALL {
            assert_eq!(Field::from_column(field.column()), Some(field));
        }
        assert_eq!(Field::from_column("title"), None);
    }

    #[test]
    fn test_collapse_whitespace_mixed_runs() {
        assert_eq!(
            collapse_whitespace("  2018 \n\t Vol.10\t\tNo.2 "),
            "2018 Vol.10 No.2"
        );
        assert_eq!(collapse_whitespace("   "), "");
    }
}
