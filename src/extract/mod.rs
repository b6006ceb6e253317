//! Field extraction from portal HTML pages.
//!
//! [`extract_article`] turns one article detail page into an
//! [`ArticleRecord`]. The page carries a detail panel of label/value pairs;
//! each label is looked up in the [`FIELD_LABELS`] table and the trimmed value
//! is written to the matching attribute. Labels missing from the table are
//! reported back to the caller rather than dropped.
//!
//! [`parse_listing`] extracts `(title, detail URL)` pairs from a search-result
//! listing page, which is how the list of pages to extract is built.

mod error;
mod labels;
mod listing;

pub use error::ExtractError;
pub use labels::{FIELD_LABELS, lookup_label};
pub use listing::{ListingEntry, parse_listing};

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};

use crate::patterns::compile_static_selector;
use crate::record::{ArticleRecord, Assignment, Field, collapse_whitespace};

/// Heading of the secondary panel that holds the abstract.
pub const ADDITIONAL_INFO_HEADING: &str = "부가정보";

/// Title of the abstract block inside the additional-info panel.
pub const ABSTRACT_TITLE: &str = "국문 초록 (Abstract)";

static DETAIL_PANEL: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("div.infoDetailL"));
// Direct items of the panel's list only; values may hold lists of their own.
static DETAIL_ITEM: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("div.infoDetailL > ul > li"));
static ITEM_LABEL: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("span.strong"));
static ITEM_VALUE: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("div"));
static INNER_PANEL: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("div.innerCont"));
static PANEL_HEADING: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("h3.tit"));
static PANEL_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("div.content > div"));
static BLOCK_TITLE: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("p.title"));
static BLOCK_TEXT: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("div.text"));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("p"));

/// Values applied before page content, for attributes some pages never render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDefaults {
    pub organization: Option<String>,
    pub name: Option<String>,
    pub media: Option<String>,
}

impl FieldDefaults {
    fn apply(&self, record: &mut ArticleRecord) {
        record.organization.clone_from(&self.organization);
        record.name.clone_from(&self.name);
        record.media.clone_from(&self.media);
    }
}

/// A successfully extracted record plus the labels the table did not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub record: ArticleRecord,
    /// Labels seen on the page with no entry in [`FIELD_LABELS`], in page order.
    pub unknown_labels: Vec<String>,
}

/// Extracts one article record from its detail page.
///
/// `title` and `url` come from the listing entry and form the crawl key.
///
/// # Errors
///
/// Returns [`ExtractError::MissingDetailPanel`] if the page has no detail
/// panel. Absent labels and an absent abstract are not errors; those
/// attributes stay unset.
#[instrument(skip(html, title, defaults), fields(url = %url))]
pub fn extract_article(
    html: &str,
    title: &str,
    url: &str,
    defaults: &FieldDefaults,
) -> Result<Extraction, ExtractError> {
    let document = Html::parse_document(html);
    let panel = document
        .select(&DETAIL_PANEL)
        .next()
        .ok_or_else(|| ExtractError::missing_detail_panel(url))?;

    let mut record = ArticleRecord::new(title.trim(), url);
    defaults.apply(&mut record);
    let mut unknown_labels = Vec::new();

    for item in panel.select(&DETAIL_ITEM) {
        let (Some(label), Some(value)) = (
            item.select(&ITEM_LABEL).next(),
            item.select(&ITEM_VALUE).next(),
        ) else {
            debug!("detail item without label/value pair, skipping");
            continue;
        };
        let label = element_text(label);
        let value = element_text(value);

        let Some(field) = lookup_label(&label) else {
            warn!(label = %label, "unknown detail label");
            unknown_labels.push(label);
            continue;
        };

        let value = if field.collapses_whitespace() {
            collapse_whitespace(&value)
        } else {
            value
        };
        if field.assign(&mut record, value) == Assignment::Rejected {
            warn!(label = %label, field = %field, "value rejected, field left unset");
        }
    }

    record.abstract_text = find_abstract(&document);

    let missing: Vec<&str> = Field::ALL
        .into_iter()
        .filter(|field| field.get(&record).is_none())
        .map(Field::column)
        .collect();
    if !missing.is_empty() {
        debug!(missing = ?missing, "fields not rendered on page");
    }

    Ok(Extraction {
        record,
        unknown_labels,
    })
}

/// Locates the abstract in the additional-info panel.
fn find_abstract(document: &Html) -> Option<String> {
    let panel = document.select(&INNER_PANEL).find(|panel| {
        panel
            .select(&PANEL_HEADING)
            .next()
            .is_some_and(|heading| element_text(heading) == ADDITIONAL_INFO_HEADING)
    })?;

    let block = panel.select(&PANEL_BLOCK).find(|block| {
        block
            .select(&BLOCK_TITLE)
            .next()
            .is_some_and(|title| element_text(title) == ABSTRACT_TITLE)
    })?;

    // The first text container holds the block's own toolbar; the second one the abstract.
    let text = block.select(&BLOCK_TEXT).nth(1)?;
    let paragraph = text.select(&PARAGRAPH).next()?;
    Some(element_text(paragraph))
}

/// Concatenated, trimmed text content of an element.
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn detail_item(label: &str, value: &str) -> String {
        format!(r#"<li><span class="strong">{label}</span><div><p>{value}</p></div></li>"#)
    }

    fn detail_page(items: &[String], abstract_html: &str) -> String {
        format!(
            r#"<html><body><div id="soptionview"><div><div class="thesisInfo">
            <div class="infoDetail"><div class="infoDetailL"><ul>{}</ul></div></div>
            </div></div></div>{abstract_html}</body></html>"#,
            items.concat()
        )
    }

    fn abstract_panel(text: &str) -> String {
        format!(
            r#"<div class="innerCont"><h3 class="tit"> 부가정보 </h3><div class="content">
              <div><p class="title">다국어 초록 (Multilingual Abstract)</p>
                <div class="text"></div><div class="text"><p>English text</p></div></div>
              <div><p class="title">국문 초록 (Abstract)</p>
                <div class="text"><a>번역하기</a></div><div class="text"><p>{text}</p></div></div>
            </div></div>"#
        )
    }

    #[test]
    fn test_extract_full_page() {
        let items = vec![
            detail_item("저자", "홍길동, 김철수"),
            detail_item("발행기관", "한국음악치료학회"),
            detail_item("학술지명", "한국음악치료학회지"),
            detail_item("권호사항", "2018\n\t Vol.10\n No.2"),
            detail_item("발행연도", "2018"),
            detail_item("작성언어", "Korean"),
            detail_item("주제어", "음악치료 ,\n  자폐"),
            detail_item("KDC", "670"),
            detail_item("등재정보", "KCI등재"),
            detail_item("자료형태", "학술저널"),
            detail_item("수록면", "1-23"),
            detail_item("KCI 피인용횟수", "3"),
            detail_item("제공처", "KCI"),
            detail_item("소장기관", "서울대학교"),
        ];
        let html = detail_page(&items, &abstract_panel("  본 연구는 음악치료의 효과를 살펴보았다. "));

        let extraction =
            extract_article(&html, " 제목 ", "http://www.riss.kr/a/1", &FieldDefaults::default())
                .unwrap();
        let record = extraction.record;

        assert!(extraction.unknown_labels.is_empty());
        assert_eq!(record.title, "제목");
        assert_eq!(record.url, "http://www.riss.kr/a/1");
        assert_eq!(record.author.as_deref(), Some("홍길동, 김철수"));
        assert_eq!(record.volno.as_deref(), Some("2018 Vol.10 No.2"));
        assert_eq!(record.year, Some(2018));
        assert_eq!(record.keyword.as_deref(), Some("음악치료 , 자폐"));
        assert_eq!(record.page.as_deref(), Some("1-23"));
        assert_eq!(record.citation.as_deref(), Some("3"));
        assert_eq!(record.location.as_deref(), Some("서울대학교"));
        assert_eq!(
            record.abstract_text.as_deref(),
            Some("본 연구는 음악치료의 효과를 살펴보았다.")
        );
    }

    #[test]
    fn test_unknown_label_is_reported_and_others_extracted() {
        let items = vec![
            detail_item("저자", "홍길동"),
            detail_item("DOI", "10.1234/x"),
            detail_item("수록면", "77"),
        ];
        let html = detail_page(&items, "");

        let extraction =
            extract_article(&html, "t", "u", &FieldDefaults::default()).unwrap();

        assert_eq!(extraction.unknown_labels, vec!["DOI".to_string()]);
        assert_eq!(extraction.record.author.as_deref(), Some("홍길동"));
        assert_eq!(extraction.record.page.as_deref(), Some("77"));
    }

    #[test]
    fn test_list_inside_value_is_not_read_as_items() {
        let items = vec![
            detail_item(
                "소장기관",
                r#"<ul><li><span class="strong">중앙도서관</span><div>3층</div></li></ul>"#,
            ),
            detail_item("발행연도", "2018"),
        ];
        let html = detail_page(&items, "");

        let extraction = extract_article(&html, "t", "u", &FieldDefaults::default()).unwrap();

        assert!(extraction.unknown_labels.is_empty());
        assert_eq!(extraction.record.location.as_deref(), Some("중앙도서관3층"));
        assert_eq!(extraction.record.year, Some(2018));
    }

    #[test]
    fn test_absent_labels_stay_unset() {
        let html = detail_page(&[detail_item("저자", "홍길동")], "");
        let record = extract_article(&html, "t", "u", &FieldDefaults::default())
            .unwrap()
            .record;

        assert_eq!(record.keyword, None);
        assert_eq!(record.year, None);
        assert_eq!(record.abstract_text, None);
    }

    #[test]
    fn test_missing_detail_panel_is_error() {
        let html = "<html><body><p>Service temporarily unavailable</p></body></html>";
        let result = extract_article(html, "t", "http://x/1", &FieldDefaults::default());
        assert_eq!(
            result,
            Err(ExtractError::missing_detail_panel("http://x/1"))
        );
    }

    #[test]
    fn test_defaults_applied_and_overridden_by_page() {
        let defaults = FieldDefaults {
            organization: Some("기본기관".to_string()),
            name: Some("기본학술지".to_string()),
            media: Some("학술저널".to_string()),
        };
        let html = detail_page(&[detail_item("발행기관", "다른기관")], "");
        let record = extract_article(&html, "t", "u", &defaults).unwrap().record;

        assert_eq!(record.organization.as_deref(), Some("다른기관"));
        assert_eq!(record.name.as_deref(), Some("기본학술지"));
        assert_eq!(record.media.as_deref(), Some("학술저널"));
    }

    #[test]
    fn test_abstract_unset_without_heading() {
        let panel = abstract_panel("text").replace("부가정보", "기타정보");
        let html = detail_page(&[detail_item("저자", "a")], &panel);
        let record = extract_article(&html, "t", "u", &FieldDefaults::default())
            .unwrap()
            .record;
        assert_eq!(record.abstract_text, None);
    }

    #[test]
    fn test_abstract_unset_without_second_text_block() {
        let panel = r#"<div class="innerCont"><h3 class="tit">부가정보</h3><div class="content">
            <div><p class="title">국문 초록 (Abstract)</p><div class="text"><p>only</p></div></div>
            </div></div>"#;
        let html = detail_page(&[detail_item("저자", "a")], panel);
        let record = extract_article(&html, "t", "u", &FieldDefaults::default())
            .unwrap()
            .record;
        assert_eq!(record.abstract_text, None);
    }

    #[test]
    fn test_non_numeric_year_left_unset() {
        let html = detail_page(&[detail_item("발행연도", "미상")], "");
        let record = extract_article(&html, "t", "u", &FieldDefaults::default())
            .unwrap()
            .record;
        assert_eq!(record.year, None);
    }
}
