//! Search-result listing pages: `(title, detail URL)` pairs.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use super::ExtractError;
use super::element_text;
use crate::patterns::compile_static_selector;

static RESULT_LIST: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("div.srchResultListW"));
static RESULT_ITEM: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("div.srchResultListW > ul > li"));
static ITEM_TITLE: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("div.cont p.title"));
static TITLE_LINK: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("a[href]"));

/// One article found on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub title: String,
    /// Absolute detail-page URL.
    pub url: String,
}

impl ListingEntry {
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Extracts listing entries from a search-result page.
///
/// Relative detail links are resolved against `page_url`. Result items
/// without a title link are skipped.
///
/// # Errors
///
/// Returns [`ExtractError::MissingResultList`] if the page has no result list
/// or `page_url` is not an absolute URL.
#[instrument(skip(html), fields(page_url = %page_url))]
pub fn parse_listing(html: &str, page_url: &str) -> Result<Vec<ListingEntry>, ExtractError> {
    let base = Url::parse(page_url).map_err(|_| ExtractError::missing_result_list(page_url))?;
    let document = Html::parse_document(html);
    let list = document
        .select(&RESULT_LIST)
        .next()
        .ok_or_else(|| ExtractError::missing_result_list(page_url))?;

    let mut entries = Vec::new();
    for item in list.select(&RESULT_ITEM) {
        let Some(title) = item.select(&ITEM_TITLE).next() else {
            continue;
        };
        let Some(href) = title
            .select(&TITLE_LINK)
            .next()
            .and_then(|link| link.value().attr("href"))
        else {
            debug!(title = %element_text(title), "result item without detail link");
            continue;
        };
        match base.join(href.trim()) {
            Ok(url) => entries.push(ListingEntry::new(element_text(title), url.as_str())),
            Err(error) => debug!(href, %error, "unresolvable detail link"),
        }
    }

    debug!(entries = entries.len(), "parsed listing page");
    Ok(entries)
}
