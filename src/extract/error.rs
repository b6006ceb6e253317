//! Error types for page extraction.

use thiserror::Error;

/// Errors that make a single page unusable.
///
/// These are per-page failures: a batch caller counts and skips them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The detail panel holding the label/value list is absent.
    #[error("detail panel missing on page {url}")]
    MissingDetailPanel {
        /// Page the record was being extracted from.
        url: String,
    },

    /// The listing page has no search-result list.
    #[error("result list missing on listing page {url}")]
    MissingResultList {
        /// Listing page URL.
        url: String,
    },
}

impl ExtractError {
    /// Creates a `MissingDetailPanel` error.
    #[must_use]
    pub fn missing_detail_panel(url: impl Into<String>) -> Self {
        Self::MissingDetailPanel { url: url.into() }
    }

    /// Creates a `MissingResultList` error.
    #[must_use]
    pub fn missing_result_list(url: impl Into<String>) -> Self {
        Self::MissingResultList { url: url.into() }
    }
}
