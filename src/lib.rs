//! journal-miner core library
//!
//! Scrapes article metadata from an academic search portal, cleans it into
//! typed records, and mines keyword statistics and text corpora from the
//! result.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`crawl`] - Rate-limited, retrying page acquisition
//! - [`extract`] - HTML listing and detail-page field extraction
//! - [`record`] - The article record and its field setter table
//! - [`normalize`] - Author, volume/issue, page and keyword cleaning
//! - [`analysis`] - Token frequency, cooccurrence and per-year matrices
//! - [`corpus`] - Filtered document sets for topic modeling
//! - [`table`] - CSV and text I/O between pipeline stages
//! - [`config`] - Config file loading and setting resolution

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analysis;
pub mod config;
pub mod corpus;
pub mod crawl;
pub mod extract;
pub mod normalize;
mod patterns;
pub mod record;
pub mod table;
mod user_agent;

// Re-export commonly used types
pub use analysis::{NounTagger, StopWordTagger, TokenAnalysis, TokenSource, analyze};
pub use corpus::{CorpusBuilder, CorpusDocument, CorpusFilter, DropReport};
pub use crawl::{
    BatchReport, CrawlEngine, CrawlError, FetchError, PageClient, PageSource, RateLimiter,
    RetryPolicy,
};
pub use extract::{ExtractError, FieldDefaults, ListingEntry, extract_article, parse_listing};
pub use normalize::{NormalizedRecord, audit_unset, normalize_record, normalize_table};
pub use record::{ArticleRecord, Field};
pub use table::TableError;
