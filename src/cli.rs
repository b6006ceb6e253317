//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use journal_miner::analysis::TokenSource;

/// Scrape, clean and mine journal-article metadata.
///
/// Each subcommand runs one pipeline stage and reads or writes CSV tables,
/// so stages can be re-run independently.
#[derive(Parser, Debug)]
#[command(name = "journal-miner")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (defaults to $XDG_CONFIG_HOME/journal-miner/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Minimum delay between requests to the same host in milliseconds (0 to disable, max 60000)
    #[arg(short = 'l', long, global = true, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub rate_limit: Option<u64>,

    /// Maximum retry attempts for transient failures (0-10)
    #[arg(short = 'r', long, global = true, value_parser = clap::value_parser!(u32).range(0..=10))]
    pub max_retries: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crawl search-result pages into a title,url listing table
    Listing(ListingArgs),
    /// Fetch every detail page of a listing and extract raw records
    Crawl(CrawlArgs),
    /// Clean a raw table into a normalized table
    Normalize(NormalizeArgs),
    /// Count tokens and build cooccurrence and per-year matrices
    Keywords(KeywordsArgs),
    /// Build a filtered text corpus, one document per line
    Corpus(CorpusArgs),
    /// Print year and language distributions
    Summary(SummaryArgs),
}

#[derive(Args, Debug)]
pub struct ListingArgs {
    /// Result-page URL with a `{page}` placeholder, relative to the configured base URL or absolute
    #[arg(long, requires_all = ["first", "last"], conflicts_with = "page_url")]
    pub url_template: Option<String>,

    /// First page number substituted into the template
    #[arg(long)]
    pub first: Option<u32>,

    /// Last page number substituted into the template (inclusive)
    #[arg(long)]
    pub last: Option<u32>,

    /// Explicit result-page URL (repeatable)
    #[arg(long = "page-url", required_unless_present = "url_template")]
    pub page_url: Vec<String>,

    /// Output listing table
    #[arg(short, long, default_value = "listing.csv")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Listing table with title and url columns
    #[arg(short, long, default_value = "listing.csv")]
    pub input: PathBuf,

    /// Output raw table
    #[arg(short, long, default_value = "raw.csv")]
    pub output: PathBuf,

    /// Write the batch report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Raw table
    #[arg(short, long, default_value = "raw.csv")]
    pub input: PathBuf,

    /// Output normalized table
    #[arg(short, long, default_value = "normalized.csv")]
    pub output: PathBuf,

    /// Columns to audit for unset values; adds is_na_<column> flags (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub audit: Vec<String>,
}

#[derive(Args, Debug)]
pub struct KeywordsArgs {
    /// Normalized table
    #[arg(short, long, default_value = "normalized.csv")]
    pub input: PathBuf,

    /// Where the top-N vocabulary comes from (keywords or nouns)
    #[arg(long, default_value_t = TokenSource::Keywords)]
    pub vocabulary: TokenSource,

    /// Which token lists are counted (keywords or nouns)
    #[arg(long, default_value_t = TokenSource::Keywords)]
    pub occurrence: TokenSource,

    /// Number of tokens selected for matrices (overrides config)
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..=10000))]
    pub top_n: Option<u64>,

    /// Output directory for frequency.csv, cooccurrence.csv and yearly.csv
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Extra stop words, one per line (overrides config)
    #[arg(long)]
    pub stop_words: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CorpusArgs {
    /// Normalized table
    #[arg(short, long, default_value = "normalized.csv")]
    pub input: PathBuf,

    /// Output corpus file
    #[arg(short, long, default_value = "corpus.txt")]
    pub output: PathBuf,

    /// Document source (keywords or nouns)
    #[arg(long, default_value_t = TokenSource::AbstractNouns)]
    pub source: TokenSource,

    /// Language to drop (repeatable, adds to the configured list)
    #[arg(long = "exclude-language")]
    pub exclude_language: Vec<String>,

    /// Write the drop report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Extra stop words, one per line (overrides config)
    #[arg(long)]
    pub stop_words: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Normalized table
    #[arg(short, long, default_value = "normalized.csv")]
    pub input: PathBuf,
}
