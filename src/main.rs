//! CLI entry point for journal-miner.

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::Parser;
use journal_miner::config::{Settings, load_config};
use tracing::{debug, info};

mod cli;
mod commands;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    debug!(?cli, "CLI arguments parsed");

    let loaded = load_config(cli.config.as_deref())?;
    if let Some(path) = loaded.config.as_ref().and(loaded.path.as_ref()) {
        info!(path = %path.display(), "Loaded config file");
    }
    let settings =
        Settings::from_file(loaded.config.as_ref()).with_overrides(cli.rate_limit, cli.max_retries);
    debug!(?settings, "Resolved settings");

    match &cli.command {
        Command::Listing(args) => commands::run_listing_command(args, &settings).await,
        Command::Crawl(args) => commands::run_crawl_command(args, &settings).await,
        Command::Normalize(args) => commands::run_normalize_command(args),
        Command::Keywords(args) => commands::run_keywords_command(args, &settings),
        Command::Corpus(args) => commands::run_corpus_command(args, &settings),
        Command::Summary(args) => commands::run_summary_command(args),
    }
}
