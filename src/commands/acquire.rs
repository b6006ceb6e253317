//! Listing and crawl stages: the only stages that touch the network.

use std::io::{self, IsTerminal};

use anyhow::{Context, Result, bail};
use journal_miner::config::Settings;
use journal_miner::crawl::{PageClient, expand_listing_template};
use journal_miner::table::{read_listing, write_json_report, write_listing, write_raw_table};
use tracing::{info, warn};
use url::Url;

use super::build_engine;
use crate::cli::{CrawlArgs, ListingArgs};

pub async fn run_listing_command(args: &ListingArgs, settings: &Settings) -> Result<()> {
    let page_urls = resolve_page_urls(args, &settings.base_url)?;
    let client = PageClient::with_timeouts(settings.connect_timeout_secs, settings.read_timeout_secs)
        .context("Failed to build HTTP client")?;
    let engine = build_engine(&client, settings);

    let crawl = engine.crawl_listing(&page_urls).await?;
    write_listing(&args.output, &crawl.entries)?;

    info!(
        pages = crawl.pages,
        entries = crawl.entries.len(),
        duplicates = crawl.duplicates,
        output = %args.output.display(),
        "Listing complete"
    );
    Ok(())
}

pub async fn run_crawl_command(args: &CrawlArgs, settings: &Settings) -> Result<()> {
    let entries = read_listing(&args.input)?;
    if entries.is_empty() {
        info!(input = %args.input.display(), "Listing is empty, nothing to crawl");
        write_raw_table(&args.output, &[])?;
        return Ok(());
    }

    let client = PageClient::with_timeouts(settings.connect_timeout_secs, settings.read_timeout_secs)
        .context("Failed to build HTTP client")?;
    let show_progress = !args.no_progress && io::stderr().is_terminal();
    let engine = build_engine(&client, settings).with_progress(show_progress);

    let (records, report) = engine
        .crawl_articles(&entries, &settings.field_defaults)
        .await;
    write_raw_table(&args.output, &records)?;
    if let Some(report_path) = &args.report {
        write_json_report(report_path, &report)?;
    }

    for (label, pages) in &report.unknown_labels {
        warn!(label = %label, pages, "Unrecognized field label");
    }
    info!(
        records_in = report.attempted,
        records_out = report.extracted,
        failed = report.failed(),
        retried = report.retried,
        output = %args.output.display(),
        "Crawl complete"
    );
    Ok(())
}

/// Expands the template or takes explicit URLs, resolving relative ones against `base_url`.
fn resolve_page_urls(args: &ListingArgs, base_url: &str) -> Result<Vec<String>> {
    let raw = match (&args.url_template, args.first, args.last) {
        (Some(template), Some(first), Some(last)) => {
            expand_listing_template(template, first, last)?
        }
        (Some(_), _, _) => bail!("--url-template needs both --first and --last"),
        (None, _, _) => args.page_url.clone(),
    };
    if raw.is_empty() {
        bail!("No result pages given");
    }

    let base = Url::parse(base_url).with_context(|| format!("Invalid base URL '{base_url}'"))?;
    raw.iter()
        .map(|page| {
            base.join(page)
                .map(String::from)
                .with_context(|| format!("Invalid result-page URL '{page}'"))
        })
        .collect()
}
