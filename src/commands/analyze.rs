//! Offline stages over CSV tables: normalize, keywords, corpus and summary.

use std::fs;

use anyhow::{Context, Result};
use journal_miner::analysis::{analyze, count_by_language, count_by_year};
use journal_miner::config::Settings;
use journal_miner::corpus::CorpusBuilder;
use journal_miner::normalize::{audit_unset, normalize_table};
use journal_miner::table::{
    read_normalized_table, read_raw_table, write_corpus, write_frequency, write_json_report,
    write_matrix, write_normalized_table,
};
use tracing::info;

use super::build_tagger;
use crate::cli::{CorpusArgs, KeywordsArgs, NormalizeArgs, SummaryArgs};

pub fn run_normalize_command(args: &NormalizeArgs) -> Result<()> {
    let raw = read_raw_table(&args.input)?;
    let (records, summary) = normalize_table(raw);

    let audit = if args.audit.is_empty() {
        None
    } else {
        let columns: Vec<&str> = args.audit.iter().map(|column| column.trim()).collect();
        let audit = audit_unset(&records, &columns)?;
        for column in &audit.columns {
            info!(column = %column.column, unset = column.unset, rows = audit.rows, "Unset values");
        }
        Some(audit)
    };
    write_normalized_table(&args.output, &records, audit.as_ref())?;

    info!(
        records_in = summary.records,
        records_out = records.len(),
        authors_unset = summary.authors_unset,
        keywords_empty = summary.keywords_empty,
        abstract_unset = summary.abstract_unset,
        output = %args.output.display(),
        "Normalize complete"
    );
    Ok(())
}

pub fn run_keywords_command(args: &KeywordsArgs, settings: &Settings) -> Result<()> {
    let records = read_normalized_table(&args.input)?;
    let tagger = build_tagger(args.stop_words.as_deref(), settings)?;
    let top_n = match args.top_n {
        Some(top_n) => usize::try_from(top_n).context("--top-n out of range")?,
        None => settings.top_n,
    };

    let analysis = analyze(&records, args.vocabulary, args.occurrence, top_n, &tagger);

    fs::create_dir_all(&args.out_dir).with_context(|| {
        format!("Failed to create output directory '{}'", args.out_dir.display())
    })?;
    write_frequency(&args.out_dir.join("frequency.csv"), &analysis.frequency.ranked())?;
    write_matrix(
        &args.out_dir.join("cooccurrence.csv"),
        analysis.cooccurrence.matrix(),
    )?;
    write_matrix(&args.out_dir.join("yearly.csv"), analysis.yearly.matrix())?;

    info!(
        records_in = records.len(),
        vocabulary = %args.vocabulary,
        occurrence = %args.occurrence,
        distinct_tokens = analysis.frequency.len(),
        selected = analysis.top.len(),
        out_dir = %args.out_dir.display(),
        "Keyword analysis complete"
    );
    Ok(())
}

pub fn run_corpus_command(args: &CorpusArgs, settings: &Settings) -> Result<()> {
    let records = read_normalized_table(&args.input)?;
    let tagger = build_tagger(args.stop_words.as_deref(), settings)?;
    let mut filter = settings.corpus_filter();
    filter
        .excluded_languages
        .extend(args.exclude_language.iter().cloned());

    let (documents, report) = CorpusBuilder::new(filter, args.source, &tagger).build(&records);
    write_corpus(&args.output, &documents)?;
    if let Some(report_path) = &args.report {
        write_json_report(report_path, &report)?;
    }

    info!(
        records_in = report.input,
        records_out = report.kept,
        dropped = report.dropped(),
        duplicate = report.duplicate,
        non_article = report.non_article,
        excluded_language = report.excluded_language,
        missing_abstract = report.missing_abstract,
        output = %args.output.display(),
        "Corpus complete"
    );
    Ok(())
}

pub fn run_summary_command(args: &SummaryArgs) -> Result<()> {
    let records = read_normalized_table(&args.input)?;
    let years = count_by_year(&records);
    let languages = count_by_language(&records);

    println!("Records: {}", records.len());
    println!();
    println!("By year:");
    for (year, count) in &years.by_year {
        println!("  {year}  {count}");
    }
    if years.unknown > 0 {
        println!("  unknown  {}", years.unknown);
    }
    println!();
    println!("By language:");
    for (language, count) in &languages {
        let label = if language.is_empty() { "unknown" } else { language };
        println!("  {label}  {count}");
    }
    Ok(())
}
