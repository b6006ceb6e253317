//! CSV and text file I/O for every pipeline stage.
//!
//! Tables are UTF-8 CSV with a header row. Columns are located by header
//! name, so extra columns (audit flags, hand-added notes) are tolerated on
//! read. An unset value is written as an empty cell and an empty cell reads
//! back as unset. An empty string is written as [`EMPTY_TEXT_CELL`] so the two
//! stay distinct across stages.

mod error;
mod records;

pub use error::TableError;
pub use records::{
    RAW_COLUMNS, read_normalized_table, read_raw_table, write_normalized_table, write_raw_table,
};

use std::collections::HashMap;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::StringRecord;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::analysis::LabeledMatrix;
use crate::corpus::CorpusDocument;
use crate::extract::ListingEntry;

pub(crate) fn open_reader(path: &Path) -> Result<csv::Reader<File>, TableError> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| TableError::csv(path, e))
}

pub(crate) fn open_writer(path: &Path) -> Result<csv::Writer<File>, TableError> {
    csv::WriterBuilder::new()
        .from_path(path)
        .map_err(|e| TableError::csv(path, e))
}

/// Header-name to column-index lookup for one file.
pub(crate) struct Header {
    path: PathBuf,
    index: HashMap<String, usize>,
}

impl Header {
    pub(crate) fn read(reader: &mut csv::Reader<File>, path: &Path) -> Result<Self, TableError> {
        let headers = reader.headers().map_err(|e| TableError::csv(path, e))?;
        let mut index = HashMap::with_capacity(headers.len());
        for (position, name) in headers.iter().enumerate() {
            // a UTF-8 BOM sticks to the first header
            let name = name.trim_start_matches('\u{feff}').trim();
            index.entry(name.to_string()).or_insert(position);
        }
        Ok(Self {
            path: path.to_path_buf(),
            index,
        })
    }

    pub(crate) fn required(&self, column: &str) -> Result<usize, TableError> {
        self.index
            .get(column)
            .copied()
            .ok_or_else(|| TableError::missing_column(&self.path, column))
    }

    pub(crate) fn optional(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }
}

/// Cell text, `None` when the column is absent or the cell is empty.
pub(crate) fn cell(record: &StringRecord, index: Option<usize>) -> Option<&str> {
    index
        .and_then(|index| record.get(index))
        .filter(|value| !value.is_empty())
}

/// Cell text standing for an empty string value.
///
/// Text made only of `"` characters is written with two extra `"` and read
/// back with two removed, so no real value collides with the marker.
pub const EMPTY_TEXT_CELL: &str = "\"\"";

pub(crate) fn encode_text(value: Option<&str>) -> String {
    match value {
        None => String::new(),
        Some(text) if text.chars().all(|c| c == '"') => format!("{EMPTY_TEXT_CELL}{text}"),
        Some(text) => text.to_string(),
    }
}

/// Decoded text cell: `None` when unset, `Some("")` for [`EMPTY_TEXT_CELL`].
pub(crate) fn text_cell(record: &StringRecord, index: Option<usize>) -> Option<&str> {
    let value = cell(record, index)?;
    if value.len() >= EMPTY_TEXT_CELL.len() && value.chars().all(|c| c == '"') {
        Some(&value[EMPTY_TEXT_CELL.len()..])
    } else {
        Some(value)
    }
}

pub(crate) fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, csv::Position::line)
}

/// Writes a `title,url` listing table.
///
/// # Errors
/// Returns [`TableError`] if the file cannot be written.
#[instrument(skip(entries), fields(path = %path.display(), rows = entries.len()))]
pub fn write_listing(path: &Path, entries: &[ListingEntry]) -> Result<(), TableError> {
    let mut writer = open_writer(path)?;
    writer
        .write_record(["title", "url"])
        .map_err(|e| TableError::csv(path, e))?;
    for entry in entries {
        writer
            .write_record([entry.title.as_str(), entry.url.as_str()])
            .map_err(|e| TableError::csv(path, e))?;
    }
    writer.flush().map_err(|e| TableError::io(path, e))?;
    debug!("wrote listing table");
    Ok(())
}

/// Reads a `title,url` listing table.
///
/// Rows with an empty URL are skipped.
///
/// # Errors
/// Returns [`TableError`] if the file cannot be read or lacks either column.
#[instrument(fields(path = %path.display()))]
pub fn read_listing(path: &Path) -> Result<Vec<ListingEntry>, TableError> {
    let mut reader = open_reader(path)?;
    let header = Header::read(&mut reader, path)?;
    let title = header.required("title")?;
    let url = header.required("url")?;

    let mut entries = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| TableError::csv(path, e))?;
        let Some(entry_url) = cell(&row, Some(url)) else {
            debug!(line = line_of(&row), "listing row without URL, skipping");
            continue;
        };
        entries.push(ListingEntry::new(
            cell(&row, Some(title)).unwrap_or_default(),
            entry_url,
        ));
    }
    Ok(entries)
}

/// Writes `token,count` rows in the given order.
///
/// # Errors
/// Returns [`TableError`] if the file cannot be written.
#[instrument(skip(ranked), fields(path = %path.display(), rows = ranked.len()))]
pub fn write_frequency(path: &Path, ranked: &[(&str, usize)]) -> Result<(), TableError> {
    let mut writer = open_writer(path)?;
    writer
        .write_record(["token", "count"])
        .map_err(|e| TableError::csv(path, e))?;
    for (token, count) in ranked {
        let count = count.to_string();
        writer
            .write_record([*token, count.as_str()])
            .map_err(|e| TableError::csv(path, e))?;
    }
    writer.flush().map_err(|e| TableError::io(path, e))
}

/// Writes a labeled matrix: an empty top-left cell, column labels, then one row per row label.
///
/// # Errors
/// Returns [`TableError`] if the file cannot be written.
#[instrument(skip(matrix), fields(path = %path.display()))]
pub fn write_matrix<R, C>(path: &Path, matrix: &LabeledMatrix<R, C>) -> Result<(), TableError>
where
    R: Clone + Eq + std::hash::Hash + Display,
    C: Clone + Eq + std::hash::Hash + Display,
{
    let mut writer = open_writer(path)?;
    let header: Vec<String> = std::iter::once(String::new())
        .chain(matrix.column_labels().iter().map(ToString::to_string))
        .collect();
    writer
        .write_record(&header)
        .map_err(|e| TableError::csv(path, e))?;
    for (label, cells) in matrix.iter_rows() {
        let row: Vec<String> = std::iter::once(label.to_string())
            .chain(cells.iter().map(ToString::to_string))
            .collect();
        writer
            .write_record(&row)
            .map_err(|e| TableError::csv(path, e))?;
    }
    writer.flush().map_err(|e| TableError::io(path, e))
}

/// Writes one document per line.
///
/// # Errors
/// Returns [`TableError`] if the file cannot be written.
#[instrument(skip(documents), fields(path = %path.display(), documents = documents.len()))]
pub fn write_corpus(path: &Path, documents: &[CorpusDocument]) -> Result<(), TableError> {
    let file = File::create(path).map_err(|e| TableError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for document in documents {
        let line = document.text.replace(['\n', '\r'], " ");
        writeln!(writer, "{line}").map_err(|e| TableError::io(path, e))?;
    }
    writer.flush().map_err(|e| TableError::io(path, e))
}

/// Writes a serializable report as pretty JSON.
///
/// # Errors
/// Returns [`TableError`] if encoding or writing fails.
pub fn write_json_report<T: Serialize>(path: &Path, report: &T) -> Result<(), TableError> {
    let json = serde_json::to_string_pretty(report).map_err(|source| TableError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json + "\n").map_err(|e| TableError::io(path, e))
}
