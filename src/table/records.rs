//! Raw and normalized record tables.

use std::path::Path;

use csv::StringRecord;
use tracing::{debug, instrument};

use super::{Header, TableError, cell, encode_text, line_of, open_reader, open_writer, text_cell};
use crate::normalize::{CurationFlags, EmptinessAudit, NormalizedRecord};
use crate::record::{ArticleRecord, Assignment, Field};

/// Raw table columns in file order.
pub const RAW_COLUMNS: [&str; 17] = [
    "title",
    "author",
    "organization",
    "name",
    "volno",
    "year",
    "language",
    "keyword",
    "kdc",
    "kci",
    "media",
    "page",
    "citation",
    "link",
    "abstract",
    "location",
    "url",
];

const DERIVED_COLUMNS: [&str; 6] = [
    "vol",
    "no",
    "page_start",
    "page_end",
    "is_duplicated",
    "non_article",
];

fn invalid(path: &Path, row: &StringRecord, column: &str, value: &str, reason: &str) -> TableError {
    TableError::InvalidValue {
        path: path.to_path_buf(),
        line: line_of(row),
        column: column.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn raw_row(record: &ArticleRecord) -> Vec<String> {
    let mut row = Vec::with_capacity(RAW_COLUMNS.len());
    row.push(record.title.clone());
    row.extend(
        Field::ALL
            .into_iter()
            .map(|field| encode_text(field.get(record).as_deref())),
    );
    row.push(record.url.clone());
    row
}

/// Writes the raw table, one row per record.
///
/// # Errors
/// Returns [`TableError`] if the file cannot be written.
#[instrument(skip(records), fields(path = %path.display(), rows = records.len()))]
pub fn write_raw_table(path: &Path, records: &[ArticleRecord]) -> Result<(), TableError> {
    let mut writer = open_writer(path)?;
    writer
        .write_record(RAW_COLUMNS)
        .map_err(|e| TableError::csv(path, e))?;
    for record in records {
        writer
            .write_record(raw_row(record))
            .map_err(|e| TableError::csv(path, e))?;
    }
    writer.flush().map_err(|e| TableError::io(path, e))?;
    debug!("wrote raw table");
    Ok(())
}

/// Field columns present in a file, with their indexes.
fn field_columns(header: &Header) -> Vec<(Field, usize)> {
    Field::ALL
        .into_iter()
        .filter_map(|field| header.optional(field.column()).map(|index| (field, index)))
        .collect()
}

fn read_article(
    path: &Path,
    row: &StringRecord,
    title: usize,
    url: usize,
    fields: &[(Field, usize)],
) -> Result<ArticleRecord, TableError> {
    let mut record = ArticleRecord::new(
        cell(row, Some(title)).unwrap_or_default(),
        cell(row, Some(url)).unwrap_or_default(),
    );
    for &(field, index) in fields {
        let Some(value) = text_cell(row, Some(index)) else {
            continue;
        };
        if field.assign(&mut record, value.to_string()) == Assignment::Rejected {
            return Err(invalid(path, row, field.column(), value, "no four-digit year"));
        }
    }
    Ok(record)
}

/// Reads a raw table. Only `title` and `url` are required columns.
///
/// # Errors
/// Returns [`TableError`] if the file cannot be read, lacks `title` or `url`,
/// or holds a year cell without a four-digit year.
#[instrument(fields(path = %path.display()))]
pub fn read_raw_table(path: &Path) -> Result<Vec<ArticleRecord>, TableError> {
    let mut reader = open_reader(path)?;
    let header = Header::read(&mut reader, path)?;
    let title = header.required("title")?;
    let url = header.required("url")?;
    let fields = field_columns(&header);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| TableError::csv(path, e))?;
        records.push(read_article(path, &row, title, url, &fields)?);
    }
    debug!(rows = records.len(), "read raw table");
    Ok(records)
}

fn encode_list(list: Option<&Vec<String>>) -> String {
    // serializing a Vec<String> cannot fail
    list.and_then(|list| serde_json::to_string(list).ok())
        .unwrap_or_default()
}

fn encode_number(value: Option<u32>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

/// Writes the normalized table, optionally followed by `is_na_<column>` audit columns.
///
/// `author` and `keyword` hold JSON string lists.
///
/// # Errors
/// Returns [`TableError`] if the file cannot be written.
#[instrument(skip(records, audit), fields(path = %path.display(), rows = records.len()))]
pub fn write_normalized_table(
    path: &Path,
    records: &[NormalizedRecord],
    audit: Option<&EmptinessAudit>,
) -> Result<(), TableError> {
    let mut writer = open_writer(path)?;

    let mut header: Vec<String> = RAW_COLUMNS
        .iter()
        .chain(DERIVED_COLUMNS.iter())
        .map(ToString::to_string)
        .collect();
    if let Some(audit) = audit {
        header.extend(audit.columns.iter().map(|column| column.flag_column()));
    }
    writer
        .write_record(&header)
        .map_err(|e| TableError::csv(path, e))?;

    for (index, normalized) in records.iter().enumerate() {
        let mut row = raw_row(&normalized.record);
        // author is column 1 and keyword column 7 in RAW_COLUMNS
        row[1] = encode_list(normalized.authors.as_ref());
        row[7] = encode_list(Some(&normalized.keywords));
        row.extend([
            encode_number(normalized.vol),
            encode_number(normalized.no),
            encode_number(normalized.page_start),
            encode_number(normalized.page_end),
            normalized.flags.is_duplicated.to_string(),
            normalized.flags.non_article.to_string(),
        ]);
        if let Some(audit) = audit {
            row.extend(audit.row_flags(index).into_iter().map(|flag| flag.to_string()));
        }
        writer
            .write_record(&row)
            .map_err(|e| TableError::csv(path, e))?;
    }
    writer.flush().map_err(|e| TableError::io(path, e))?;
    debug!("wrote normalized table");
    Ok(())
}

fn decode_list(
    path: &Path,
    row: &StringRecord,
    column: &str,
    index: Option<usize>,
) -> Result<Option<Vec<String>>, TableError> {
    cell(row, index)
        .map(|value| {
            serde_json::from_str::<Vec<String>>(value)
                .map_err(|e| invalid(path, row, column, value, &e.to_string()))
        })
        .transpose()
}

fn decode_number(
    path: &Path,
    row: &StringRecord,
    column: &str,
    index: Option<usize>,
) -> Result<Option<u32>, TableError> {
    cell(row, index)
        .map(|value| {
            value
                .trim()
                .parse::<u32>()
                .map_err(|_| invalid(path, row, column, value, "not a non-negative integer"))
        })
        .transpose()
}

fn decode_flag(
    path: &Path,
    row: &StringRecord,
    column: &str,
    index: Option<usize>,
) -> Result<bool, TableError> {
    let Some(value) = cell(row, index) else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" | "" => Ok(false),
        _ => Err(invalid(path, row, column, value, "not a boolean")),
    }
}

/// Reads a normalized table.
///
/// The curation flag columns are optional and default to `false`, so an
/// operator can add them by hand.
///
/// # Errors
/// Returns [`TableError`] if the file cannot be read, lacks `title` or `url`,
/// or holds a cell that cannot be decoded.
#[instrument(fields(path = %path.display()))]
pub fn read_normalized_table(path: &Path) -> Result<Vec<NormalizedRecord>, TableError> {
    let mut reader = open_reader(path)?;
    let header = Header::read(&mut reader, path)?;
    let title = header.required("title")?;
    let url = header.required("url")?;
    let fields: Vec<(Field, usize)> = field_columns(&header)
        .into_iter()
        .filter(|(field, _)| !matches!(field, Field::Author | Field::Keyword))
        .collect();
    let author = header.optional("author");
    let keyword = header.optional("keyword");
    let derived: Vec<Option<usize>> = DERIVED_COLUMNS
        .iter()
        .map(|column| header.optional(column))
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| TableError::csv(path, e))?;
        records.push(NormalizedRecord {
            record: read_article(path, &row, title, url, &fields)?,
            authors: decode_list(path, &row, "author", author)?,
            keywords: decode_list(path, &row, "keyword", keyword)?.unwrap_or_default(),
            vol: decode_number(path, &row, "vol", derived[0])?,
            no: decode_number(path, &row, "no", derived[1])?,
            page_start: decode_number(path, &row, "page_start", derived[2])?,
            page_end: decode_number(path, &row, "page_end", derived[3])?,
            flags: CurationFlags {
                is_duplicated: decode_flag(path, &row, "is_duplicated", derived[4])?,
                non_article: decode_flag(path, &row, "non_article", derived[5])?,
            },
        });
    }
    debug!(rows = records.len(), "read normalized table");
    Ok(records)
}
