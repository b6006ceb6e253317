//! Emptiness audit over normalized records.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use super::NormalizedRecord;
use crate::record::Field;

/// Errors from [`audit_unset`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditError {
    #[error("cannot audit unknown column '{column}'")]
    UnknownColumn { column: String },
}

/// Unset accounting for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnAudit {
    pub column: String,
    pub unset: usize,
    /// One flag per audited row, `true` when that row's value is unset.
    #[serde(skip)]
    pub flags: Vec<bool>,
}

impl ColumnAudit {
    /// Name of the per-row flag column written to tables.
    #[must_use]
    pub fn flag_column(&self) -> String {
        format!("is_na_{}", self.column)
    }
}

/// Result of auditing a set of columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmptinessAudit {
    pub rows: usize,
    pub columns: Vec<ColumnAudit>,
}

impl EmptinessAudit {
    /// Flags for `row` in column order.
    #[must_use]
    pub fn row_flags(&self, row: usize) -> Vec<bool> {
        self.columns
            .iter()
            .map(|column| column.flags.get(row).copied().unwrap_or(false))
            .collect()
    }
}

impl NormalizedRecord {
    /// Whether the named normalized-table column is unset for this record.
    ///
    /// Returns `None` for a column name the normalized table does not have.
    #[must_use]
    pub fn is_unset(&self, column: &str) -> Option<bool> {
        let unset = match column {
            "title" | "url" => false,
            "author" => self.authors.is_none(),
            "keyword" => self.keywords.is_empty(),
            "vol" => self.vol.is_none(),
            "no" => self.no.is_none(),
            "page_start" => self.page_start.is_none(),
            "page_end" => self.page_end.is_none(),
            other => Field::from_column(other)?.get(&self.record).is_none(),
        };
        Some(unset)
    }
}

/// Counts unset values per column and records a per-row flag.
///
/// The audited records are only read.
///
/// # Errors
///
/// Returns [`AuditError::UnknownColumn`] if a requested column is not part of
/// the normalized table.
#[instrument(skip(records), fields(rows = records.len()))]
pub fn audit_unset(
    records: &[NormalizedRecord],
    columns: &[&str],
) -> Result<EmptinessAudit, AuditError> {
    let blank = NormalizedRecord::default();
    if let Some(column) = columns.iter().find(|column| blank.is_unset(column).is_none()) {
        return Err(AuditError::UnknownColumn {
            column: (*column).to_string(),
        });
    }

    let mut audits = Vec::with_capacity(columns.len());
    for &column in columns {
        let flags: Vec<bool> = records
            .iter()
            .map(|record| record.is_unset(column).unwrap_or(true))
            .collect();
        let unset = flags.iter().filter(|flag| **flag).count();
        info!(column, unset, "audited column");
        audits.push(ColumnAudit {
            column: column.to_string(),
            unset,
            flags,
        });
    }

    Ok(EmptinessAudit {
        rows: records.len(),
        columns: audits,
    })
}
