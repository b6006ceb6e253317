//! Error types for table I/O.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reading or writing a table file.
#[derive(Debug, Error)]
pub enum TableError {
    /// Opening, reading or writing the file failed.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV layer rejected the file.
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A required column is absent from the header row.
    #[error("{path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },

    /// A cell could not be decoded.
    #[error("{path} line {line}, column '{column}': invalid value '{value}' ({reason})")]
    InvalidValue {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
        reason: String,
    },

    /// A JSON report could not be serialized.
    #[error("cannot encode report for {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl TableError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    pub fn missing_column(path: impl Into<PathBuf>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            path: path.into(),
            column: column.into(),
        }
    }
}
