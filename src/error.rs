//! Typed errors for the view engine and the export path.
//!
//! Data-shape problems never surface here: filters degrade to "no match"
//! and pages degrade to empty slices. These variants cover caller contract
//! violations and export sink failures only.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("column index {index} out of range (table has {column_count} columns)")]
    ColumnOutOfRange { index: usize, column_count: usize },

    #[error("page size must be a positive integer, got {0}")]
    InvalidPageSize(usize),

    #[error("page numbers start at 1, got {0}")]
    InvalidPageNumber(usize),

    #[error("row {row} has {found} values but table has {expected} columns")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export failed: {0}")]
    ExportFailed(String),

    #[error("unknown export format '{0}' (expected csv, tsv or json)")]
    UnknownFormat(String),

    #[error("csv serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("i/o error during export: {0}")]
    Io(#[from] std::io::Error),

    #[error("export worker stopped before reporting a result")]
    WorkerDisconnected,
}
