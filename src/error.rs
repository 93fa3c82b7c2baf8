// src/error.rs

use thiserror::Error;

/// Errors raised while building or exporting a result set.
///
/// `MissingTimeColumn` and `EmptyDataset` are the two conditions a caller is
/// expected to handle; the rest wrap shape problems in caller-supplied data or
/// failures of the serializers.
#[derive(Debug, Error)]
pub enum DataError {
    /// Resampling was requested but no column holds timestamps.
    #[error("No datetime-like column found in: {columns:?}")]
    MissingTimeColumn { columns: Vec<String> },

    /// An export was requested on a result set without header or rows.
    #[error("No data retrieved from the database!")]
    EmptyDataset,

    #[error("unrecognised resample code `{0}`")]
    InvalidTimeframe(String),

    #[error("row {row} has {found} values, header has {expected}")]
    RowArity {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("column `{0}` appears more than once in the header")]
    DuplicateColumn(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
