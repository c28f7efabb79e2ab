use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// All errors produced by the deadline chart crates.
#[derive(Error, Debug)]
pub enum DeadlineError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The upload is neither valid Windows-31J nor valid UTF-8.
    #[error("Failed to decode CSV: {0}")]
    Decode(String),

    /// The decoded text is not well-formed CSV.
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// No header contains the configured keyword.
    #[error("Expected column missing: no header contains '{keyword}'")]
    ColumnNotFound { keyword: String },

    /// A cell is not a `YYMMDD` calendar date.
    #[error("Invalid date value: {0}")]
    InvalidDate(String),

    /// The window start lies after its end.
    #[error("Invalid date window: {start} is after {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    /// A storage read or write failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the deadline crates.
pub type Result<T> = std::result::Result<T, DeadlineError>;
