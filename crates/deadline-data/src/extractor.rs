//! Due-date extraction from a loaded CSV table.
//!
//! Locates the due-date column by keyword and converts each row's
//! `YYMMDD` cell into a [`DueDateRecord`]. Rows that do not hold a valid
//! date are skipped and counted; only a missing column fails the batch.

use std::path::Path;

use deadline_core::error::{DeadlineError, Result};
use deadline_core::models::{DueDateRecord, Extraction};
use deadline_core::time_utils::parse_yymmdd;
use tracing::{debug, info};

use crate::reader::{read_table_from_bytes, read_table_from_path, Table};

/// Index of the first header containing `keyword`.
///
/// Matching is by substring, not equality, because the exported header
/// text varies between ERP versions. When several headers match, the
/// leftmost one wins.
pub fn find_target_column(headers: &[String], keyword: &str) -> Option<usize> {
    headers.iter().position(|h| h.contains(keyword))
}

/// Pull every valid due date out of `table`.
///
/// Records keep the original row order and are not deduplicated.
pub fn extract(table: &Table, keyword: &str) -> Result<Extraction> {
    let column = find_target_column(&table.headers, keyword).ok_or_else(|| {
        DeadlineError::ColumnNotFound {
            keyword: keyword.to_string(),
        }
    })?;
    let column_name = table.headers[column].clone();

    let mut records = Vec::with_capacity(table.len());
    let mut rows_dropped = 0usize;

    for (row, cells) in table.rows.iter().enumerate() {
        let raw = cells.get(column).map(String::as_str).unwrap_or("");
        match parse_yymmdd(raw) {
            Ok(due_date) => records.push(DueDateRecord::new(due_date)),
            Err(e) => {
                rows_dropped += 1;
                // +2: one for the header line, one for 1-based numbering.
                debug!("Skipping line {}: {}", row + 2, e);
            }
        }
    }

    info!(
        "Extracted {} due dates from column '{}' ({} rows, {} dropped)",
        records.len(),
        column_name,
        table.len(),
        rows_dropped
    );

    Ok(Extraction {
        column: column_name,
        records,
        rows_read: table.len(),
        rows_dropped,
    })
}

/// Decode, parse and extract an upload held in memory.
pub fn extract_from_bytes(bytes: &[u8], keyword: &str) -> Result<Extraction> {
    let table = read_table_from_bytes(bytes)?;
    extract(&table, keyword)
}

/// Read, decode, parse and extract the CSV file at `path`.
pub fn extract_from_path(path: &Path, keyword: &str) -> Result<Extraction> {
    let table = read_table_from_path(path)?;
    extract(&table, keyword)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
