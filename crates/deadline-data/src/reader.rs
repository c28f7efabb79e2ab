//! CSV decoding and loading for ERP due-date exports.
//!
//! Exports arrive as Windows-31J (Shift_JIS) by default, occasionally as
//! UTF-8. The bytes are decoded strictly, never with replacement
//! characters, and parsed into an in-memory [`Table`] of string cells.

use std::path::Path;

use deadline_core::error::{DeadlineError, Result};
use encoding_rs::{Encoding, SHIFT_JIS, UTF_8};
use tracing::debug;

// ── Table ─────────────────────────────────────────────────────────────────────

/// A fully read CSV: the header row plus every data row as raw strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Column names from the header row, in file order.
    pub headers: Vec<String>,
    /// Data rows. Rows may be shorter or longer than `headers`.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from already-split headers and rows.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `(row, column)`, or `None` when the row is too short.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
    }
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Decode raw upload bytes to text.
///
/// A byte-order mark selects its encoding outright. Otherwise Windows-31J
/// is tried first and UTF-8 second; both are strict, so any malformed
/// sequence moves on to the next candidate. Fails with
/// [`DeadlineError::Decode`] when nothing fits.
pub fn decode_csv_bytes(bytes: &[u8]) -> Result<(String, &'static Encoding)> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return encoding
            .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
            .map(|text| (text.into_owned(), encoding))
            .ok_or_else(|| {
                DeadlineError::Decode(format!(
                    "input starts with a {} byte-order mark but is not valid {}",
                    encoding.name(),
                    encoding.name()
                ))
            });
    }

    for encoding in [SHIFT_JIS, UTF_8] {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            debug!("Decoded {} bytes as {}", bytes.len(), encoding.name());
            return Ok((text.into_owned(), encoding));
        }
        debug!("Input is not valid {}", encoding.name());
    }

    Err(DeadlineError::Decode(
        "input is neither valid Shift_JIS nor valid UTF-8".to_string(),
    ))
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parse decoded CSV text. The first record is the header row.
pub fn parse_table(text: &str) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(String::from).collect());
    }

    Ok(Table { headers, rows })
}

/// Decode and parse a CSV held in memory.
pub fn read_table_from_bytes(bytes: &[u8]) -> Result<Table> {
    let (text, encoding) = decode_csv_bytes(bytes)?;
    let table = parse_table(&text)?;
    debug!(
        "Read {} columns and {} rows ({})",
        table.headers.len(),
        table.rows.len(),
        encoding.name()
    );
    Ok(table)
}

/// Read, decode and parse the CSV file at `path`.
pub fn read_table_from_path(path: &Path) -> Result<Table> {
    let bytes = std::fs::read(path).map_err(|source| DeadlineError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    read_table_from_bytes(&bytes)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
