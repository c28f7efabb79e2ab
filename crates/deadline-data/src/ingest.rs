//! Upload ingestion: extraction plus the duplicate-filename protocol.
//!
//! A re-upload of a known filename is not written until the caller
//! confirms it. Callers either check first with [`check_exists`] or pass
//! `confirmed = true` after the user agreed to the warning.

use chrono::{DateTime, Utc};
use deadline_core::error::Result;
use deadline_core::models::UploadEvent;
use tracing::{info, warn};

use crate::extractor::extract_from_bytes;
use crate::store::DueDateStore;

/// One CSV upload waiting to be ingested.
#[derive(Debug, Clone)]
pub struct UploadRequest<'a> {
    /// Name the user gave the file; used for the duplicate check.
    pub filename: String,
    /// Raw, undecoded file contents.
    pub bytes: &'a [u8],
    /// Header substring that identifies the due-date column.
    pub keyword: String,
    /// The user accepted the re-upload warning.
    pub confirmed: bool,
}

/// Summary of a completed ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub filename: String,
    /// Header of the column the dates came from.
    pub column: String,
    /// Due dates written to storage.
    pub accepted: usize,
    /// Rows skipped because their cell was not a valid date.
    pub dropped: usize,
    pub uploaded_at: DateTime<Utc>,
}

/// Result of [`ingest_upload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Records and upload event were stored.
    Ingested(IngestReport),
    /// The filename was uploaded before and `confirmed` was not set.
    /// Nothing was written.
    NeedsConfirmation {
        filename: String,
        /// Most recent earlier upload under the same name.
        previous: Option<UploadEvent>,
    },
}

/// Whether `filename` was uploaded before.
pub fn check_exists(store: &dyn DueDateStore, filename: &str) -> Result<bool> {
    store.upload_exists(filename)
}

/// Ingest one upload.
///
/// Decoding or column errors abort before anything is written. Confirmed
/// re-uploads append their records; earlier rows are left in place.
pub fn ingest_upload(
    store: &dyn DueDateStore,
    request: &UploadRequest<'_>,
    now: DateTime<Utc>,
) -> Result<IngestOutcome> {
    if check_exists(store, &request.filename)? {
        if !request.confirmed {
            warn!(
                "'{}' was uploaded before; waiting for confirmation",
                request.filename
            );
            return Ok(IngestOutcome::NeedsConfirmation {
                filename: request.filename.clone(),
                previous: store.latest_upload_named(&request.filename)?,
            });
        }
        info!("Re-uploading '{}' after confirmation", request.filename);
    }

    let extraction = extract_from_bytes(request.bytes, &request.keyword)?;

    let event = UploadEvent {
        filename: request.filename.clone(),
        uploaded_at: now,
    };
    let accepted = store.record_upload(&extraction.records, &event)?;

    info!(
        "Ingested '{}': {} due dates stored, {} rows dropped",
        request.filename, accepted, extraction.rows_dropped
    );

    Ok(IngestOutcome::Ingested(IngestReport {
        filename: request.filename.clone(),
        column: extraction.column,
        accepted,
        dropped: extraction.rows_dropped,
        uploaded_at: now,
    }))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use chrono::NaiveDate;
    use deadline_core::error::DeadlineError;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-10T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn sjis(text: &str) -> Vec<u8> {
        encoding_rs::SHIFT_JIS.encode(text).0.into_owned()
    }

    fn request<'a>(filename: &str, bytes: &'a [u8], confirmed: bool) -> UploadRequest<'a> {
        UploadRequest {
            filename: filename.to_string(),
            bytes,
            keyword: "00041".to_string(),
            confirmed,
        }
    }

    const CSV: &str = "品番,00041確認納期（回答納期）01\nA-1,250110\nA-2,250230\nA-3,250112\n";

    #[test]
    fn test_ingest_new_file() {
        let store = SqliteStore::open_in_memory().unwrap();
        let bytes = sjis(CSV);

        let outcome = ingest_upload(&store, &request("0110.csv", &bytes, false), now()).unwrap();

        let IngestOutcome::Ingested(report) = outcome else {
            panic!("expected ingestion");
        };
        assert_eq!(report.accepted, 2);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.column, "00041確認納期（回答納期）01");
        assert_eq!(store.count_due_dates().unwrap(), 2);
        assert!(check_exists(&store, "0110.csv").unwrap());
    }

    #[test]
    fn test_ingest_duplicate_requires_confirmation() {
        let store = SqliteStore::open_in_memory().unwrap();
        let bytes = sjis(CSV);
        ingest_upload(&store, &request("0110.csv", &bytes, false), now()).unwrap();

        let outcome = ingest_upload(&store, &request("0110.csv", &bytes, false), now()).unwrap();

        match outcome {
            IngestOutcome::NeedsConfirmation { filename, previous } => {
                assert_eq!(filename, "0110.csv");
                assert_eq!(previous.map(|e| e.filename), Some("0110.csv".to_string()));
            }
            other => panic!("expected confirmation request, got {other:?}"),
        }
        assert_eq!(store.count_due_dates().unwrap(), 2, "nothing written");
    }

    #[test]
    fn test_ingest_confirmed_duplicate_appends() {
        let store = SqliteStore::open_in_memory().unwrap();
        let bytes = sjis(CSV);
        ingest_upload(&store, &request("0110.csv", &bytes, false), now()).unwrap();

        let outcome = ingest_upload(&store, &request("0110.csv", &bytes, true), now()).unwrap();

        assert!(matches!(outcome, IngestOutcome::Ingested(_)));
        assert_eq!(store.count_due_dates().unwrap(), 4);
        let jan10 = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert_eq!(
            store.query_due_dates_between(jan10, jan10).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_ingest_missing_column_writes_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        let bytes = sjis("品番,数量\nA-1,3\n");

        let err = ingest_upload(&store, &request("bad.csv", &bytes, false), now()).unwrap_err();

        assert!(matches!(err, DeadlineError::ColumnNotFound { .. }));
        assert_eq!(store.count_due_dates().unwrap(), 0);
        assert!(!check_exists(&store, "bad.csv").unwrap());
    }

    #[test]
    fn test_ingest_undecodable_writes_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        let bytes = [0xFD, 0xFE, 0xFF];

        let err = ingest_upload(&store, &request("bin.csv", &bytes, false), now()).unwrap_err();

        assert!(matches!(err, DeadlineError::Decode(_)));
        assert!(store.latest_upload_event().unwrap().is_none());
    }

    #[test]
    fn test_ingest_all_rows_invalid_still_logs_upload() {
        let store = SqliteStore::open_in_memory().unwrap();
        let bytes = sjis("00041納期\nxx\n250231\n");

        let outcome = ingest_upload(&store, &request("empty.csv", &bytes, false), now()).unwrap();

        let IngestOutcome::Ingested(report) = outcome else {
            panic!("expected ingestion");
        };
        assert_eq!(report.accepted, 0);
        assert_eq!(report.dropped, 2);
        assert!(check_exists(&store, "empty.csv").unwrap());
    }
}
