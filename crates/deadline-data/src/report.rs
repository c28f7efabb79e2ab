//! Read side of the pipeline: stored due dates to chart data, plus the
//! provenance line shown under the chart.

use chrono::NaiveDate;
use deadline_core::error::Result;
use deadline_core::models::ChartData;
use deadline_core::time_utils::{window, TimezoneHandler};
use tracing::{debug, info};

use crate::aggregator::DueDateAggregator;
use crate::store::DueDateStore;

/// Shown when no upload has been recorded yet.
pub const NO_UPLOAD_MESSAGE: &str = "まだCSVファイルがアップロードされていません。";

/// Chart data for the inclusive window `[today, today + days]`.
///
/// Returns `None` when the window holds no stored due dates at all, so the
/// caller can show an empty state instead of a flat chart.
pub fn load_chart(
    store: &dyn DueDateStore,
    today: NaiveDate,
    days: u32,
) -> Result<Option<ChartData>> {
    let (start, end) = window(today, days);
    let dates = store.query_due_dates_between(start, end)?;
    if dates.is_empty() {
        info!("No due dates between {} and {}", start, end);
        return Ok(None);
    }

    debug!("Loaded {} due dates between {} and {}", dates.len(), start, end);
    DueDateAggregator::build_chart(&dates, start, end).map(Some)
}

/// "Last upload" line: the filename and its local upload time.
pub fn describe_latest_upload(
    store: &dyn DueDateStore,
    timezone: &TimezoneHandler,
) -> Result<String> {
    Ok(match store.latest_upload_event()? {
        Some(event) => format!(
            "最終アップロード: {} ({})",
            event.filename,
            timezone.format_local(event.uploaded_at)
        ),
        None => NO_UPLOAD_MESSAGE.to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{ingest_upload, IngestOutcome, UploadRequest};
    use crate::store::SqliteStore;
    use chrono::{DateTime, Utc};
    use deadline_core::models::{DueDateRecord, UploadEvent};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_load_chart_empty_store_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(load_chart(&store, date(2025, 1, 10), 60).unwrap().is_none());
    }

    #[test]
    fn test_load_chart_data_outside_window_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_due_dates(&[DueDateRecord::new(date(2024, 6, 1))])
            .unwrap();
        assert!(load_chart(&store, date(2025, 1, 10), 60).unwrap().is_none());
    }

    #[test]
    fn test_load_chart_zero_fills_window() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_due_dates(&[
                DueDateRecord::new(date(2025, 1, 12)),
                DueDateRecord::new(date(2025, 1, 12)),
            ])
            .unwrap();

        let chart = load_chart(&store, date(2025, 1, 10), 5).unwrap().unwrap();

        assert_eq!(chart.start, date(2025, 1, 10));
        assert_eq!(chart.end, date(2025, 1, 15));
        assert_eq!(chart.buckets.len(), 6);
        assert_eq!(chart.buckets[2].count, 2);
        assert_eq!(chart.total(), 2);
    }

    #[test]
    fn test_describe_latest_upload_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        let tz = TimezoneHandler::new("Asia/Tokyo");
        assert_eq!(describe_latest_upload(&store, &tz).unwrap(), NO_UPLOAD_MESSAGE);
    }

    #[test]
    fn test_describe_latest_upload_in_local_time() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_upload_event(&UploadEvent {
                filename: "納期_0110.csv".to_string(),
                uploaded_at: ts("2025-01-10T00:30:00Z"),
            })
            .unwrap();
        let tz = TimezoneHandler::new("Asia/Tokyo");

        assert_eq!(
            describe_latest_upload(&store, &tz).unwrap(),
            "最終アップロード: 納期_0110.csv (2025-01-10 09:30:00)"
        );
    }

    #[test]
    fn test_csv_to_chart_end_to_end() {
        let store = SqliteStore::open_in_memory().unwrap();
        let csv = "品番,00041確認納期（回答納期）01\n\
                   A-1,250110\nA-2,250110\nA-3,250112\nA-4,250230\nA-5,\n";
        let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode(csv);
        let request = UploadRequest {
            filename: "0110.csv".to_string(),
            bytes: &bytes,
            keyword: "00041".to_string(),
            confirmed: false,
        };

        let outcome = ingest_upload(&store, &request, ts("2025-01-10T00:00:00Z")).unwrap();
        assert!(matches!(
            outcome,
            IngestOutcome::Ingested(ref r) if r.accepted == 3 && r.dropped == 2
        ));

        let chart = load_chart(&store, date(2025, 1, 10), 60).unwrap().unwrap();
        assert_eq!(chart.buckets.len(), 61);
        assert_eq!(
            &chart.labels_and_counts()[..3],
            &[("1/10(金)", 2), ("1/11(土)", 0), ("1/12(日)", 1)]
        );
        assert_eq!(chart.y_axis_max, 5);
    }
}
