use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::formatting::{format_bucket_label, suggested_y_max};

/// A delivery that is due on a given calendar date.
///
/// Always holds a fully resolved date, never the six-digit source form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DueDateRecord {
    /// Calendar date the delivery is due on.
    pub due_date: NaiveDate,
}

impl DueDateRecord {
    pub fn new(due_date: NaiveDate) -> Self {
        Self { due_date }
    }
}

/// One completed CSV ingestion, kept for provenance and re-upload warnings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadEvent {
    /// Name of the uploaded file as given by the user.
    pub filename: String,
    /// UTC timestamp of the ingestion.
    pub uploaded_at: DateTime<Utc>,
}

/// Count of due dates falling on one calendar day of the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBucket {
    /// The day this bucket covers.
    pub date: NaiveDate,
    /// Number of due dates on `date`; zero when none.
    pub count: u32,
    /// Display label such as `"1/10(金)"`. Derived from `date`.
    pub label: String,
}

impl DailyBucket {
    /// Build a bucket, deriving its label from `date`.
    pub fn new(date: NaiveDate, count: u32) -> Self {
        Self {
            date,
            count,
            label: format_bucket_label(date),
        }
    }
}

/// Everything a chart renderer needs: the zero-filled buckets plus the
/// suggested y-axis upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartData {
    /// First day of the window (inclusive).
    pub start: NaiveDate,
    /// Last day of the window (inclusive).
    pub end: NaiveDate,
    /// One bucket per day, ascending.
    pub buckets: Vec<DailyBucket>,
    /// Suggested y-axis upper bound.
    pub y_axis_max: u32,
}

impl ChartData {
    /// Wrap `buckets` and compute the y-axis hint from their maximum.
    pub fn new(start: NaiveDate, end: NaiveDate, buckets: Vec<DailyBucket>) -> Self {
        let max_count = buckets.iter().map(|b| b.count).max().unwrap_or(0);
        Self {
            start,
            end,
            buckets,
            y_axis_max: suggested_y_max(max_count),
        }
    }

    /// Sum of all bucket counts.
    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|b| u64::from(b.count)).sum()
    }

    /// Highest single-day count.
    pub fn max_count(&self) -> u32 {
        self.buckets.iter().map(|b| b.count).max().unwrap_or(0)
    }

    /// `(label, count)` pairs in date order.
    pub fn labels_and_counts(&self) -> Vec<(&str, u32)> {
        self.buckets
            .iter()
            .map(|b| (b.label.as_str(), b.count))
            .collect()
    }
}

/// Outcome of pulling due dates out of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Header of the column the dates were read from.
    pub column: String,
    /// Valid records in original row order, duplicates kept.
    pub records: Vec<DueDateRecord>,
    /// Number of data rows examined.
    pub rows_read: usize,
    /// Number of rows whose cell was not a valid `YYMMDD` date.
    pub rows_dropped: usize,
}

impl Extraction {
    /// The extracted dates in row order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.due_date).collect()
    }

    /// The extracted dates rendered as `YYYY-MM-DD`.
    pub fn converted_dates(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.due_date.format("%Y-%m-%d").to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_bucket_derives_label() {
        let bucket = DailyBucket::new(date(2025, 1, 10), 2);
        assert_eq!(bucket.label, "1/10(金)");
        assert_eq!(bucket.count, 2);
    }

    #[test]
    fn test_chart_data_y_axis_small_counts() {
        let buckets = vec![
            DailyBucket::new(date(2025, 1, 10), 2),
            DailyBucket::new(date(2025, 1, 11), 0),
        ];
        let chart = ChartData::new(date(2025, 1, 10), date(2025, 1, 11), buckets);
        assert_eq!(chart.y_axis_max, 5);
        assert_eq!(chart.total(), 2);
        assert_eq!(chart.max_count(), 2);
    }

    #[test]
    fn test_chart_data_y_axis_large_counts() {
        let buckets = vec![DailyBucket::new(date(2025, 1, 10), 21)];
        let chart = ChartData::new(date(2025, 1, 10), date(2025, 1, 10), buckets);
        assert_eq!(chart.y_axis_max, 31);
    }

    #[test]
    fn test_chart_data_labels_and_counts() {
        let buckets = vec![
            DailyBucket::new(date(2025, 1, 11), 0),
            DailyBucket::new(date(2025, 1, 12), 1),
        ];
        let chart = ChartData::new(date(2025, 1, 11), date(2025, 1, 12), buckets);
        assert_eq!(
            chart.labels_and_counts(),
            vec![("1/11(土)", 0), ("1/12(日)", 1)]
        );
    }

    #[test]
    fn test_extraction_converted_dates() {
        let extraction = Extraction {
            column: "00041確認納期（回答納期）01".to_string(),
            records: vec![
                DueDateRecord::new(date(2025, 1, 10)),
                DueDateRecord::new(date(2024, 12, 31)),
            ],
            rows_read: 3,
            rows_dropped: 1,
        };
        assert_eq!(
            extraction.converted_dates(),
            vec!["2025-01-10".to_string(), "2024-12-31".to_string()]
        );
        assert_eq!(extraction.dates()[1], date(2024, 12, 31));
    }

    #[test]
    fn test_chart_data_serializes_to_json() {
        let chart = ChartData::new(
            date(2025, 1, 10),
            date(2025, 1, 10),
            vec![DailyBucket::new(date(2025, 1, 10), 1)],
        );
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["start"], "2025-01-10");
        assert_eq!(json["buckets"][0]["count"], 1);
        assert_eq!(json["y_axis_max"], 4);
    }
}
