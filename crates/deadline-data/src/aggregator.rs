//! Daily due-date histogram over a fixed window.
//!
//! Every day of the window gets a bucket, whether or not any due date
//! falls on it, so the chart shape never depends on data availability.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use deadline_core::error::{DeadlineError, Result};
use deadline_core::models::{ChartData, DailyBucket};
use deadline_core::time_utils::dates_between;

// ── DueDateAggregator ─────────────────────────────────────────────────────────

/// Stateless helper that groups due dates by calendar day.
pub struct DueDateAggregator;

impl DueDateAggregator {
    /// One bucket per day in `[start, end]`, ascending, zero-filled.
    ///
    /// Dates outside the window are ignored. Fails with
    /// [`DeadlineError::InvalidWindow`] when `start > end`.
    pub fn aggregate(
        dates: &[NaiveDate],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBucket>> {
        if start > end {
            return Err(DeadlineError::InvalidWindow { start, end });
        }

        let counts = Self::count_by_day(dates, start, end);

        Ok(dates_between(start, end)
            .map(|day| DailyBucket::new(day, counts.get(&day).copied().unwrap_or(0)))
            .collect())
    }

    /// Aggregate and attach the y-axis hint for the renderer.
    pub fn build_chart(dates: &[NaiveDate], start: NaiveDate, end: NaiveDate) -> Result<ChartData> {
        let buckets = Self::aggregate(dates, start, end)?;
        Ok(ChartData::new(start, end, buckets))
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// Occurrences of each in-window date.
    fn count_by_day(
        dates: &[NaiveDate],
        start: NaiveDate,
        end: NaiveDate,
    ) -> BTreeMap<NaiveDate, u32> {
        let mut map: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        for date in dates.iter().filter(|d| (start..=end).contains(*d)) {
            *map.entry(*date).or_insert(0) += 1;
        }
        map
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
