use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use regex::Regex;
use tracing::warn;

use crate::error::{DeadlineError, Result};

/// Days after today covered by the chart window, i.e. `[today, today+60]`.
pub const DEFAULT_WINDOW_DAYS: u32 = 60;

/// Two-digit years below this value belong to the 2000s, the rest to the 1900s.
///
/// Same pivot as POSIX `strptime("%y")`: `00..=68` → 2000–2068,
/// `69..=99` → 1969–1999.
pub const CENTURY_PIVOT: u32 = 69;

/// Weekday abbreviations, Monday first.
const WEEKDAY_LABELS: [&str; 7] = ["月", "火", "水", "木", "金", "土", "日"];

fn six_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{6}$").expect("regex is valid"))
}

// ── YYMMDD parsing ────────────────────────────────────────────────────────────

/// Parse a compact `YYMMDD` cell into a calendar date.
///
/// Surrounding whitespace is ignored. Anything other than exactly six ASCII
/// digits, or a month/day that does not exist, is rejected with
/// [`DeadlineError::InvalidDate`].
pub fn parse_yymmdd(raw: &str) -> Result<NaiveDate> {
    let value = raw.trim();
    if !six_digits().is_match(value) {
        return Err(DeadlineError::InvalidDate(value.to_string()));
    }

    // Six ASCII digits always split cleanly and parse.
    let field = |range: std::ops::Range<usize>| -> u32 {
        value[range].parse().unwrap_or(0)
    };
    let yy = field(0..2);
    let month = field(2..4);
    let day = field(4..6);

    let year = if yy < CENTURY_PIVOT { 2000 + yy } else { 1900 + yy };

    NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or_else(|| DeadlineError::InvalidDate(value.to_string()))
}

// ── Calendar helpers ──────────────────────────────────────────────────────────

/// Single-character weekday label for `date` (`月` for Monday … `日` for Sunday).
pub fn weekday_label(date: NaiveDate) -> &'static str {
    WEEKDAY_LABELS[date.weekday().num_days_from_monday() as usize]
}

/// The inclusive window `[today, today + days]`.
pub fn window(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    (today, today + Duration::days(i64::from(days)))
}

/// Every date in `[start, end]`, ascending. Empty when `start > end`.
pub fn dates_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Resolves "today" and formats upload timestamps in a fixed IANA timezone.
#[derive(Debug, Clone)]
pub struct TimezoneHandler {
    default_tz: Tz,
}

impl TimezoneHandler {
    /// Create a handler for the given IANA timezone name.
    ///
    /// If `tz_name` is not a recognised IANA timezone, falls back to UTC
    /// and logs a warning.
    pub fn new(tz_name: &str) -> Self {
        let tz = tz_name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                tz_name
            );
            Tz::UTC
        });
        Self { default_tz: tz }
    }

    /// Validate that `tz_name` is a recognised IANA timezone identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }

    /// The local calendar date at instant `now`.
    pub fn today_at(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.default_tz).date_naive()
    }

    /// The local calendar date right now.
    pub fn today(&self) -> NaiveDate {
        self.today_at(Utc::now())
    }

    /// Format `dt` as `YYYY-MM-DD HH:MM:SS` in the handler's timezone.
    pub fn format_local(&self, dt: DateTime<Utc>) -> String {
        dt.with_timezone(&self.default_tz)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    /// IANA name of the zone in effect, `"UTC"` after a fallback.
    pub fn name(&self) -> &'static str {
        self.default_tz.name()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
