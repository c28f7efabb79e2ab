use chrono::{Datelike, NaiveDate};

use crate::time_utils::weekday_label;

/// Render a chart label for `date`: month and day without zero padding,
/// followed by the weekday in parentheses.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use deadline_core::formatting::format_bucket_label;
///
/// let d = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
/// assert_eq!(format_bucket_label(d), "1/10(金)");
/// ```
pub fn format_bucket_label(date: NaiveDate) -> String {
    format!("{}/{}({})", date.month(), date.day(), weekday_label(date))
}

/// Suggested y-axis upper bound for a histogram whose tallest bar is
/// `max_count`.
///
/// Adds 10 of headroom above 20, otherwise 3.
///
/// # Examples
///
/// ```
/// use deadline_core::formatting::suggested_y_max;
///
/// assert_eq!(suggested_y_max(0), 3);
/// assert_eq!(suggested_y_max(20), 23);
/// assert_eq!(suggested_y_max(21), 31);
/// ```
pub fn suggested_y_max(max_count: u32) -> u32 {
    if max_count > 20 {
        max_count + 10
    } else {
        max_count + 3
    }
}

/// Format a count with thousands separators.
///
/// # Examples
///
/// ```
/// use deadline_core::formatting::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
