//! Relative-age rendering for seeded timestamps ("3 days ago")

use caseflow_core::Timestamp;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const MONTH: i64 = 30 * DAY;

/// Parse an intake date. Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DD` and `MM/DD/YYYY`.
pub fn parse_receipt_date(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// Distance between `then` and `as_of` in words, with an "ago"/"in" suffix.
pub fn humanize_age(then: Timestamp, as_of: Timestamp) -> String {
    let seconds = (as_of - then).num_seconds();
    let words = distance_in_words(seconds.abs());
    if seconds >= 0 {
        format!("{} ago", words)
    } else {
        format!("in {}", words)
    }
}

/// Relative age of a raw date string, or the raw string if it does not parse.
pub fn humanize_raw(raw: &str, as_of: Timestamp) -> String {
    match parse_receipt_date(raw) {
        Some(then) => humanize_age(then, as_of),
        None => raw.to_string(),
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

fn round_div(value: i64, unit: i64) -> i64 {
    (value + unit / 2) / unit
}

fn distance_in_words(seconds: i64) -> String {
    let minutes = round_div(seconds, MINUTE);
    if minutes < 1 {
        return "less than a minute".to_string();
    }
    if minutes < 45 {
        return plural(minutes, "minute");
    }
    if minutes < 90 {
        return "about 1 hour".to_string();
    }
    if minutes < 24 * 60 {
        return format!("about {}", plural(round_div(seconds, HOUR), "hour"));
    }
    if minutes < 42 * 60 {
        return "1 day".to_string();
    }
    if minutes < 30 * 24 * 60 {
        return plural(round_div(seconds, DAY), "day");
    }
    if minutes < 45 * 24 * 60 {
        return "about 1 month".to_string();
    }
    if minutes < 60 * 24 * 60 {
        return "about 2 months".to_string();
    }

    let months = round_div(seconds, MONTH);
    if months < 12 {
        return plural(months, "month");
    }
    let years = months / 12;
    let remainder = months % 12;
    if remainder < 3 {
        format!("about {}", plural(years, "year"))
    } else if remainder < 9 {
        format!("over {}", plural(years, "year"))
    } else {
        format!("almost {}", plural(years + 1, "year"))
    }
}
