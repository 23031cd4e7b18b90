//! Front matter date parsing and formatting.
//!
//! Accepted inputs:
//!
//! | Input | Example |
//! |-------|---------|
//! | date | `2023-07-05` |
//! | local date-time | `2023-07-05T09:30:00`, `2023-07-05 09:30:00` |
//! | RFC 3339 | `2023-07-05T09:30:00+02:00`, `2023-07-05T07:30:00Z` |
//! | with offset | `2023-07-05 09:30:00 +0200` |
//!
//! Dates carrying an offset are normalized to UTC; dates without one are
//! taken as UTC.

use chrono::{
    DateTime, NaiveDate, NaiveDateTime,
    format::{Item, StrftimeItems},
};
use std::fmt::Write;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parse a front matter date. Returns `None` for anything unrecognized.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// ISO 8601 rendering used for machine-readable fields (`datetime` attributes).
pub fn to_iso(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Render with a user-supplied `strftime` format.
///
/// Falls back to `YYYY-MM-DD` if the format cannot be applied.
pub fn format_date(dt: NaiveDateTime, fmt: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", dt.format(fmt)).is_err() {
        return dt.format("%Y-%m-%d").to_string();
    }
    out
}

/// Check that a `strftime` format string only uses known specifiers.
pub fn is_valid_format(fmt: &str) -> bool {
    StrftimeItems::new(fmt).all(|item| !matches!(item, Item::Error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_plain_date() {
        let dt = parse_date("2023-07-05").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2023, 7, 5));
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_parse_naive_datetime() {
        let a = parse_date("2023-07-05T09:30:00").unwrap();
        let b = parse_date("2023-07-05 09:30:00").unwrap();
        assert_eq!(a, b);
        assert_eq!((a.hour(), a.minute()), (9, 30));
    }

    #[test]
    fn test_parse_rfc3339_normalizes_to_utc() {
        let dt = parse_date("2023-07-05T09:30:00+02:00").unwrap();
        assert_eq!(dt.hour(), 7);
        assert_eq!(dt, parse_date("2023-07-05T07:30:00Z").unwrap());
    }

    #[test]
    fn test_parse_with_offset() {
        let dt = parse_date("2023-07-05 09:30:00 +0200").unwrap();
        assert_eq!(dt.hour(), 7);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("2023-13-01").is_none());
        assert!(parse_date("2023-02-30").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_to_iso() {
        let dt = parse_date("2023-03-01").unwrap();
        assert_eq!(to_iso(dt), "2023-03-01T00:00:00Z");
    }

    #[test]
    fn test_format_date() {
        let dt = parse_date("2023-03-01").unwrap();
        assert_eq!(format_date(dt, "%Y-%m-%d"), "2023-03-01");
        assert_eq!(format_date(dt, "%B %-d, %Y"), "March 1, 2023");
    }

    #[test]
    fn test_is_valid_format() {
        assert!(is_valid_format("%Y-%m-%d"));
        assert!(is_valid_format("%b %e, %Y"));
        assert!(!is_valid_format("%Q"));
    }
}
