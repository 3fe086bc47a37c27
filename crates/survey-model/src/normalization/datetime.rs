//! Date and datetime parsing for typed output.
//!
//! Survey clients send ISO 8601 values, with or without a UTC offset. Offsets
//! are dropped and the wall-clock time is kept, which is what spreadsheet
//! writers expect.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parse a calendar date (`YYYY-MM-DD`).
///
/// A datetime string is accepted as well; its date part is returned.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    parse_datetime(trimmed).map(|datetime| datetime.date())
}

/// Parse an ISO 8601 datetime, keeping local wall time when an offset is present.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(datetime.naive_local());
    }

    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f", // With fractional seconds
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in &formats {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(datetime);
        }
    }

    // Offsets without a colon, e.g. "+0300"
    DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f%z")
        .ok()
        .map(|datetime| datetime.naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_complete() {
        assert_eq!(
            parse_date("2023-12-25"),
            Some(NaiveDate::from_ymd_opt(2023, 12, 25).unwrap())
        );
    }

    #[test]
    fn parse_date_invalid_returns_none() {
        assert!(parse_date("").is_none());
        assert!(parse_date("invalid").is_none());
        assert!(parse_date("2023-13-01").is_none());
        assert!(parse_date("2023-12").is_none());
    }

    #[test]
    fn parse_datetime_keeps_wall_time() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(parse_datetime("2024-01-15T10:30:00"), Some(expected));
        assert_eq!(parse_datetime("2024-01-15T10:30:00.000+03:00"), Some(expected));
        assert_eq!(parse_datetime("2024-01-15T10:30:00.000-0500"), Some(expected));
        assert_eq!(parse_datetime("2024-01-15 10:30"), Some(expected));
    }

    #[test]
    fn parse_date_accepts_datetime() {
        assert_eq!(
            parse_date("2024-01-15T10:30:00Z"),
            Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
    }
}
