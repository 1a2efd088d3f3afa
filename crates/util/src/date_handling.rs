//! # Date Handling Utilities
//!
//! Parsing for the date and time strings carried by DATE, TIME and range attributes, and
//! formatting for read-only display.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime};

/// Parses an attribute date.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD` and RFC3339 timestamps (the date part is kept).
///
/// # Example
/// ```rust
/// use deep_util::date_handling::parse_attribute_date;
///
/// assert!(parse_attribute_date("2023-12-25").is_some());
/// assert!(parse_attribute_date("2023-12-25T10:30:00Z").is_some());
/// assert!(parse_attribute_date("2023-13-45").is_none());
/// ```
pub fn parse_attribute_date(date_string: &str) -> Option<NaiveDate> {
    let trimmed = date_string.trim();
    if let Ok(date_time) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(date_time.date_naive());
    }

    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|format_string| NaiveDate::parse_from_str(trimmed, format_string).ok())
}

/// Parses an attribute time of day (`HH:MM` or `HH:MM:SS`).
///
/// # Example
/// ```rust
/// use deep_util::date_handling::parse_attribute_time;
///
/// assert!(parse_attribute_time("09:30").is_some());
/// assert!(parse_attribute_time("09:30:15").is_some());
/// assert!(parse_attribute_time("25:00").is_none());
/// ```
pub fn parse_attribute_time(time_string: &str) -> Option<NaiveTime> {
    let trimmed = time_string.trim();
    ["%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|format_string| NaiveTime::parse_from_str(trimmed, format_string).ok())
}

/// Formats a parsable date as DD/MM/YYYY, falling back to the raw text.
pub fn format_date_display(date_string: &str) -> String {
    match parse_attribute_date(date_string) {
        Some(date) => format!("{:02}/{:02}/{}", date.day(), date.month(), date.year()),
        None => date_string.to_string(),
    }
}

/// Formats a parsable time as HH:MM, falling back to the raw text.
pub fn format_time_display(time_string: &str) -> String {
    match parse_attribute_time(time_string) {
        Some(time) => time.format("%H:%M").to_string(),
        None => time_string.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 12, 25);
        assert_eq!(parse_attribute_date("2023-12-25"), expected);
        assert_eq!(parse_attribute_date("2023/12/25"), expected);
        assert_eq!(parse_attribute_date(" 2023-12-25T15:45:30+00:00 "), expected);
        assert_eq!(parse_attribute_date("25-12-2023"), None);
    }

    #[test]
    fn parses_times_with_and_without_seconds() {
        assert_eq!(parse_attribute_time("07:05"), NaiveTime::from_hms_opt(7, 5, 0));
        assert_eq!(parse_attribute_time("07:05:09"), NaiveTime::from_hms_opt(7, 5, 9));
        assert_eq!(parse_attribute_time("noon"), None);
    }

    #[test]
    fn display_formatting_falls_back_to_raw_text() {
        assert_eq!(format_date_display("2023-12-25"), "25/12/2023");
        assert_eq!(format_date_display("soon"), "soon");
        assert_eq!(format_time_display("07:05:09"), "07:05");
        assert_eq!(format_time_display("later"), "later");
    }
}
