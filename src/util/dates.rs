use chrono::{DateTime, NaiveDate};

const LONG_DATE: &str = "%B %-d, %Y";

/// Format a date property value as `January 5, 2024`.
///
/// Accepts a calendar date (`2024-01-05`) or an RFC 3339 date-time, which is
/// formatted in its own offset. Empty input stays empty and anything else is
/// returned unchanged.
pub fn format_long_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format(LONG_DATE).to_string();
    }

    match DateTime::parse_from_rfc3339(raw) {
        Ok(datetime) => datetime.date_naive().format(LONG_DATE).to_string(),
        Err(_) => raw.to_string(),
    }
}
