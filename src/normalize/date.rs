//! Date normalization: free-form date strings to comparable UTC instants.
//!
//! Dates are stored exactly as received; normalization happens only when a
//! sort key is needed. The fallback chain is an explicit ordered list of
//! parsers so the precedence stays auditable and easy to extend.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::debug;

type DateParser = fn(&str) -> Option<DateTime<Utc>>;

/// Parsers tried in order; the first success wins.
const CHAIN: &[DateParser] = &[
    parse_rfc2822_offset,
    parse_rfc2822_utc_literal,
    parse_rfc2822_naive,
    parse_no_weekday_offset,
];

/// Produce a UTC sort key for a message date string.
///
/// Never fails: a date that defeats every parser in the chain yields the
/// current wall-clock time, which places malformed-date messages at the
/// most-recent end of a newest-first listing.
pub fn sort_key(raw: &str) -> DateTime<Utc> {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        for parser in CHAIN {
            if let Some(dt) = parser(trimmed) {
                return dt;
            }
        }
    }
    debug!(date = raw, "unparseable date, sorting as most recent");
    Utc::now()
}

/// Current time in the storage format used for generated messages,
/// e.g. `"Thu, 04 Jan 2024 10:00:00 +0000"`.
pub fn now_rfc2822() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S +0000").to_string()
}

fn parse_rfc2822_offset(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(s, "%a, %d %b %Y %H:%M:%S %z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_rfc2822_utc_literal(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%a, %d %b %Y %H:%M:%S +0000")
        .ok()
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

fn parse_rfc2822_naive(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%a, %d %b %Y %H:%M:%S")
        .ok()
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

fn parse_no_weekday_offset(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(s, "%d %b %Y %H:%M:%S %z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
