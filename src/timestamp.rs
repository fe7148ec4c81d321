// src/timestamp.rs
use chrono::{DateTime, NaiveDateTime, Timelike, Utc};

/// RFC-1123 with a literal GMT zone, e.g. `Sat, 18 Oct 2026 09:30:00 GMT`.
pub const RFC1123_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

pub fn format_rfc1123(ts: DateTime<Utc>) -> String {
    ts.format(RFC1123_FORMAT).to_string()
}

/// Accepts the RFC-1123 form we write, plus generic RFC 2822 and RFC 3339.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, RFC1123_FORMAT)
        .map(|n| n.and_utc())
        .or_else(|_| DateTime::parse_from_rfc2822(s).map(|d| d.with_timezone(&Utc)))
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|d| d.with_timezone(&Utc)))
        .ok()
}

/// Drop sub-second precision so values survive a save/load cycle unchanged.
pub fn truncate_to_secs(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_nanosecond(0).unwrap_or(ts)
}
