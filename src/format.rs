//! Display formatting for prices, changes and timestamps.

use crate::models::Direction;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};

/// Format a price as `$123.45`.
pub fn currency(value: f64) -> String {
    format!("${:.2}", value)
}

/// Sign prefix for a direction. Down values carry their own minus sign.
pub fn sign(direction: Direction) -> &'static str {
    if direction.is_up() { "+" } else { "" }
}

/// Signed change, e.g. `+2.50` or `-1.25`.
pub fn signed_change(change: f64, direction: Direction) -> String {
    format!("{}{:.2}", sign(direction), change)
}

/// Signed percent change, e.g. `+0.57%`.
pub fn signed_percent(percent: f64, direction: Direction) -> String {
    format!("{}{:.2}%", sign(direction), percent)
}

/// Signed currency change as shown in the modal header, e.g. `+$2.50`.
pub fn signed_currency(change: f64, direction: Direction) -> String {
    format!("{}${:.2}", sign(direction), change)
}

pub fn arrow(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "▲",
        Direction::Down => "▼",
    }
}

/// Parse an article timestamp. Accepts RFC 3339 and offset-less ISO 8601 (taken as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Article date in `tz`, e.g. `Feb 3, 2026, 10:00 AM`. Unparseable input is returned as-is.
pub fn published<Tz>(raw: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match parse_timestamp(raw) {
        Some(ts) => ts
            .with_timezone(tz)
            .format("%b %-d, %Y, %I:%M %p")
            .to_string(),
        None => raw.to_string(),
    }
}

/// `Last updated: HH:MM:SS` label.
pub fn last_updated<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("Last updated: {}", at.format("%H:%M:%S"))
}
