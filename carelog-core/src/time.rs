//! Time utilities: backend timestamps, viewer-local wall clock, month math.
//!
//! Every instant inside the crate is a `NaiveDateTime` on the viewer's wall
//! clock. Offset-carrying timestamps are converted into the viewer timezone
//! once, at parse time; naive ones are taken as already local.

use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an IANA timezone name like "America/Santiago".
pub fn parse_timezone(tz: &str) -> Result<Tz> {
    tz.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

/// Parse a backend timestamp into the viewer's wall clock.
///
/// Accepts RFC 3339 (with `Z` or an offset) and naive ISO-8601 with either a
/// `T` or a space separator, with or without seconds.
pub fn parse_timestamp(raw: &str, tz: Tz) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&tz).naive_local());
    }

    if let Ok(ndt) = raw.parse::<NaiveDateTime>() {
        return Some(ndt);
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// The viewer's wall clock for a UTC instant.
pub fn local_now(now_utc: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    now_utc.with_timezone(&tz).naive_local()
}

/// `[midnight, next midnight)` of the given date.
pub fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(NaiveTime::MIN);
    (start, start + Duration::days(1))
}

/// `[YYYY-MM-01T00:00, next month 01T00:00)`, or `None` for a bad month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((
        first.and_time(NaiveTime::MIN),
        next.and_time(NaiveTime::MIN),
    ))
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (start, end) = month_bounds(year, month)?;
    Some((end.date() - start.date()).num_days() as u32)
}

/// Zero-padded 24-hour `HH:MM`.
pub fn format_hhmm(dt: NaiveDateTime) -> String {
    dt.format("%H:%M").to_string()
}

/// Naive ISO-8601 as the backend expects in request bodies.
pub fn to_wire(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// True if `dt` falls in the given year/month.
pub fn in_month(dt: NaiveDateTime, year: i32, month: u32) -> bool {
    dt.year() == year && dt.month() == month
}
