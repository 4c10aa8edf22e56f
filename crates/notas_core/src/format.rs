//! Display formatting for note dates.
//!
//! # Responsibility
//! - Render stored timestamps and due dates as short human-readable text
//!   (Spanish medium date + short time, e.g. `1 ene 2024, 9:05`).
//!
//! # Invariants
//! - Formatting never fails: absent input yields `""`, unparseable input is
//!   returned unchanged.

use chrono::{
    DateTime, Datelike, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Timelike, Utc,
};

const MONTHS_ES: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct", "nov", "dic",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Formats a date value in the machine's local time zone.
pub fn format_date(value: Option<&str>) -> String {
    let Some(raw) = non_empty(value) else {
        return String::new();
    };
    match parse_date_value(raw, &Local) {
        Some(instant) => render(&instant.with_timezone(&Local)),
        None => raw.to_string(),
    }
}

/// Formats a date value in an explicit UTC offset.
///
/// Naive date-times are interpreted in that offset, bare dates as UTC
/// midnight.
pub fn format_date_in(value: Option<&str>, offset: FixedOffset) -> String {
    let Some(raw) = non_empty(value) else {
        return String::new();
    };
    match parse_date_value(raw, &offset) {
        Some(instant) => render(&instant.with_timezone(&offset)),
        None => raw.to_string(),
    }
}

/// Formats a UTC timestamp in the machine's local time zone.
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    render(&value.with_timezone(&Local))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|raw| !raw.is_empty())
}

/// Parses the accepted representations into an absolute instant.
///
/// - RFC 3339 carries its own offset.
/// - Naive date-times are wall-clock time in `zone`.
/// - Bare `YYYY-MM-DD` is UTC midnight.
fn parse_date_value<Tz: TimeZone>(raw: &str, zone: &Tz) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return match zone.from_local_datetime(&naive) {
                LocalResult::Single(local) | LocalResult::Ambiguous(local, _) => {
                    Some(local.with_timezone(&Utc))
                }
                LocalResult::None => None,
            };
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

fn render<Tz: TimeZone>(value: &DateTime<Tz>) -> String {
    let month = MONTHS_ES[value.month0() as usize];
    format!(
        "{} {} {}, {}:{:02}",
        value.day(),
        month,
        value.year(),
        value.hour(),
        value.minute()
    )
}
