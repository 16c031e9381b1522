use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use tracing::warn;

/// Placeholder written by the data source when a timestamp was never
/// recorded.
pub const OPEN_SENTINEL: &str = "-";

/// Canonical timestamp layout used by the data source (`DD-MM-YYYY HH:MM:SS`).
pub const SOURCE_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Source layout with a fractional-seconds suffix.
const SOURCE_FORMAT_FRACTIONAL: &str = "%d-%m-%Y %H:%M:%S%.f";

/// Naive layouts tried in order after [`SOURCE_FORMAT`].
const FALLBACK_FORMATS: &[&str] = &[
    SOURCE_FORMAT_FRACTIONAL,
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

/// Date-only layouts; the time is taken as midnight.
const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d"];

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse a timestamp field as delivered by the data source.
///
/// Returns `None` ("unresolved") for a missing value, a blank string, the
/// [`OPEN_SENTINEL`], or any text that matches none of the accepted layouts.
/// Only the last case is logged, since the others are ordinary open events.
///
/// # Examples
///
/// ```
/// use maintenance_core::time_utils::parse_timestamp;
///
/// assert!(parse_timestamp(Some("01-02-2024 08:30:00")).is_some());
/// assert!(parse_timestamp(Some("-")).is_none());
/// assert!(parse_timestamp(None).is_none());
/// ```
pub fn parse_timestamp(value: Option<&str>) -> Option<NaiveDateTime> {
    let s = value?.trim();
    if s.is_empty() || s == OPEN_SENTINEL {
        return None;
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, SOURCE_FORMAT) {
        return Some(dt);
    }

    for fmt in FALLBACK_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    // Offset-qualified values are folded into UTC wall-clock time.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    warn!("could not parse timestamp \"{}\"; treating as unresolved", s);
    None
}

/// Render a timestamp back into the data source's layout.
///
/// Sub-second values keep their fraction so that the text parses back to the
/// same instant.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() == 0 {
        ts.format(SOURCE_FORMAT).to_string()
    } else {
        ts.format(SOURCE_FORMAT_FRACTIONAL).to_string()
    }
}

/// Signed number of hours from `start` to `end`.
///
/// Negative when the interval is inverted; callers decide how to clamp.
pub fn hours_between(start: &NaiveDateTime, end: &NaiveDateTime) -> f64 {
    (*end - *start).num_milliseconds() as f64 / 3_600_000.0
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_parse_source_format() {
        assert_eq!(
            parse_timestamp(Some("15-03-2024 14:05:09")),
            Some(dt(2024, 3, 15, 14, 5, 9))
        );
    }

    #[test]
    fn test_parse_is_day_first() {
        // 02-01 is the 2nd of January, not February 1st.
        let parsed = parse_timestamp(Some("02-01-2024 00:00:00")).unwrap();
        assert_eq!(parsed, dt(2024, 1, 2, 0, 0, 0));
    }

    #[test]
    fn test_parse_without_seconds() {
        assert_eq!(
            parse_timestamp(Some("01-01-2024 08:00")),
            Some(dt(2024, 1, 1, 8, 0, 0))
        );
        assert_eq!(
            parse_timestamp(Some("2024-01-01 10:00")),
            Some(dt(2024, 1, 1, 10, 0, 0))
        );
    }

    #[test]
    fn test_parse_slash_format() {
        assert_eq!(
            parse_timestamp(Some("31/12/2023 23:59:59")),
            Some(dt(2023, 12, 31, 23, 59, 59))
        );
    }

    #[test]
    fn test_parse_iso_and_rfc3339() {
        assert_eq!(
            parse_timestamp(Some("2024-05-01T06:30:00")),
            Some(dt(2024, 5, 1, 6, 30, 0))
        );
        assert_eq!(
            parse_timestamp(Some("2024-05-01T06:30:00-03:00")),
            Some(dt(2024, 5, 1, 9, 30, 0))
        );
    }

    #[test]
    fn test_parse_date_only_is_midnight() {
        let parsed = parse_timestamp(Some("10-10-2024")).unwrap();
        assert_eq!(parsed.hour(), 0);
        assert_eq!(parsed.minute(), 0);
    }

    #[test]
    fn test_parse_unresolved_values() {
        assert!(parse_timestamp(None).is_none());
        assert!(parse_timestamp(Some("")).is_none());
        assert!(parse_timestamp(Some("   ")).is_none());
        assert!(parse_timestamp(Some("-")).is_none());
        assert!(parse_timestamp(Some(" - ")).is_none());
        assert!(parse_timestamp(Some("not a date")).is_none());
        assert!(parse_timestamp(Some("32-13-2024 25:61:00")).is_none());
    }

    #[test]
    fn test_format_timestamp_round_trips() {
        let ts = dt(2024, 7, 4, 9, 8, 7);
        let text = format_timestamp(&ts);
        assert_eq!(text, "04-07-2024 09:08:07");
        assert_eq!(parse_timestamp(Some(&text)), Some(ts));
    }

    #[test]
    fn test_format_timestamp_keeps_fraction() {
        let ts = parse_timestamp(Some("2024-01-01T08:00:00.5")).unwrap();
        let text = format_timestamp(&ts);
        assert_eq!(text, "01-01-2024 08:00:00.500");
        assert_eq!(parse_timestamp(Some(&text)), Some(ts));
    }

    #[test]
    fn test_hours_between_counts_fractional_seconds() {
        let start = parse_timestamp(Some("2024-01-01T08:00:00.5")).unwrap();
        let end = dt(2024, 1, 1, 10, 0, 0);
        let expected = 2.0 - 0.5 / 3600.0;
        assert!((hours_between(&start, &end) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_hours_between() {
        let start = dt(2024, 1, 1, 8, 0, 0);
        let end = dt(2024, 1, 1, 10, 30, 0);
        assert!((hours_between(&start, &end) - 2.5).abs() < 1e-9);
        assert!((hours_between(&end, &start) + 2.5).abs() < 1e-9);
    }
}
