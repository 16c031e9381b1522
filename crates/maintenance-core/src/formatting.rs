use std::sync::OnceLock;

use regex::Regex;

/// Round `value` to `decimal_places`.
///
/// # Examples
///
/// ```
/// use maintenance_core::formatting::round_to;
///
/// assert_eq!(round_to(2.345_6, 2), 2.35);
/// assert_eq!(round_to(10.0, 2), 10.0);
/// ```
pub fn round_to(value: f64, decimal_places: u32) -> f64 {
    let factor = 10_f64.powi(decimal_places as i32);
    (value * factor).round() / factor
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
///
/// # Examples
///
/// ```
/// use maintenance_core::formatting::percentage;
///
/// assert_eq!(percentage(1.0, 3.0, 2), 33.33);
/// assert_eq!(percentage(0.0, 0.0, 2), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    round_to((part / whole) * 100.0, decimal_places)
}

/// Render a duration in hours as `HH:MM`, rounding to the nearest minute.
///
/// Hours are not wrapped at 24, so long repairs read e.g. `"31:15"`.
/// Negative or non-finite input renders as `"00:00"`.
///
/// # Examples
///
/// ```
/// use maintenance_core::formatting::format_hours_hhmm;
///
/// assert_eq!(format_hours_hhmm(2.0), "02:00");
/// assert_eq!(format_hours_hhmm(1.75), "01:45");
/// assert_eq!(format_hours_hhmm(31.25), "31:15");
/// ```
pub fn format_hours_hhmm(hours: f64) -> String {
    let total_minutes = if hours.is_finite() && hours > 0.0 {
        (hours * 60.0).round() as i64
    } else {
        0
    };
    format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
}

fn hhmm_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*(\d+):([0-5]\d)\s*$").expect("regex is valid"))
}

/// Parse an `HH:MM` string back into hours (`H + M/60`).
///
/// Inverse of [`format_hours_hhmm`] up to the minute rounding applied there.
pub fn parse_hhmm(text: &str) -> Option<f64> {
    let caps = hhmm_pattern().captures(text)?;
    let hours: f64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: f64 = caps.get(2)?.as_str().parse().ok()?;
    Some(hours + minutes / 60.0)
}

/// Format a percentage with two decimals and a `%` suffix.
pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
