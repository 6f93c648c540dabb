use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

/// Milliseconds in one calendar day.
pub const MS_PER_DAY: f64 = 86_400_000.0;

// ── Month abbreviations ───────────────────────────────────────────────────────

/// Three-letter month abbreviations used by the tracker's Portuguese export,
/// in calendar order.
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// Resolve a month abbreviation (case-insensitive) to its 1-based number.
pub fn month_from_abbreviation(abbrev: &str) -> Option<u32> {
    let lower = abbrev.to_lowercase();
    MONTH_ABBREVIATIONS
        .iter()
        .position(|m| *m == lower)
        .map(|idx| idx as u32 + 1)
}

// ── Date parser ───────────────────────────────────────────────────────────────

/// Parse a tracker export timestamp of the form `D/mon/YY HH:MM AM|PM`.
///
/// * `mon` is one of [`MONTH_ABBREVIATIONS`], any letter case.
/// * `YY` is always read as `2000 + YY`.
/// * The hour is on a 12-hour clock: `12 PM` stays 12, `12 AM` becomes 0 and
///   any other `PM` hour gets 12 added. Without a marker (or with anything
///   other than an upper-case `AM`/`PM`) the hour is taken as written.
///
/// The result is local wall-clock time. Returns `None` for empty input and
/// for any malformed component; failures are never propagated.
///
/// # Examples
///
/// ```
/// use chrono::{Datelike, Timelike};
/// use flow_core::dates::parse_export_date;
///
/// let dt = parse_export_date("15/mar/24 02:30 PM").unwrap();
/// assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 3, 15));
/// assert_eq!((dt.hour(), dt.minute()), (14, 30));
/// assert!(parse_export_date("31/xyz/24 10:00 AM").is_none());
/// ```
pub fn parse_export_date(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = parse_components(trimmed);
    if parsed.is_none() {
        debug!("could not parse export date \"{}\"", trimmed);
    }
    parsed
}

/// [`parse_export_date`] for optional input, as read from an unmapped field.
pub fn parse_optional_date(text: Option<&str>) -> Option<NaiveDateTime> {
    text.and_then(parse_export_date)
}

fn parse_components(s: &str) -> Option<NaiveDateTime> {
    let mut tokens = s.split_whitespace();
    let date_part = tokens.next()?;
    let time_part = tokens.next()?;
    let period = tokens.next();

    let mut date_fields = date_part.split('/');
    let day: u32 = date_fields.next()?.parse().ok()?;
    let month = month_from_abbreviation(date_fields.next()?)?;
    let year = two_digit_year(date_fields.next()?)?;
    if date_fields.next().is_some() {
        return None;
    }

    let (hours, minutes) = time_part.split_once(':')?;
    let mut hour: u32 = hours.parse().ok()?;
    let minute: u32 = minutes.parse().ok()?;

    match period {
        Some("PM") if hour != 12 => hour += 12,
        Some("AM") if hour == 12 => hour = 0,
        _ => {}
    }

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
}

/// `YY` → `2000 + YY`. Only one or two ASCII digits are accepted.
fn two_digit_year(s: &str) -> Option<i32> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<i32>().ok().map(|yy| 2000 + yy)
}

// ── Interval calculator ───────────────────────────────────────────────────────

/// Whole days from `start` to `end`, rounding any partial day up.
///
/// Identical instants give 0. When `end` precedes `start` the signed result
/// is returned unchanged (it will be zero or negative).
pub fn days_between_dates(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    let ms = (end - start).num_milliseconds();
    (ms as f64 / MS_PER_DAY).ceil() as i64
}

/// Parse both endpoints with [`parse_export_date`] and return the ceiling
/// day difference, or `None` when either endpoint is missing or malformed.
///
/// # Examples
///
/// ```
/// use flow_core::dates::days_between;
///
/// assert_eq!(days_between("01/jan/24 11:00 PM", "02/jan/24 01:00 AM"), Some(1));
/// assert_eq!(days_between("01/jan/24 11:00 PM", ""), None);
/// ```
pub fn days_between(start_text: &str, end_text: &str) -> Option<i64> {
    let start = parse_export_date(start_text)?;
    let end = parse_export_date(end_text)?;
    Some(days_between_dates(start, end))
}

/// Calendar month key `YYYY-MM`, used to group and order months.
pub fn month_key(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m").to_string()
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    // ── month_from_abbreviation ──────────────────────────────────────────────

    #[test]
    fn test_month_abbreviations_map_in_order() {
        for (idx, abbrev) in MONTH_ABBREVIATIONS.iter().enumerate() {
            assert_eq!(month_from_abbreviation(abbrev), Some(idx as u32 + 1));
        }
    }

    #[test]
    fn test_month_abbreviation_case_insensitive() {
        assert_eq!(month_from_abbreviation("DEZ"), Some(12));
        assert_eq!(month_from_abbreviation("Fev"), Some(2));
    }

    #[test]
    fn test_month_abbreviation_english_names_rejected() {
        assert_eq!(month_from_abbreviation("feb"), None);
        assert_eq!(month_from_abbreviation("dec"), None);
    }

    // ── parse_export_date ────────────────────────────────────────────────────

    #[test]
    fn test_parse_pm_afternoon() {
        let parsed = parse_export_date("15/mar/24 02:30 PM").unwrap();
        assert_eq!(parsed.day(), 15);
        assert_eq!(parsed.month0(), 2);
        assert_eq!(parsed.year(), 2024);
        assert_eq!(parsed.hour(), 14);
        assert_eq!(parsed.minute(), 30);
    }

    #[test]
    fn test_parse_noon_and_midnight() {
        assert_eq!(
            parse_export_date("1/jan/24 12:15 PM").unwrap(),
            dt(2024, 1, 1, 12, 15)
        );
        assert_eq!(
            parse_export_date("1/jan/24 12:15 AM").unwrap(),
            dt(2024, 1, 1, 0, 15)
        );
    }

    #[test]
    fn test_parse_am_morning_unchanged() {
        assert_eq!(
            parse_export_date("09/out/23 08:05 AM").unwrap(),
            dt(2023, 10, 9, 8, 5)
        );
    }

    #[test]
    fn test_parse_missing_marker_keeps_hour() {
        // No AM/PM: the hour is taken literally, never shifted.
        assert_eq!(
            parse_export_date("15/mar/24 02:30").unwrap(),
            dt(2024, 3, 15, 2, 30)
        );
        assert_eq!(
            parse_export_date("15/mar/24 14:30").unwrap(),
            dt(2024, 3, 15, 14, 30)
        );
    }

    #[test]
    fn test_parse_lowercase_marker_not_adjusted() {
        assert_eq!(
            parse_export_date("15/mar/24 02:30 pm").unwrap(),
            dt(2024, 3, 15, 2, 30)
        );
    }

    #[test]
    fn test_parse_two_digit_year_always_2000s() {
        assert_eq!(parse_export_date("1/jan/99 10:00 AM").unwrap().year(), 2099);
        assert_eq!(parse_export_date("1/jan/00 10:00 AM").unwrap().year(), 2000);
        assert_eq!(parse_export_date("1/jan/5 10:00 AM").unwrap().year(), 2005);
    }

    #[test]
    fn test_parse_four_digit_year_rejected() {
        assert!(parse_export_date("1/jan/2024 10:00 AM").is_none());
    }

    #[test]
    fn test_parse_empty_and_whitespace() {
        assert!(parse_export_date("").is_none());
        assert!(parse_export_date("   ").is_none());
        assert!(parse_optional_date(None).is_none());
    }

    #[test]
    fn test_parse_invalid_month() {
        assert!(parse_export_date("31/xyz/24 10:00 AM").is_none());
    }

    #[test]
    fn test_parse_malformed_components() {
        assert!(parse_export_date("15/mar/24").is_none());
        assert!(parse_export_date("aa/mar/24 10:00 AM").is_none());
        assert!(parse_export_date("15/mar/24 10h00 AM").is_none());
        assert!(parse_export_date("15-mar-24 10:00 AM").is_none());
        assert!(parse_export_date("15/mar/24/01 10:00 AM").is_none());
    }

    #[test]
    fn test_parse_impossible_calendar_date() {
        assert!(parse_export_date("30/fev/24 10:00 AM").is_none());
        assert!(parse_export_date("15/mar/24 25:00").is_none());
        assert!(parse_export_date("15/mar/24 11:60 AM").is_none());
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace() {
        assert_eq!(
            parse_export_date("  15/mar/24   02:30 PM ").unwrap(),
            dt(2024, 3, 15, 14, 30)
        );
    }

    // ── days_between ─────────────────────────────────────────────────────────

    #[test]
    fn test_days_between_identical_is_zero() {
        assert_eq!(days_between("15/mar/24 02:30 PM", "15/mar/24 02:30 PM"), Some(0));
    }

    #[test]
    fn test_days_between_rounds_partial_day_up() {
        // Two hours apart across midnight → 1, same as a 23:59 gap.
        assert_eq!(days_between("01/jan/24 11:00 PM", "02/jan/24 01:00 AM"), Some(1));
        assert_eq!(days_between("01/jan/24 12:00 AM", "01/jan/24 11:59 PM"), Some(1));
        assert_eq!(days_between("01/jan/24 10:00 AM", "01/jan/24 10:01 AM"), Some(1));
    }

    #[test]
    fn test_days_between_whole_days() {
        assert_eq!(days_between("01/jan/24 10:00 AM", "11/jan/24 10:00 AM"), Some(10));
        assert_eq!(days_between("01/jan/24 10:00 AM", "11/jan/24 10:01 AM"), Some(11));
    }

    #[test]
    fn test_days_between_negative_passes_through() {
        assert_eq!(days_between("11/jan/24 10:00 AM", "01/jan/24 10:00 AM"), Some(-10));
        // -0.5 days ceils to zero.
        assert_eq!(days_between("01/jan/24 10:00 PM", "01/jan/24 10:00 AM"), Some(0));
        assert_eq!(days_between("03/jan/24 10:00 PM", "01/jan/24 10:00 AM"), Some(-2));
    }

    #[test]
    fn test_days_between_missing_endpoint() {
        assert_eq!(days_between("", "01/jan/24 10:00 AM"), None);
        assert_eq!(days_between("01/jan/24 10:00 AM", "garbage"), None);
    }

    // ── month_key ────────────────────────────────────────────────────────────

    #[test]
    fn test_month_key_zero_padded() {
        assert_eq!(month_key(&dt(2024, 3, 15, 14, 30)), "2024-03");
        assert_eq!(month_key(&dt(2023, 12, 1, 0, 0)), "2023-12");
    }
}
