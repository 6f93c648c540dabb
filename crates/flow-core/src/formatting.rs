use chrono::{Datelike, NaiveDateTime};

use crate::dates::month_from_abbreviation;

/// Full Portuguese month names, January first.
const MONTH_NAMES_PT: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Label used for items without a type after normalisation.
pub const UNKNOWN_LABEL: &str = "desconhecido";

/// Format the month of `dt` the way the pt-BR locale writes "month long,
/// year numeric".
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use flow_core::formatting::month_label;
///
/// let dt = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// assert_eq!(month_label(&dt), "março de 2024");
/// ```
pub fn month_label(dt: &NaiveDateTime) -> String {
    let name = MONTH_NAMES_PT[dt.month0() as usize];
    format!("{} de {}", name, dt.year())
}

/// Round a day count to the nearest whole day and suffix it with `d`.
///
/// ```
/// use flow_core::formatting::format_days;
///
/// assert_eq!(format_days(12.4), "12d");
/// assert_eq!(format_days(2.5), "3d");
/// ```
pub fn format_days(days: f64) -> String {
    format!("{}d", days.round() as i64)
}

/// Format a `0..=100` share with `decimals` places and a `%` suffix.
pub fn format_percentage(value: f64, decimals: usize) -> String {
    format!("{:.prec$}%", value, prec = decimals)
}

/// Shorten an export timestamp (`5/mar/24 10:00 AM`) to `5/03/24`.
///
/// Returns `"-"` when the text does not start with a `D/mon/YY` date.
pub fn format_short_date(text: &str) -> String {
    let Some(date_part) = text.split_whitespace().next() else {
        return "-".to_string();
    };
    let mut fields = date_part.split('/');
    let (Some(day), Some(mon), Some(year)) = (fields.next(), fields.next(), fields.next()) else {
        return "-".to_string();
    };
    match (day.parse::<u32>(), month_from_abbreviation(mon)) {
        (Ok(day), Some(month)) if !year.is_empty() => format!("{}/{:02}/{}", day, month, year),
        _ => "-".to_string(),
    }
}

/// Normalise a free-text label for grouping: trim, lower-case and strip the
/// diacritics that occur in Portuguese. Empty input maps to
/// [`UNKNOWN_LABEL`].
///
/// ```
/// use flow_core::formatting::normalize_label;
///
/// assert_eq!(normalize_label("  Histórias "), "historias");
/// assert_eq!(normalize_label(""), "desconhecido");
/// ```
pub fn normalize_label(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return UNKNOWN_LABEL.to_string();
    }
    trimmed.to_lowercase().chars().map(fold_diacritic).collect()
}

/// Strips the accents used in Portuguese and Spanish tracker labels. Any
/// other character, including precomposed letters outside this table and
/// standalone combining marks, passes through unchanged.
fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
