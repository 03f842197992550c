//! Date parsing for messy register cells
//!
//! Accepts Excel serials, ISO dates, `DD/MM/YYYY`, free-form "Month YYYY"
//! (English and French month names) and a handful of fallback formats.
//! Unparseable input, including sentinels like "TBD", yields `None` rather
//! than an error.

use calamine::Data;
use chrono::{Duration, NaiveDate};

/// Largest serial we accept (year 9999)
const MAX_SERIAL: f64 = 2_958_465.0;

/// Smallest serial accepted when typed as text (1927-05-18). Anything below
/// this is far more likely a bare year like "2024" than a date.
const MIN_TEXT_SERIAL: f64 = 10_000.0;

/// Parse a date from any cell representation
pub fn parse_date_cell(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime().map(|ndt| ndt.date()),
        Data::Float(f) => excel_serial_date(*f, false),
        Data::Int(i) => excel_serial_date(*i as f64, false),
        Data::String(s) => parse_date_str(s),
        Data::DateTimeIso(s) => parse_date_str(s),
        _ => None,
    }
}

/// Convert an Excel serial number to a calendar date.
///
/// 1900 system serials count from 1899-12-31 and include the phantom
/// 1900-02-29, so serials from 61 up use the 1899-12-30 epoch instead.
/// 1904 system serials count from 1904-01-01.
pub fn excel_serial_date(serial: f64, is_1904: bool) -> Option<NaiveDate> {
    if !serial.is_finite() || serial <= 0.0 || serial > MAX_SERIAL {
        return None;
    }
    let days = serial.floor() as i64;
    let epoch = if is_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else if days >= 61 {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    };
    epoch.checked_add_signed(Duration::days(days))
}

const SENTINELS: &[&str] = &["tbd", "tba", "n/a", "na", "-", "–", "?", "à définir", "a definir"];

const FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// Parse a date from free text
pub fn parse_date_str(input: &str) -> Option<NaiveDate> {
    let text = input.trim();
    if text.is_empty() {
        return None;
    }
    let lower = text.to_lowercase();
    if SENTINELS.contains(&lower.as_str()) {
        return None;
    }

    for fmt in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(date);
        }
    }
    // ISO timestamps ("2024-03-01T00:00:00" and friends)
    if let Some(prefix) = text.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }
    if let Some(date) = parse_month_year(&lower) {
        return Some(date);
    }
    // Serial typed as text
    if let Ok(serial) = text.parse::<f64>() {
        if serial >= MIN_TEXT_SERIAL {
            return excel_serial_date(serial, false);
        }
    }
    None
}

/// "Month YYYY" in English or French, resolved to the first of the month
fn parse_month_year(lower: &str) -> Option<NaiveDate> {
    let mut parts = lower.split_whitespace();
    let month = month_number(parts.next()?)?;
    let year: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !(1900..=9999).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn month_number(name: &str) -> Option<u32> {
    let stems: [&[&str]; 12] = [
        &["jan"],
        &["feb", "fév", "fev"],
        &["mar"],
        &["apr", "avr"],
        &["may", "mai"],
        &["jun", "juin"],
        &["jul", "juil"],
        &["aug", "août", "aou"],
        &["sep"],
        &["oct"],
        &["nov"],
        &["dec", "déc"],
    ];
    for (idx, candidates) in stems.iter().enumerate() {
        if candidates.iter().any(|s| name.starts_with(s)) {
            return Some(idx as u32 + 1);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_iso_and_slash_formats() {
        assert_eq!(parse_date_str("2024-06-30"), Some(d(2024, 6, 30)));
        assert_eq!(parse_date_str("30/06/2024"), Some(d(2024, 6, 30)));
        assert_eq!(parse_date_str(" 01/01/2025 "), Some(d(2025, 1, 1)));
    }

    #[test]
    fn test_month_year() {
        assert_eq!(parse_date_str("January 2024"), Some(d(2024, 1, 1)));
        assert_eq!(parse_date_str("janvier 2024"), Some(d(2024, 1, 1)));
        assert_eq!(parse_date_str("Août 2023"), Some(d(2023, 8, 1)));
        assert_eq!(parse_date_str("Dec 2025"), Some(d(2025, 12, 1)));
    }

    #[test]
    fn test_sentinels_are_none() {
        assert_eq!(parse_date_str("TBD"), None);
        assert_eq!(parse_date_str("n/a"), None);
        assert_eq!(parse_date_str("-"), None);
        assert_eq!(parse_date_str(""), None);
        assert_eq!(parse_date_str("garbage"), None);
    }

    #[test]
    fn test_excel_serials() {
        // Known modern serials, 1900 system
        assert_eq!(excel_serial_date(45292.0, false), Some(d(2024, 1, 1)));
        assert_eq!(excel_serial_date(36526.0, false), Some(d(2000, 1, 1)));
        // Early serials sit before the phantom leap day
        assert_eq!(excel_serial_date(1.0, false), Some(d(1900, 1, 1)));
        assert_eq!(excel_serial_date(59.0, false), Some(d(1900, 2, 28)));
        // 1904 system
        assert_eq!(excel_serial_date(0.0, true), None);
        assert_eq!(excel_serial_date(366.0, true), Some(d(1905, 1, 1)));
        assert_eq!(excel_serial_date(-1.0, false), None);
    }

    #[test]
    fn test_serial_as_text() {
        assert_eq!(parse_date_str("45292"), Some(d(2024, 1, 1)));
    }

    #[test]
    fn test_bare_years_are_not_serials() {
        assert_eq!(parse_date_str("2024"), None);
        assert_eq!(parse_date_str("1999"), None);
        assert_eq!(parse_date_str("9999"), None);
        // The floor only affects text; numeric cells keep low serials
        assert_eq!(parse_date_cell(&Data::Float(2024.0)), Some(d(1905, 7, 16)));
    }

    #[test]
    fn test_cell_variants() {
        assert_eq!(parse_date_cell(&Data::Float(45292.0)), Some(d(2024, 1, 1)));
        assert_eq!(parse_date_cell(&Data::Int(45292)), Some(d(2024, 1, 1)));
        assert_eq!(
            parse_date_cell(&Data::String("March 2024".into())),
            Some(d(2024, 3, 1))
        );
        assert_eq!(parse_date_cell(&Data::Empty), None);
        assert_eq!(parse_date_cell(&Data::Bool(true)), None);
    }
}
