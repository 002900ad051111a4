//! Date helper functions

use chrono::{DateTime, Locale, TimeZone, Utc};
use chrono_tz::Tz;

/// Format a date using a date-fns style format string in the given locale
///
/// # Examples
/// ```ignore
/// format_date(&date, "dd MMM yyyy", Locale::pt_BR) // -> "15 mar 2021"
/// ```
pub fn format_date<Z: TimeZone>(date: &DateTime<Z>, format: &str, locale: Locale) -> String
where
    Z::Offset: std::fmt::Display,
{
    let chrono_format = date_fns_to_chrono_format(format);
    date.format_localized(&chrono_format, locale).to_string()
}

/// Format a UTC timestamp for display in a timezone
pub fn display_date(date: &DateTime<Utc>, tz: Tz, format: &str, locale: Locale) -> String {
    format_date(&date.with_timezone(&tz), format, locale)
}

/// Format a date in ISO 8601 / XML format, for `<time datetime>`
pub fn date_xml<Z: TimeZone>(date: &DateTime<Z>) -> String
where
    Z::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Resolve a language tag (`pt-BR`, `en`, `en_US`) to a chrono locale
pub fn parse_locale(language: &str) -> Option<Locale> {
    let normalized = language.trim().replace('-', "_");
    let locale = match normalized.as_str() {
        "pt" | "pt_BR" => Locale::pt_BR,
        "pt_PT" => Locale::pt_PT,
        "en" | "en_US" => Locale::en_US,
        "en_GB" => Locale::en_GB,
        "es" | "es_ES" => Locale::es_ES,
        "fr" | "fr_FR" => Locale::fr_FR,
        "de" | "de_DE" => Locale::de_DE,
        "it" | "it_IT" => Locale::it_IT,
        "ja" | "ja_JP" => Locale::ja_JP,
        "zh" | "zh_CN" => Locale::zh_CN,
        _ => return None,
    };
    Some(locale)
}

/// Convert date-fns format tokens to chrono format
fn date_fns_to_chrono_format(format: &str) -> String {
    // Longest tokens first within each field
    let replacements = [
        // Year
        ("yyyy", "%Y"),
        ("yy", "%y"),
        // Month
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        // Day of month
        ("dd", "%d"),
        // Weekday
        ("EEEE", "%A"),
        ("EEE", "%a"),
        // Time
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
    ];

    let mut result = format.to_string();

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_fns_to_chrono() {
        assert_eq!(date_fns_to_chrono_format("dd MMM yyyy"), "%d %b %Y");
        assert_eq!(date_fns_to_chrono_format("yyyy-MM-dd"), "%Y-%m-%d");
        assert_eq!(date_fns_to_chrono_format("HH:mm:ss"), "%H:%M:%S");
    }

    #[test]
    fn test_format_date_pt_br() {
        let date = Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap();
        assert_eq!(format_date(&date, "dd MMM yyyy", Locale::pt_BR), "15 mar 2021");
        let date = Utc.with_ymd_and_hms(2021, 2, 5, 8, 0, 0).unwrap();
        assert_eq!(format_date(&date, "dd MMM yyyy", Locale::pt_BR), "05 fev 2021");
    }

    #[test]
    fn test_display_date_timezone() {
        // 01:00 UTC is still the previous day in São Paulo
        let date = Utc.with_ymd_and_hms(2021, 4, 1, 1, 0, 0).unwrap();
        let tz: Tz = "America/Sao_Paulo".parse().unwrap();
        assert_eq!(
            display_date(&date, tz, "dd MMM yyyy", Locale::en_US),
            "31 Mar 2021"
        );
        assert_eq!(
            display_date(&date, Tz::UTC, "yyyy-MM-dd", Locale::en_US),
            "2021-04-01"
        );
    }

    #[test]
    fn test_parse_locale() {
        assert!(matches!(parse_locale("pt-BR"), Some(Locale::pt_BR)));
        assert!(matches!(parse_locale("en"), Some(Locale::en_US)));
        assert!(parse_locale("klingon").is_none());
    }

    #[test]
    fn test_date_xml() {
        let date = Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap();
        assert_eq!(date_xml(&date), "2021-03-15T19:25:28+00:00");
    }
}
