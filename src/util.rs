use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, ScrapeError};

/// Every SIFF venue lists its times in Seattle local time.
pub const PACIFIC: Tz = chrono_tz::America::Los_Angeles;

static INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid integer regex"));

/// First run of digits in `text`, e.g. `"107 min."` -> 107.
pub fn parse_int(text: &str) -> Result<i64> {
    let digits = INT_RE
        .find(text)
        .ok_or_else(|| ScrapeError::NoIntegerFound(text.to_string()))?
        .as_str();
    digits
        .parse::<i64>()
        .map_err(|e| ScrapeError::Parse(format!("integer {digits} in {text:?}: {e}")))
}

/// True only when the whole string is an integer ("2024", not "2024*").
pub fn is_parseable_as_int(text: &str) -> bool {
    text.parse::<i64>().is_ok()
}

/// Converts a millisecond epoch (bare or wrapped, e.g. `/Date(1723773600000)/`)
/// into Pacific time.
pub fn datetime_from_millis(text: &str) -> Result<DateTime<Tz>> {
    let millis = parse_int(text)?;
    millis_to_pacific(millis)
}

pub fn millis_to_pacific(millis: i64) -> Result<DateTime<Tz>> {
    PACIFIC
        .timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| ScrapeError::Parse(format!("timestamp out of range: {millis}")))
}

/// Pacific calendar date `days_from_now` days ahead, formatted `%Y-%m-%d`.
pub fn date_delta(days_from_now: i64) -> String {
    let date = Utc::now().with_timezone(&PACIFIC) + Duration::days(days_from_now);
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_first_integer() {
        assert_eq!(parse_int("123").unwrap(), 123);
        assert_eq!(parse_int("abc123def").unwrap(), 123);
        assert_eq!(parse_int("107 min. 20 sec").unwrap(), 107);
    }

    #[test]
    fn parse_int_fails_without_digits() {
        let err = parse_int("abc").unwrap_err();
        assert!(matches!(err, ScrapeError::NoIntegerFound(ref s) if s == "abc"));
    }

    #[test]
    fn parse_int_reports_overflow_as_parse_error() {
        let err = parse_int("99999999999999999999 min.").unwrap_err();
        assert!(matches!(err, ScrapeError::Parse(ref s) if s.contains("99999999999999999999")));
    }

    #[test]
    fn int_parseability_is_whole_string() {
        assert!(is_parseable_as_int("2024"));
        assert!(!is_parseable_as_int("2024*"));
        assert!(!is_parseable_as_int("90 min."));
        assert!(!is_parseable_as_int(""));
    }

    #[test]
    fn converts_millis_to_pacific() {
        let dt = datetime_from_millis("1723449313000").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 8, 12));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (0, 55, 13));

        let wrapped = datetime_from_millis("/Date(1723773600000)/").unwrap();
        assert_eq!((wrapped.day(), wrapped.hour()), (15, 19));
    }

    #[test]
    fn date_delta_matches_pacific_today() {
        let today = Utc::now().with_timezone(&PACIFIC);
        assert_eq!(date_delta(0), today.format("%Y-%m-%d").to_string());
        assert_eq!(
            date_delta(7),
            (today + Duration::days(7)).format("%Y-%m-%d").to_string()
        );
    }
}
