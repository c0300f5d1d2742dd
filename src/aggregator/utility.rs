//! Numeric and timestamp parsing helpers shared by the aggregation pass.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::aggregator::types::Value;

/// Rounds half away from zero to the given number of fractional digits.
pub fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

/// Parses a cell as f64, yielding NaN for anything non-numeric. Used for
/// altitude and speed, where bad cells are kept as sentinels rather than
/// dropping the row.
pub fn parse_f64(token: &str) -> f64 {
    token.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Numeric-if-possible coercion for extra attribute cells: a finite numeric
/// token becomes `Number` rounded to 3 decimals, everything else stays
/// `Text` verbatim.
pub fn coerce(token: &str) -> Value {
    let trimmed = token.trim();
    if !trimmed.is_empty() {
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return Value::Number(round_to(n, 3));
            }
        }
    }
    Value::Text(token.to_string())
}

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses a timestamp cell, forcing UTC interpretation.
///
/// Offset-bearing strings are converted to UTC; bare date-times are taken as
/// already being UTC, so a file parses identically regardless of the host
/// timezone. Unparseable cells yield None.
pub fn parse_timestamp_utc(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(10.1234564, 6), 10.123456);
        assert_eq!(round_to(10.1234567, 6), 10.123457);
        assert_eq!(round_to(1.00051, 3), 1.001);
        assert_eq!(round_to(-2.5, 0), -3.0);
    }

    #[test]
    fn test_parse_f64_non_numeric_is_nan() {
        assert!(parse_f64("n/a").is_nan());
        assert!(parse_f64("").is_nan());
        assert_eq!(parse_f64(" 12.5 "), 12.5);
    }

    #[test]
    fn test_coerce_numeric_rounds_to_three() {
        assert_eq!(coerce("3.14159"), Value::Number(3.142));
        assert_eq!(coerce(" 7 "), Value::Number(7.0));
    }

    #[test]
    fn test_coerce_keeps_text_verbatim() {
        assert_eq!(coerce("red"), Value::Text("red".to_string()));
        assert_eq!(coerce(""), Value::Text(String::new()));
        // Non-finite tokens are not treated as numbers.
        assert_eq!(coerce("NaN"), Value::Text("NaN".to_string()));
        assert_eq!(coerce("inf"), Value::Text("inf".to_string()));
    }

    #[test]
    fn test_parse_timestamp_bare_is_utc() {
        let ts = parse_timestamp_utc("2020-01-01T06:30:00").unwrap();
        assert_eq!(ts.timestamp(), 1577860200);
    }

    #[test]
    fn test_parse_timestamp_offset_converted() {
        let ts = parse_timestamp_utc("2020-01-01T06:30:00+02:00").unwrap();
        assert_eq!(ts.timestamp(), 1577860200 - 7200);
    }

    #[test]
    fn test_parse_timestamp_space_separator_and_date_only() {
        assert!(parse_timestamp_utc("2020-01-01 06:30:00").is_some());
        let midnight = parse_timestamp_utc("2020-01-01").unwrap();
        assert_eq!(midnight.timestamp() % 86_400, 0);
    }

    #[test]
    fn test_parse_timestamp_garbage_is_none() {
        assert!(parse_timestamp_utc("yesterday").is_none());
        assert!(parse_timestamp_utc("").is_none());
    }
}
