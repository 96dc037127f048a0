//! Text-to-number and text-to-date coercion shared by every engine.
//!
//! Inference, profiling, filtering and aggregation must agree on what counts
//! as a number or a date, so the rules live here and nowhere else.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static RADIX_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0([xX][0-9a-fA-F]+|[oO][0-7]+|[bB][01]+)$").expect("valid regex"));

static DECIMAL_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("valid regex")
});

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
];

/// Parses a text cell as a finite number.
///
/// Accepts decimal literals (`12`, `-3.5`, `.5`, `5.`, `1e3`, `+7`) and
/// `0x`/`0o`/`0b` integer literals. Surrounding whitespace is ignored.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(n) = parse_decimal(trimmed) {
        return Some(n);
    }

    if RADIX_LITERAL.is_match(trimmed) {
        let (radix, digits) = match trimmed.as_bytes()[1] {
            b'x' | b'X' => (16, &trimmed[2..]),
            b'o' | b'O' => (8, &trimmed[2..]),
            _ => (2, &trimmed[2..]),
        };
        return u64::from_str_radix(digits, radix).ok().map(|n| n as f64);
    }

    None
}

/// Parses a plain decimal literal, without trimming and without radix prefixes.
pub fn parse_decimal(text: &str) -> Option<f64> {
    if !DECIMAL_LITERAL.is_match(text) {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parses a text cell as a point in time, returning epoch milliseconds (UTC).
///
/// Values without an offset are read as UTC.
pub fn parse_date_millis(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if trimmed.len() < 6 || !trimmed.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.timestamp_millis());
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date_millis(date);
        }
    }

    // Year-month, e.g. "2024-03"
    if trimmed.len() == 7 && trimmed.as_bytes()[4] == b'-' {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d") {
            return date_millis(date);
        }
    }

    None
}

fn date_millis(date: NaiveDate) -> Option<i64> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Renders a number the way it is shown to users and used as a grouping key:
/// integral values without a fractional part, `-0` as `0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        format!("{value}")
    }
}
