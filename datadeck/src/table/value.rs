//! Raw scalar cell values.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::coerce::{format_number, parse_date_millis, parse_number};

/// A single raw cell as ingested from a spreadsheet.
///
/// Serialises untagged, so `null`, `true`, `1.5` and `"text"` map straight to
/// their JSON counterparts and `null` stays distinct from `""`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Returns true for `null` and the empty string. Whitespace-only text is a
    /// present value.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Bool(_) | CellValue::Number(_) => false,
        }
    }

    /// The stringified form used for grouping, allow-lists and frequency tables.
    pub fn key(&self) -> Cow<'_, str> {
        match self {
            CellValue::Null => Cow::Borrowed("null"),
            CellValue::Bool(true) => Cow::Borrowed("true"),
            CellValue::Bool(false) => Cow::Borrowed("false"),
            CellValue::Number(n) => Cow::Owned(format_number(*n)),
            CellValue::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }

    /// Coerces the cell to a finite number, if it is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Text(s) => parse_number(s),
            _ => None,
        }
    }

    /// Coerces the cell to epoch milliseconds.
    ///
    /// Number cells are read as epoch milliseconds already.
    pub fn as_timestamp_millis(&self) -> Option<i64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n as i64),
            CellValue::Text(s) => parse_date_millis(s),
            _ => None,
        }
    }

    /// Returns true for boolean cells and the literal strings `"true"`/`"false"`.
    pub fn is_boolean_like(&self) -> bool {
        match self {
            CellValue::Bool(_) => true,
            CellValue::Text(s) => s == "true" || s == "false",
            _ => false,
        }
    }

    /// Returns true when the cell parses as a date and is not a plain number.
    pub fn is_date_like(&self) -> bool {
        match self {
            CellValue::Text(s) => parse_date_millis(s).is_some() && parse_number(s).is_none(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(f64::from(value))
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}
