//! Shared types for the analyzer framework.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic type inferred for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Every non-missing value coerces to a finite number.
    Numeric,
    /// Anything that is not one of the other types.
    Categorical,
    /// Every non-missing value parses as a date and is not a plain number.
    Datetime,
    /// Every non-missing value is `true`/`false`.
    Boolean,
    /// No non-missing values to inspect.
    Unknown,
}

impl ColumnType {
    /// Returns the lowercase type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Categorical => "categorical",
            ColumnType::Datetime => "datetime",
            ColumnType::Boolean => "boolean",
            ColumnType::Unknown => "unknown",
        }
    }

    /// Whether min/max range filters apply to columns of this type.
    pub fn supports_range(&self) -> bool {
        matches!(self, ColumnType::Numeric | ColumnType::Datetime)
    }

    /// Whether profiles of this type carry a frequency table.
    pub fn has_frequency_table(&self) -> bool {
        matches!(self, ColumnType::Categorical | ColumnType::Boolean)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Column name to inferred type.
pub type ColumnTypes = BTreeMap<String, ColumnType>;
