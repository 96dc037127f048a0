//! Type inference engine for columns of raw spreadsheet cells.
//!
//! Every non-missing value of a column is tested against each type rule and
//! the first rule that *all* values satisfy wins, in this priority order:
//!
//! 1. **Numeric**: the value coerces to a finite number
//! 2. **Boolean**: a boolean cell or the literal text `true`/`false`
//! 3. **Datetime**: the value parses as a date and does not parse as a number,
//!    so `"2024"` never becomes a date
//!
//! Columns matching none of the rules are categorical. A column without any
//! non-missing value is unknown.
//!
//! # Example
//!
//! ```rust
//! use datadeck::analyzers::{ColumnType, TypeInferenceEngine};
//! use datadeck::table::CellValue;
//!
//! let engine = TypeInferenceEngine::new();
//! let values = vec![CellValue::from("active"), CellValue::from("inactive")];
//! assert_eq!(engine.infer(&values), ColumnType::Categorical);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::types::{ColumnType, ColumnTypes};
use crate::table::{CellValue, RowSet};

/// Type inference result together with the statistics behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeInferenceResult {
    /// The inferred column type
    pub column_type: ColumnType,
    /// Number of values inspected, missing included
    pub samples_analyzed: usize,
    /// Number of missing values encountered
    pub missing_count: usize,
    /// Per-rule match counts
    pub stats: TypeStats,
}

/// Type detection statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeStats {
    pub total_samples: usize,
    pub missing_count: usize,
    pub numeric_matches: usize,
    pub boolean_matches: usize,
    pub datetime_matches: usize,
}

impl TypeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of values that took part in type detection.
    pub fn present_count(&self) -> usize {
        self.total_samples - self.missing_count
    }
}

/// Infers a [`ColumnType`] from raw values.
///
/// The engine is stateless: the same values always yield the same type.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeInferenceEngine;

impl TypeInferenceEngine {
    /// Create a TypeInferenceEngine.
    pub fn new() -> Self {
        Self
    }

    /// Infer the type of a sequence of cell values.
    pub fn infer<'a, I>(&self, values: I) -> ColumnType
    where
        I: IntoIterator<Item = &'a CellValue>,
    {
        self.determine_type(&self.analyze_samples(values))
    }

    /// Infer a type and return the statistics that produced it.
    pub fn infer_with_stats<'a, I>(&self, values: I) -> TypeInferenceResult
    where
        I: IntoIterator<Item = &'a CellValue>,
    {
        let stats = self.analyze_samples(values);
        TypeInferenceResult {
            column_type: self.determine_type(&stats),
            samples_analyzed: stats.total_samples,
            missing_count: stats.missing_count,
            stats,
        }
    }

    /// Infer the type of one column of a row set. Absent columns are unknown.
    pub fn infer_column(&self, rows: &RowSet, column: &str) -> ColumnType {
        match rows.column_values(column) {
            Some(values) => self.infer(values),
            None => ColumnType::Unknown,
        }
    }

    /// Infer the type of every column of a row set.
    #[instrument(skip(self, rows), fields(columns = rows.columns().len(), rows = rows.len()))]
    pub fn infer_columns(&self, rows: &RowSet) -> ColumnTypes {
        rows.columns()
            .iter()
            .map(|column| {
                let column_type = self.infer_column(rows, column);
                debug!(column = %column, inferred_type = %column_type, "Inferred column type");
                (column.clone(), column_type)
            })
            .collect()
    }

    /// Count rule matches over the non-missing values.
    pub fn analyze_samples<'a, I>(&self, values: I) -> TypeStats
    where
        I: IntoIterator<Item = &'a CellValue>,
    {
        let mut stats = TypeStats::new();
        for value in values {
            stats.total_samples += 1;
            if value.is_missing() {
                stats.missing_count += 1;
                continue;
            }
            self.test_patterns(value, &mut stats);
        }
        stats
    }

    /// Test a value against every type rule.
    pub fn test_patterns(&self, value: &CellValue, stats: &mut TypeStats) {
        if value.as_number().is_some() {
            stats.numeric_matches += 1;
        }
        if value.is_boolean_like() {
            stats.boolean_matches += 1;
        }
        if value.is_date_like() {
            stats.datetime_matches += 1;
        }
    }

    /// Pick the first rule satisfied by every non-missing value.
    pub fn determine_type(&self, stats: &TypeStats) -> ColumnType {
        let present = stats.present_count();
        if present == 0 {
            return ColumnType::Unknown;
        }

        if stats.numeric_matches == present {
            ColumnType::Numeric
        } else if stats.boolean_matches == present {
            ColumnType::Boolean
        } else if stats.datetime_matches == present {
            ColumnType::Datetime
        } else {
            ColumnType::Categorical
        }
    }
}
