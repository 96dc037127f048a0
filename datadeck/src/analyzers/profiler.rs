//! Column profiling over an in-memory row set.
//!
//! Every profile carries the missing-value counts, the distinct-value count and
//! the column type. On top of that, numeric columns get summary statistics and
//! categorical or boolean columns get a frequency table of their most common
//! values.
//!
//! A profile describes exactly one row set. Filtering the rows means profiling
//! again; see [`ProfileRecomputer`](super::ProfileRecomputer).
//!
//! # Example
//!
//! ```rust
//! use datadeck::analyzers::{ColumnProfiler, ColumnType};
//! use datadeck::table::{CellValue, RowSet};
//!
//! let rows = RowSet::from_cells(
//!     ["age"],
//!     vec![vec![CellValue::from(30)], vec![CellValue::from(40)], vec![CellValue::Null]],
//! )
//! .unwrap();
//!
//! let profiler = ColumnProfiler::builder().top_categories(3).build();
//! let profiles = profiler.profile_all(&rows, None);
//!
//! let age = &profiles["age"];
//! assert_eq!(age.column_type, ColumnType::Numeric);
//! assert_eq!(age.missing_count, 1);
//! assert_eq!(age.numeric.as_ref().unwrap().mean, 35.0);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::inference::TypeInferenceEngine;
use super::types::{ColumnType, ColumnTypes};
use crate::table::{CellValue, RowSet};

/// Default number of entries kept in a frequency table.
pub const DEFAULT_TOP_CATEGORIES: usize = 5;

/// Column name to profile.
pub type ProfileMap = BTreeMap<String, ColumnProfile>;

/// Configuration for the column profiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilerConfig {
    /// Maximum number of entries in a frequency table
    pub top_categories: usize,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            top_categories: DEFAULT_TOP_CATEGORIES,
        }
    }
}

/// Summary statistics of the numeric values in a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Element at `floor(n / 2)` of the ascending values.
    pub median: f64,
    /// Population standard deviation.
    pub std: f64,
}

/// One entry of a frequency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
}

/// Profile of a single column relative to one row set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfile {
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub missing_count: usize,
    /// Between 0 and 100, relative to the profiled row count.
    pub missing_percentage: f64,
    pub unique_count: usize,
    /// Present for numeric columns holding at least one number.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
    /// Present for categorical and boolean columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_categories: Option<Vec<CategoryCount>>,
}

/// Builder for [`ColumnProfiler`].
#[derive(Debug, Clone, Default)]
pub struct ColumnProfilerBuilder {
    config: ProfilerConfig,
}

impl ColumnProfilerBuilder {
    /// Set how many entries a frequency table keeps.
    pub fn top_categories(mut self, limit: usize) -> Self {
        self.config.top_categories = limit;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ProfilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the ColumnProfiler
    pub fn build(self) -> ColumnProfiler {
        ColumnProfiler {
            config: self.config,
            inference: TypeInferenceEngine::new(),
        }
    }
}

/// Computes [`ColumnProfile`]s for the columns of a row set.
#[derive(Debug, Clone)]
pub struct ColumnProfiler {
    config: ProfilerConfig,
    inference: TypeInferenceEngine,
}

impl ColumnProfiler {
    /// Create a new ColumnProfiler with default configuration
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ColumnProfilerBuilder {
        ColumnProfilerBuilder::default()
    }

    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Profile every column of the row set.
    pub fn profile_all(&self, rows: &RowSet, prior_types: Option<&ColumnTypes>) -> ProfileMap {
        self.profile(rows, rows.columns(), prior_types)
    }

    /// Profile the named columns.
    ///
    /// The type comes from `prior_types` when it has an entry for the column
    /// and is inferred from the values otherwise. Columns missing from the row
    /// set profile as entirely missing.
    #[instrument(skip(self, rows, columns, prior_types), fields(rows = rows.len(), columns = columns.len()))]
    pub fn profile<S: AsRef<str>>(
        &self,
        rows: &RowSet,
        columns: &[S],
        prior_types: Option<&ColumnTypes>,
    ) -> ProfileMap {
        columns
            .iter()
            .map(|column| {
                let column = column.as_ref();
                let prior = prior_types.and_then(|types| types.get(column).copied());
                (column.to_string(), self.profile_column(rows, column, prior))
            })
            .collect()
    }

    /// Profile one column.
    pub fn profile_column(
        &self,
        rows: &RowSet,
        column: &str,
        prior_type: Option<ColumnType>,
    ) -> ColumnProfile {
        let row_count = rows.len();
        let values: Vec<&CellValue> = match rows.column_values(column) {
            Some(values) => values.collect(),
            None => {
                debug!(column = %column, "Column absent from row set, profiling as missing");
                Vec::new()
            }
        };

        let column_type = prior_type.unwrap_or_else(|| self.inference.infer(values.iter().copied()));
        let present: Vec<&CellValue> = values.iter().copied().filter(|v| !v.is_missing()).collect();
        let missing_count = row_count - present.len();

        let missing_percentage = if row_count == 0 {
            0.0
        } else {
            missing_count as f64 / row_count as f64 * 100.0
        };

        let unique_count = present
            .iter()
            .map(|v| v.key())
            .collect::<HashSet<_>>()
            .len();

        let numeric = match column_type {
            ColumnType::Numeric => numeric_summary(&present),
            _ => None,
        };

        let top_categories = if column_type.has_frequency_table() {
            Some(self.frequency_table(&present))
        } else {
            None
        };

        debug!(
            column = %column,
            column_type = %column_type,
            missing_count,
            unique_count,
            "Profiled column"
        );

        ColumnProfile {
            column_type,
            missing_count,
            missing_percentage,
            unique_count,
            numeric,
            top_categories,
        }
    }

    /// Count stringified values, most frequent first.
    ///
    /// Ties keep the order in which values were first seen.
    fn frequency_table(&self, present: &[&CellValue]) -> Vec<CategoryCount> {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut counts: Vec<CategoryCount> = Vec::new();

        for value in present {
            let key = value.key();
            match positions.get(key.as_ref()) {
                Some(&position) => counts[position].count += 1,
                None => {
                    positions.insert(key.to_string(), counts.len());
                    counts.push(CategoryCount {
                        value: key.into_owned(),
                        count: 1,
                    });
                }
            }
        }

        // sort_by is stable, so first-seen order survives among equal counts
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts.truncate(self.config.top_categories);
        counts
    }
}

impl Default for ColumnProfiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary statistics over the values that coerce to numbers.
fn numeric_summary(present: &[&CellValue]) -> Option<NumericSummary> {
    let mut numbers: Vec<f64> = present.iter().filter_map(|v| v.as_number()).collect();
    if numbers.is_empty() {
        return None;
    }
    numbers.sort_by(f64::total_cmp);

    let n = numbers.len() as f64;
    let min = numbers[0];
    let max = numbers[numbers.len() - 1];
    // Rounding can push the mean a hair outside the observed range.
    let mean = (numbers.iter().sum::<f64>() / n).clamp(min, max);
    let median = numbers[numbers.len() / 2];
    let variance = numbers.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

    Some(NumericSummary {
        min,
        max,
        mean,
        median,
        std: variance.sqrt(),
    })
}
