//! Declarative row filtering.
//!
//! A [`FilterSpec`] is stored as a plain map from filter key to a list of
//! strings, which is also its JSON form:
//!
//! ```json
//! { "city": ["NY", "LA"], "sales_min": ["10"], "date_max": ["2024-06-30"] }
//! ```
//!
//! Keys ending in `_min` or `_max` carry one inclusive boundary for the column
//! named by the rest of the key. Every other key is an allow-list. Before use
//! the map is read as a closed set of [`FilterClause`]s.
//!
//! Filters never fail. Clauses that cannot apply (empty lists, unknown
//! columns, range filters on non-range columns, unparseable boundaries) are
//! skipped.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::types::{ColumnType, ColumnTypes};
use crate::table::coerce::{parse_date_millis, parse_number};
use crate::table::{CellValue, RowSet};

const MIN_SUFFIX: &str = "_min";
const MAX_SUFFIX: &str = "_max";

/// Filter key to allowed values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec {
    entries: BTreeMap<String, Vec<String>>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow only rows whose `column` stringifies to one of `values`.
    pub fn allow<I, S>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .insert(column.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Inclusive lower bound on `column`.
    pub fn min(mut self, column: &str, bound: impl Into<String>) -> Self {
        self.entries
            .insert(format!("{column}{MIN_SUFFIX}"), vec![bound.into()]);
        self
    }

    /// Inclusive upper bound on `column`.
    pub fn max(mut self, column: &str, bound: impl Into<String>) -> Self {
        self.entries
            .insert(format!("{column}{MAX_SUFFIX}"), vec![bound.into()]);
        self
    }

    /// Set a raw entry.
    pub fn insert(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.entries.insert(key.into(), values);
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn entries(&self) -> &BTreeMap<String, Vec<String>> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any entry constrains rows at all.
    pub fn is_active(&self) -> bool {
        self.entries.values().any(|values| !values.is_empty())
    }

    /// Interpret the entries as clauses. Empty lists produce no clause.
    pub fn clauses(&self) -> Vec<FilterClause> {
        self.entries
            .iter()
            .filter_map(|(key, values)| FilterClause::parse(key, values))
            .collect()
    }

    /// Rewrite every key that refers to `old` so that it refers to `new`.
    pub fn rename_column(&mut self, old: &str, new: &str) {
        let renames = [
            (old.to_string(), new.to_string()),
            (format!("{old}{MIN_SUFFIX}"), format!("{new}{MIN_SUFFIX}")),
            (format!("{old}{MAX_SUFFIX}"), format!("{new}{MAX_SUFFIX}")),
        ];
        // Remove all three first: `new` may equal one of the old keys.
        let moved: Vec<(String, Vec<String>)> = renames
            .into_iter()
            .filter_map(|(from, to)| self.entries.remove(&from).map(|values| (to, values)))
            .collect();
        self.entries.extend(moved);
    }
}

impl From<BTreeMap<String, Vec<String>>> for FilterSpec {
    fn from(entries: BTreeMap<String, Vec<String>>) -> Self {
        Self { entries }
    }
}

/// One interpreted filter entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterClause {
    AllowList { column: String, values: Vec<String> },
    Min { column: String, bound: String },
    Max { column: String, bound: String },
}

impl FilterClause {
    fn parse(key: &str, values: &[String]) -> Option<Self> {
        let first = values.first()?;
        if let Some(column) = key.strip_suffix(MIN_SUFFIX) {
            return Some(FilterClause::Min {
                column: column.to_string(),
                bound: first.clone(),
            });
        }
        if let Some(column) = key.strip_suffix(MAX_SUFFIX) {
            return Some(FilterClause::Max {
                column: column.to_string(),
                bound: first.clone(),
            });
        }
        Some(FilterClause::AllowList {
            column: key.to_string(),
            values: values.to_vec(),
        })
    }

    /// The column the clause constrains.
    pub fn column(&self) -> &str {
        match self {
            FilterClause::AllowList { column, .. }
            | FilterClause::Min { column, .. }
            | FilterClause::Max { column, .. } => column,
        }
    }
}

/// A clause bound to a column position, ready to test rows.
enum Predicate {
    AllowList { index: usize, allowed: HashSet<String> },
    NumericRange { index: usize, bound: f64, is_min: bool },
    DateRange { index: usize, bound: i64, is_min: bool },
}

impl Predicate {
    fn matches(&self, cell: &CellValue) -> bool {
        match self {
            Predicate::AllowList { allowed, .. } => allowed.contains(cell.key().as_ref()),
            Predicate::NumericRange { bound, is_min, .. } => match cell.as_number() {
                Some(n) if *is_min => n >= *bound,
                Some(n) => n <= *bound,
                None => false,
            },
            Predicate::DateRange { bound, is_min, .. } => match cell.as_timestamp_millis() {
                Some(t) if *is_min => t >= *bound,
                Some(t) => t <= *bound,
                None => false,
            },
        }
    }

    fn index(&self) -> usize {
        match self {
            Predicate::AllowList { index, .. }
            | Predicate::NumericRange { index, .. }
            | Predicate::DateRange { index, .. } => *index,
        }
    }
}

/// Applies a [`FilterSpec`] to a row set.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowFilterEngine;

impl RowFilterEngine {
    pub fn new() -> Self {
        Self
    }

    /// Keep the rows that satisfy every applicable clause.
    ///
    /// The result shares the input's columns. Clause order does not matter.
    #[instrument(skip_all, fields(rows = rows.len(), entries = spec.len()))]
    pub fn apply(&self, rows: &RowSet, spec: &FilterSpec, column_types: &ColumnTypes) -> RowSet {
        let predicates: Vec<Predicate> = spec
            .clauses()
            .into_iter()
            .filter_map(|clause| self.compile(rows, &clause, column_types))
            .collect();

        if predicates.is_empty() {
            return rows.clone();
        }

        let filtered = rows.filter_rows(|row| {
            predicates
                .iter()
                .all(|predicate| predicate.matches(row.get(predicate.index())))
        });
        debug!(kept = filtered.len(), "Applied row filters");
        filtered
    }

    fn compile(
        &self,
        rows: &RowSet,
        clause: &FilterClause,
        column_types: &ColumnTypes,
    ) -> Option<Predicate> {
        let column = clause.column();
        let Some(index) = rows.column_index(column) else {
            debug!(column = %column, "Skipping filter on absent column");
            return None;
        };

        let (bound, is_min) = match clause {
            FilterClause::AllowList { values, .. } => {
                return Some(Predicate::AllowList {
                    index,
                    allowed: values.iter().cloned().collect(),
                });
            }
            FilterClause::Min { bound, .. } => (bound, true),
            FilterClause::Max { bound, .. } => (bound, false),
        };

        let predicate = match column_types.get(column) {
            Some(ColumnType::Numeric) => parse_number(bound).map(|bound| Predicate::NumericRange {
                index,
                bound,
                is_min,
            }),
            Some(ColumnType::Datetime) => {
                parse_date_millis(bound).map(|bound| Predicate::DateRange {
                    index,
                    bound,
                    is_min,
                })
            }
            _ => None,
        };

        if predicate.is_none() {
            debug!(column = %column, bound = %bound, "Skipping range filter that cannot apply");
        }
        predicate
    }
}
