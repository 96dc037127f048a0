//! Tabular data model: raw cell values, rows and row sets.
//!
//! A [`RowSet`] is what a spreadsheet decodes into and what every analyzer
//! consumes. Coercion rules for numbers, dates and stringified keys live in
//! [`coerce`] so that inference, profiling, filtering and aggregation agree.

pub mod coerce;
pub mod row_set;
pub mod value;

pub use row_set::{Row, RowSet};
pub use value::CellValue;
