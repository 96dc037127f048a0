//! # datadeck - spreadsheet insights for project dashboards
//!
//! datadeck turns an uploaded or imported spreadsheet into per-column profiles,
//! filtered views and chart-ready aggregates. It is the analysis core behind a
//! dashboard application: the application owns HTTP, storage choice and
//! rendering; datadeck owns the numbers.
//!
//! ## Quick Start
//!
//! ```rust
//! use datadeck::prelude::*;
//!
//! # fn main() -> datadeck::error::Result<()> {
//! let csv = b"city,sales,active\nNY,10,true\nNY,20,false\nLA,5,true\n";
//! let rows = ingest_bytes(csv, SheetFormat::Csv, &DecodeOptions::new())?;
//!
//! let project = Project::new("Sales", ProjectSource::upload("sales.csv", true), rows);
//! let pipeline = InsightsPipeline::new();
//!
//! // Profiles of the whole sheet
//! let profiles = project.baseline_profiles(&pipeline);
//! assert_eq!(profiles["sales"].column_type, ColumnType::Numeric);
//! assert_eq!(profiles["active"].column_type, ColumnType::Boolean);
//!
//! // Profiles of a filtered view
//! let insights = project.insights(&pipeline, &FilterSpec::new().allow("city", ["NY"]));
//! assert_eq!(insights.rows.len(), 2);
//!
//! // Chart data
//! let chart = ChartConfig::new(
//!     "Sales by city",
//!     ChartKind::Bar,
//!     AggregationSpec::new("city").measure("sales").mode(AggregationMode::Sum),
//! );
//! let data = project.preview_chart(&pipeline, &chart);
//! assert_eq!(data.records.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`table`**: raw cell values, rows and immutable row sets, plus the
//!   coercion rules every engine shares
//! - **`analyzers`**: type inference, column profiling, row filtering,
//!   aggregation and the [`InsightsPipeline`](analyzers::InsightsPipeline)
//!   tying them together
//! - **`sources`**: CSV and XLSX decoding, file ingestion and (feature
//!   `remote`) URL import
//! - **`project`**: projects, saved charts, per-project and global dashboards
//! - **`repository`**: the async [`ProjectStore`](repository::ProjectStore)
//!   trait with in-memory and JSON-file backends
//! - **`config`**, **`logging`**, **`error`**: ambient settings, tracing setup
//!   and the crate error type
//!
//! ## Features
//!
//! - `remote`: URL import via `reqwest`
//! - `test-utils`: exposes [`test_fixtures`] outside of this crate's tests

pub mod analyzers;
pub mod config;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod project;
pub mod repository;
pub mod sources;
pub mod table;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
