//! Profiling and aggregation engines.
//!
//! Everything here is synchronous and pure: each call reads an immutable
//! [`RowSet`](crate::table::RowSet) and returns a fresh result, so the engines
//! can be shared freely between threads.
//!
//! ## Engines
//!
//! - **Type inference** (`inference`): numeric, boolean, datetime,
//!   categorical or unknown per column
//! - **Column profiler** (`profiler`): missing counts, distinct counts,
//!   numeric summaries and frequency tables
//! - **Row filter** (`filter`): allow-lists and inclusive min/max bounds
//! - **Aggregation** (`aggregation`): grouping and sum/avg/count reductions
//!   into chart records
//! - **Profile recomputer** (`recompute`): filter, then profile
//! - **Insights pipeline** (`pipeline`): all of the above, configured once
//!
//! ## Example
//!
//! ```rust
//! use datadeck::analyzers::{AggregationMode, AggregationSpec, FilterSpec, InsightsPipeline};
//! use datadeck::table::{CellValue, RowSet};
//!
//! let rows = RowSet::from_cells(
//!     ["city", "sales"],
//!     vec![
//!         vec![CellValue::from("NY"), CellValue::from(10)],
//!         vec![CellValue::from("NY"), CellValue::from(20)],
//!         vec![CellValue::from("LA"), CellValue::from(5)],
//!     ],
//! )
//! .unwrap();
//!
//! let pipeline = InsightsPipeline::new();
//! let types = pipeline.infer_types(&rows);
//! let spec = AggregationSpec::new("city").measure("sales").mode(AggregationMode::Sum);
//!
//! let output = pipeline.chart_records(&rows, &types, &FilterSpec::new(), &spec);
//! assert_eq!(output.records[0].measure("sales"), Some(&CellValue::Number(30.0)));
//! ```

pub mod aggregation;
pub mod filter;
pub mod inference;
pub mod pipeline;
pub mod profiler;
pub mod recompute;
pub mod types;

pub use aggregation::{
    AggregatedRecord, AggregationConfig, AggregationEngine, AggregationMetadata, AggregationMode,
    AggregationOutput, AggregationSpec,
};
pub use filter::{FilterClause, FilterSpec, RowFilterEngine};
pub use inference::{TypeInferenceEngine, TypeInferenceResult, TypeStats};
pub use pipeline::InsightsPipeline;
pub use profiler::{
    CategoryCount, ColumnProfile, ColumnProfiler, ColumnProfilerBuilder, NumericSummary,
    ProfileMap, ProfilerConfig,
};
pub use recompute::{ProfileRecomputer, Recomputed};
pub use types::{ColumnType, ColumnTypes};
