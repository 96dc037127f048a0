//! Prelude for commonly used types and traits in datadeck.

pub use crate::analyzers::{
    AggregationMode, AggregationSpec, ColumnProfile, ColumnType, ColumnTypes, FilterSpec,
    InsightsPipeline, ProfileMap,
};
pub use crate::config::DeckConfig;
pub use crate::error::{DeckError, ErrorContext, Result};
pub use crate::logging::LogConfig;
pub use crate::project::{ChartConfig, ChartData, ChartKind, GlobalDashboard, Project, ProjectSource};
pub use crate::repository::{FileStore, InMemoryStore, ProjectStore};
pub use crate::sources::{ingest_bytes, ingest_file, DecodeOptions, SheetFormat};
pub use crate::table::{CellValue, RowSet};
