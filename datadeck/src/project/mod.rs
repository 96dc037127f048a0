//! Projects, their saved charts and dashboards.
//!
//! A [`Project`] owns one ingested row set and everything built on it. Chart
//! data is always computed through an
//! [`InsightsPipeline`](crate::analyzers::InsightsPipeline), so the chart
//! builder, the insights panel and dashboard tiles filter and aggregate the
//! same way.
//!
//! ```rust
//! use datadeck::analyzers::{AggregationMode, AggregationSpec, InsightsPipeline};
//! use datadeck::project::{ChartConfig, ChartKind, Project, ProjectSource};
//! use datadeck::table::RowSet;
//!
//! let rows = RowSet::from_cells(
//!     ["region", "revenue"],
//!     vec![
//!         vec!["north".into(), 120.into()],
//!         vec!["south".into(), 80.into()],
//!         vec!["north".into(), 30.into()],
//!     ],
//! )
//! .unwrap();
//!
//! let mut project = Project::new("Q1", ProjectSource::Inline, rows);
//! let chart_id = project.add_chart(ChartConfig::new(
//!     "Revenue by region",
//!     ChartKind::Bar,
//!     AggregationSpec::new("region").measure("revenue").mode(AggregationMode::Sum),
//! ));
//!
//! let data = project.chart_data(&InsightsPipeline::new(), chart_id).unwrap();
//! assert_eq!(data.records.len(), 2);
//! ```

pub mod chart;
pub mod dashboard;
#[allow(clippy::module_inception)]
pub mod project;

pub use chart::{ChartConfig, ChartData, ChartKind};
pub use dashboard::{
    ChartTile, DashboardLayout, DashboardRender, GlobalDashboard, MissingReason, MissingTile,
    PinnedTile, RenderedTile, TileLayout, DEFAULT_TILE_HEIGHT, DEFAULT_TILE_WIDTH,
};
pub use project::{Project, ProjectRecord, ProjectSource, ProjectSummary};
