//! The project aggregate.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::chart::{ChartConfig, ChartData};
use super::dashboard::{DashboardLayout, TileLayout};
use crate::analyzers::{
    ColumnTypes, FilterSpec, InsightsPipeline, ProfileMap, Recomputed, TypeInferenceEngine,
};
use crate::error::{DeckError, Result};
use crate::table::RowSet;

/// Where a project's rows came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProjectSource {
    #[serde(rename_all = "camelCase")]
    Upload { file_name: String, header_mode: bool },
    #[serde(rename_all = "camelCase")]
    Url { url: String, header_mode: bool },
    /// Rows built in code rather than ingested.
    Inline,
}

impl ProjectSource {
    pub fn upload(file_name: impl Into<String>, header_mode: bool) -> Self {
        ProjectSource::Upload {
            file_name: file_name.into(),
            header_mode,
        }
    }

    pub fn url(url: impl Into<String>, header_mode: bool) -> Self {
        ProjectSource::Url {
            url: url.into(),
            header_mode,
        }
    }

    pub fn header_mode(&self) -> bool {
        match self {
            ProjectSource::Upload { header_mode, .. } | ProjectSource::Url { header_mode, .. } => {
                *header_mode
            }
            ProjectSource::Inline => true,
        }
    }
}

/// Listing entry for a stored project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub row_count: usize,
    pub column_count: usize,
    pub chart_count: usize,
    pub updated_at: DateTime<Utc>,
}

/// The persisted form of a project. Column types and profiles are derived
/// data and are not part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: Uuid,
    pub name: String,
    pub source: ProjectSource,
    pub rows: RowSet,
    #[serde(default)]
    pub charts: Vec<ChartConfig>,
    #[serde(default)]
    pub layout: DashboardLayout,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectRecord {
    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id,
            name: self.name.clone(),
            row_count: self.rows.len(),
            column_count: self.rows.columns().len(),
            chart_count: self.charts.len(),
            updated_at: self.updated_at,
        }
    }
}

/// Owns one dataset, its inferred column types, its charts and its dashboard.
///
/// The row set is only ever replaced, never edited in place; [`Project::rows`]
/// hands out snapshots that stay valid across later edits.
#[derive(Debug, Clone)]
pub struct Project {
    id: Uuid,
    name: String,
    source: ProjectSource,
    rows: Arc<RowSet>,
    column_types: ColumnTypes,
    charts: Vec<ChartConfig>,
    layout: DashboardLayout,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a project and infer its column types.
    pub fn new(name: impl Into<String>, source: ProjectSource, rows: RowSet) -> Self {
        let now = Utc::now();
        let column_types = TypeInferenceEngine::new().infer_columns(&rows);
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            source,
            rows: Arc::new(rows),
            column_types,
            charts: Vec::new(),
            layout: DashboardLayout::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a project from storage, re-deriving its column types.
    pub fn from_record(record: ProjectRecord) -> Self {
        let column_types = TypeInferenceEngine::new().infer_columns(&record.rows);
        Self {
            id: record.id,
            name: record.name,
            source: record.source,
            rows: Arc::new(record.rows),
            column_types,
            charts: record.charts,
            layout: record.layout,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    pub fn to_record(&self) -> ProjectRecord {
        ProjectRecord {
            id: self.id,
            name: self.name.clone(),
            source: self.source.clone(),
            rows: (*self.rows).clone(),
            charts: self.charts.clone(),
            layout: self.layout.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn source(&self) -> &ProjectSource {
        &self.source
    }

    /// Snapshot of the current rows.
    pub fn rows(&self) -> Arc<RowSet> {
        Arc::clone(&self.rows)
    }

    pub fn column_types(&self) -> &ColumnTypes {
        &self.column_types
    }

    pub fn charts(&self) -> &[ChartConfig] {
        &self.charts
    }

    pub fn chart(&self, chart_id: Uuid) -> Option<&ChartConfig> {
        self.charts.iter().find(|chart| chart.id == chart_id)
    }

    pub fn layout(&self) -> &DashboardLayout {
        &self.layout
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id,
            name: self.name.clone(),
            row_count: self.rows.len(),
            column_count: self.rows.columns().len(),
            chart_count: self.charts.len(),
            updated_at: self.updated_at,
        }
    }

    /// Swap in freshly ingested rows, e.g. after re-importing the source.
    ///
    /// Charts are kept; references to columns that no longer exist simply
    /// produce no data.
    #[instrument(skip_all, fields(project = %self.id, rows = rows.len()))]
    pub fn replace_rows(&mut self, rows: RowSet) {
        self.set_rows(rows);
        info!("Replaced project rows");
    }

    /// Rename a column in the rows and in every chart referring to it.
    pub fn rename_column(&mut self, old: &str, new: &str) -> Result<()> {
        let rows = self.rows.rename_column(old, new)?;
        for chart in &mut self.charts {
            chart.rename_column(old, new);
        }
        self.set_rows(rows);
        debug!(project = %self.id, old, new, "Renamed column");
        Ok(())
    }

    pub fn delete_row(&mut self, index: usize) -> Result<()> {
        let rows = self.rows.delete_row(index)?;
        self.set_rows(rows);
        Ok(())
    }

    /// Drop repeated rows, keeping first occurrences. Returns how many went.
    pub fn remove_duplicate_rows(&mut self) -> usize {
        let (rows, removed) = self.rows.remove_duplicate_rows();
        if removed > 0 {
            self.set_rows(rows);
        }
        debug!(project = %self.id, removed, "Removed duplicate rows");
        removed
    }

    /// Profiles of the full row set.
    pub fn baseline_profiles(&self, pipeline: &InsightsPipeline) -> ProfileMap {
        pipeline.baseline(&self.rows, &self.column_types)
    }

    /// Filtered rows and their profiles, for the insights panel.
    pub fn insights(&self, pipeline: &InsightsPipeline, filters: &FilterSpec) -> Recomputed {
        pipeline.insights(&self.rows, filters, &self.column_types)
    }

    /// Chart data for a configuration that may not be saved yet.
    pub fn preview_chart(&self, pipeline: &InsightsPipeline, chart: &ChartConfig) -> ChartData {
        let output = pipeline.chart_records(
            &self.rows,
            &self.column_types,
            &chart.filters,
            &chart.aggregation,
        );
        ChartData::new(chart, None, output)
    }

    /// Chart data for a saved chart.
    pub fn chart_data(&self, pipeline: &InsightsPipeline, chart_id: Uuid) -> Result<ChartData> {
        let chart = self.chart(chart_id).ok_or_else(|| DeckError::ChartNotFound {
            id: chart_id.to_string(),
        })?;
        let mut data = self.preview_chart(pipeline, chart);
        data.chart_id = Some(chart_id);
        Ok(data)
    }

    /// Save a chart and place it on the project dashboard.
    pub fn add_chart(&mut self, chart: ChartConfig) -> Uuid {
        let id = chart.id;
        self.charts.push(chart);
        self.layout.place(id);
        self.touch();
        id
    }

    /// Replace the saved chart with the same id.
    pub fn update_chart(&mut self, chart: ChartConfig) -> Result<()> {
        let slot = self
            .charts
            .iter_mut()
            .find(|existing| existing.id == chart.id)
            .ok_or_else(|| DeckError::ChartNotFound {
                id: chart.id.to_string(),
            })?;
        *slot = chart;
        self.touch();
        Ok(())
    }

    /// Delete a chart and its dashboard tile.
    pub fn remove_chart(&mut self, chart_id: Uuid) -> Result<ChartConfig> {
        let index = self
            .charts
            .iter()
            .position(|chart| chart.id == chart_id)
            .ok_or_else(|| DeckError::ChartNotFound {
                id: chart_id.to_string(),
            })?;
        let chart = self.charts.remove(index);
        self.layout.remove(chart_id);
        self.touch();
        Ok(chart)
    }

    pub fn arrange_tile(&mut self, chart_id: Uuid, layout: TileLayout) -> Result<()> {
        self.layout.arrange(chart_id, layout)?;
        self.touch();
        Ok(())
    }

    fn set_rows(&mut self, rows: RowSet) {
        self.column_types = TypeInferenceEngine::new().infer_columns(&rows);
        self.rows = Arc::new(rows);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::{AggregationMode, AggregationSpec, ColumnType};
    use crate::project::ChartKind;
    use crate::table::CellValue;

    fn project() -> Project {
        let rows = RowSet::from_cells(
            ["city", "sales"],
            vec![
                vec!["NY".into(), 10.into()],
                vec!["NY".into(), 20.into()],
                vec!["LA".into(), 5.into()],
                vec!["LA".into(), 5.into()],
            ],
        )
        .unwrap();
        Project::new("Sales", ProjectSource::upload("sales.csv", true), rows)
    }

    fn sum_chart() -> ChartConfig {
        ChartConfig::new(
            "Sales by city",
            ChartKind::Bar,
            AggregationSpec::new("city").measure("sales").mode(AggregationMode::Sum),
        )
    }

    #[test]
    fn test_new_infers_types() {
        let project = project();
        assert_eq!(project.column_types()["city"], ColumnType::Categorical);
        assert_eq!(project.column_types()["sales"], ColumnType::Numeric);
    }

    #[test]
    fn test_snapshots_survive_edits() {
        let mut project = project();
        let before = project.rows();
        project.delete_row(0).unwrap();
        assert_eq!(before.len(), 4);
        assert_eq!(project.rows().len(), 3);
    }

    #[test]
    fn test_edits_reinfer_types() {
        let rows = RowSet::from_cells(["v"], vec![vec!["x".into()], vec![1.into()]]).unwrap();
        let mut project = Project::new("p", ProjectSource::Inline, rows);
        assert_eq!(project.column_types()["v"], ColumnType::Categorical);

        project.delete_row(0).unwrap();
        assert_eq!(project.column_types()["v"], ColumnType::Numeric);
    }

    #[test]
    fn test_rename_column_updates_charts() {
        let mut project = project();
        let id = project.add_chart(sum_chart().with_filters(FilterSpec::new().min("sales", "1")));

        project.rename_column("sales", "revenue").unwrap();
        let chart = project.chart(id).unwrap();
        assert_eq!(chart.aggregation.y_axis, vec!["revenue".to_string()]);
        assert!(chart.filters.get("revenue_min").is_some());
        assert_eq!(project.column_types()["revenue"], ColumnType::Numeric);

        let data = project.chart_data(&InsightsPipeline::new(), id).unwrap();
        assert_eq!(data.records[0].measure("revenue"), Some(&CellValue::Number(30.0)));
    }

    #[test]
    fn test_remove_duplicate_rows() {
        let mut project = project();
        assert_eq!(project.remove_duplicate_rows(), 1);
        assert_eq!(project.rows().len(), 3);
        assert_eq!(project.remove_duplicate_rows(), 0);
    }

    #[test]
    fn test_chart_lifecycle() {
        let mut project = project();
        let id = project.add_chart(sum_chart());
        assert!(project.layout().tile(id).is_some());

        let mut updated = project.chart(id).unwrap().clone();
        updated.title = "Renamed".to_string();
        project.update_chart(updated).unwrap();
        assert_eq!(project.chart(id).unwrap().title, "Renamed");

        project.arrange_tile(id, TileLayout::new(0, 0, 12, 6)).unwrap();
        assert_eq!(project.layout().tile(id).unwrap().layout.w, 12);

        project.remove_chart(id).unwrap();
        assert!(project.chart(id).is_none());
        assert!(project.layout().tile(id).is_none());
        assert!(matches!(
            project.remove_chart(id),
            Err(DeckError::ChartNotFound { .. })
        ));
    }

    #[test]
    fn test_insights_and_preview() {
        let project = project();
        let pipeline = InsightsPipeline::new();

        let insights = project.insights(&pipeline, &FilterSpec::new().allow("city", ["LA"]));
        assert_eq!(insights.rows.len(), 2);
        assert_eq!(insights.profiles["sales"].unique_count, 1);

        let preview = project.preview_chart(
            &pipeline,
            &sum_chart().with_filters(FilterSpec::new().allow("city", ["NY"])),
        );
        assert!(preview.chart_id.is_none());
        assert_eq!(preview.records.len(), 1);
        assert_eq!(preview.records[0].measure("sales"), Some(&CellValue::Number(30.0)));
    }

    #[test]
    fn test_record_roundtrip() {
        let mut project = project();
        project.add_chart(sum_chart());
        let record = project.to_record();
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("columnTypes"));

        let back: ProjectRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        let restored = Project::from_record(back);
        assert_eq!(restored.column_types(), project.column_types());
        assert_eq!(restored.summary(), project.summary());
    }
}
