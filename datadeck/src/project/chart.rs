//! Saved chart configurations and the data handed to the renderer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::analyzers::{AggregatedRecord, AggregationOutput, AggregationSpec, FilterSpec};

/// Chart types the renderer knows how to draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Area,
    Pie,
    Scatter,
}

/// A saved chart: what to aggregate, which rows to use and how to show it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub id: Uuid,
    pub title: String,
    pub kind: ChartKind,
    pub aggregation: AggregationSpec,
    #[serde(default)]
    pub filters: FilterSpec,
    /// Display options (colours, labels, ...) passed through untouched.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl ChartConfig {
    pub fn new(title: impl Into<String>, kind: ChartKind, aggregation: AggregationSpec) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            kind,
            aggregation,
            filters: FilterSpec::default(),
            extra: Map::new(),
        }
    }

    pub fn with_filters(mut self, filters: FilterSpec) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Point every axis and filter reference at the renamed column.
    pub fn rename_column(&mut self, old: &str, new: &str) {
        self.aggregation.rename_column(old, new);
        self.filters.rename_column(old, new);
    }
}

/// Everything the renderer needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    /// `None` for previews of unsaved charts
    pub chart_id: Option<Uuid>,
    pub title: String,
    pub kind: ChartKind,
    pub x_axis: Option<String>,
    /// Field names each record carries besides the x axis
    pub measures: Vec<String>,
    pub records: Vec<AggregatedRecord>,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl ChartData {
    pub(crate) fn new(chart: &ChartConfig, chart_id: Option<Uuid>, output: AggregationOutput) -> Self {
        Self {
            chart_id,
            title: chart.title.clone(),
            kind: chart.kind,
            x_axis: chart.aggregation.x_axis.clone(),
            measures: chart.aggregation.output_measures(),
            records: output.records,
            truncated: output.metadata.truncated,
            extra: chart.extra.clone(),
        }
    }

    /// Whether there is nothing to plot.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::AggregationMode;
    use serde_json::json;

    #[test]
    fn test_chart_config_json() {
        let chart = ChartConfig::new(
            "Sales by city",
            ChartKind::Bar,
            AggregationSpec::new("city").measure("sales").mode(AggregationMode::Sum),
        )
        .with_filters(FilterSpec::new().allow("city", ["NY"]))
        .with_extra("colorScheme", json!("viridis"));

        let value = serde_json::to_value(&chart).unwrap();
        assert_eq!(value["kind"], "bar");
        assert_eq!(value["aggregation"]["xAxis"], "city");
        assert_eq!(value["aggregation"]["mode"], "sum");
        assert_eq!(value["filters"]["city"], json!(["NY"]));
        assert_eq!(value["extra"]["colorScheme"], "viridis");

        let back: ChartConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back, chart);
    }

    #[test]
    fn test_rename_column_rewrites_references() {
        let mut chart = ChartConfig::new("t", ChartKind::Line, AggregationSpec::new("date").measure("sales"))
            .with_filters(FilterSpec::new().min("sales", "1"));
        chart.rename_column("sales", "revenue");

        assert_eq!(chart.aggregation.y_axis, vec!["revenue".to_string()]);
        assert!(chart.filters.get("revenue_min").is_some());
        assert_eq!(chart.aggregation.x_axis.as_deref(), Some("date"));
    }

    #[test]
    fn test_chart_data_measures_default_to_count() {
        let chart = ChartConfig::new("t", ChartKind::Pie, AggregationSpec::new("city"));
        let data = ChartData::new(&chart, Some(chart.id), AggregationOutput::default());
        assert_eq!(data.measures, vec!["count".to_string()]);
        assert!(data.is_empty());
        assert!(!data.truncated);
    }
}
