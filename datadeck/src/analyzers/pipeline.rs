//! The single entry point every consumer goes through.
//!
//! [`InsightsPipeline`] bundles the inference, profiling, filtering and
//! aggregation engines configured from one [`DeckConfig`]. Chart previews,
//! saved charts, the insights panel and dashboard tiles all call it, so they
//! cannot drift apart.

use tracing::instrument;

use super::aggregation::{AggregationEngine, AggregationOutput, AggregationSpec};
use super::filter::FilterSpec;
use super::inference::TypeInferenceEngine;
use super::profiler::{ColumnProfiler, ProfileMap};
use super::recompute::{ProfileRecomputer, Recomputed};
use super::types::ColumnTypes;
use crate::config::DeckConfig;
use crate::log_spec;
use crate::logging::LogConfig;
use crate::table::RowSet;

#[derive(Debug, Clone, Default)]
pub struct InsightsPipeline {
    inference: TypeInferenceEngine,
    recomputer: ProfileRecomputer,
    aggregator: AggregationEngine,
    log: LogConfig,
}

impl InsightsPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every engine from a configuration.
    pub fn from_config(config: &DeckConfig) -> Self {
        let profiler = ColumnProfiler::builder()
            .config(config.profiler_config())
            .build();
        Self {
            inference: TypeInferenceEngine::new(),
            recomputer: ProfileRecomputer::new(profiler),
            aggregator: AggregationEngine::with_config(config.aggregation_config()),
            log: LogConfig::default(),
        }
    }

    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    pub fn aggregator(&self) -> &AggregationEngine {
        &self.aggregator
    }

    pub fn profiler(&self) -> &ColumnProfiler {
        self.recomputer.profiler()
    }

    /// Infer the type of every column.
    pub fn infer_types(&self, rows: &RowSet) -> ColumnTypes {
        self.inference.infer_columns(rows)
    }

    /// Profiles of the unfiltered rows.
    pub fn baseline(&self, rows: &RowSet, types: &ColumnTypes) -> ProfileMap {
        self.profiler().profile_all(rows, Some(types))
    }

    /// Filtered rows and their refreshed profiles.
    pub fn insights(&self, rows: &RowSet, filters: &FilterSpec, types: &ColumnTypes) -> Recomputed {
        log_spec!(self.log, filters = %self.describe(filters), "Recomputing insights");
        self.recomputer.recompute(rows, filters, types)
    }

    /// Filter, then aggregate into chart records.
    #[instrument(skip_all, fields(rows = rows.len()))]
    pub fn chart_records(
        &self,
        rows: &RowSet,
        types: &ColumnTypes,
        filters: &FilterSpec,
        spec: &AggregationSpec,
    ) -> AggregationOutput {
        log_spec!(
            self.log,
            filters = %self.describe(filters),
            aggregation = %self.describe(spec),
            "Building chart records"
        );
        let filtered = self.recomputer.filter_rows(rows, filters, types);
        self.aggregator.aggregate_with_meta(&filtered, spec)
    }

    fn describe<T: serde::Serialize>(&self, value: &T) -> String {
        let json = serde_json::to_string(value).unwrap_or_default();
        self.log.field(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::AggregationMode;
    use crate::table::CellValue;

    fn sample() -> RowSet {
        RowSet::from_cells(
            ["city", "sales"],
            vec![
                vec!["NY".into(), 10.into()],
                vec!["NY".into(), 20.into()],
                vec!["LA".into(), 5.into()],
                vec!["SF".into(), 1.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_chart_records_filter_then_aggregate() {
        let pipeline = InsightsPipeline::new().with_log_config(LogConfig::verbose());
        let rows = sample();
        let types = pipeline.infer_types(&rows);
        let filters = FilterSpec::new().min("sales", "5");
        let spec = AggregationSpec::new("city")
            .measure("sales")
            .mode(AggregationMode::Sum);

        let output = pipeline.chart_records(&rows, &types, &filters, &spec);
        assert_eq!(output.records.len(), 2);
        assert_eq!(output.records[0].measure("sales"), Some(&CellValue::Number(30.0)));
        assert!(!output.metadata.truncated);
    }

    #[test]
    fn test_from_config_applies_limits() {
        let config = DeckConfig::new().with_top_categories(1).with_raw_record_limit(2);
        let pipeline = InsightsPipeline::from_config(&config);
        let rows = sample();
        let types = pipeline.infer_types(&rows);

        let baseline = pipeline.baseline(&rows, &types);
        assert_eq!(baseline["city"].top_categories.as_ref().unwrap().len(), 1);

        let output = pipeline.chart_records(&rows, &types, &FilterSpec::new(), &AggregationSpec::new("city"));
        assert_eq!(output.records.len(), 2);
        assert!(output.metadata.truncated);
    }

    #[test]
    fn test_insights_match_baseline_without_filters() {
        let pipeline = InsightsPipeline::new();
        let rows = sample();
        let types = pipeline.infer_types(&rows);
        let insights = pipeline.insights(&rows, &FilterSpec::new(), &types);
        assert_eq!(insights.profiles, pipeline.baseline(&rows, &types));
    }
}
