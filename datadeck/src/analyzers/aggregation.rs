//! Turning rows into chart-ready records.
//!
//! An [`AggregationSpec`] names the x axis, the measures and the reduction
//! mode. The engine dispatches on them like this:
//!
//! | x axis            | measures  | mode              | result                                   |
//! |-------------------|-----------|-------------------|------------------------------------------|
//! | unset or absent   | any       | any               | no records                               |
//! | set               | empty     | any               | one `count` record per x value, largest first |
//! | set               | non-empty | `none`            | one record per row, raw values           |
//! | set               | non-empty | `sum`/`avg`/`count` | one record per x value, first-seen order |
//!
//! Raw passthrough and plain counts stop at the raw record limit (1000 by
//! default), grouped reductions at the grouped limit (500 by default).

use std::collections::HashMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, instrument};

use crate::table::{CellValue, Row, RowSet};

/// Default cap for raw passthrough and plain count output.
pub const DEFAULT_RAW_RECORD_LIMIT: usize = 1000;
/// Default cap for grouped sum/avg/count output.
pub const DEFAULT_GROUPED_RECORD_LIMIT: usize = 500;

/// Name of the synthetic measure emitted when no measures are requested.
pub const COUNT_FIELD: &str = "count";

/// How measure values are reduced within a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// No reduction: one record per row.
    #[default]
    None,
    Sum,
    Avg,
    /// Number of rows in the group, whatever the measure holds.
    Count,
}

/// What to plot and how to reduce it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    /// Measure columns; empty means "count rows".
    #[serde(default)]
    pub y_axis: Vec<String>,
    #[serde(default)]
    pub mode: AggregationMode,
}

impl AggregationSpec {
    pub fn new(x_axis: impl Into<String>) -> Self {
        Self {
            x_axis: Some(x_axis.into()),
            ..Self::default()
        }
    }

    pub fn measure(mut self, column: impl Into<String>) -> Self {
        self.y_axis.push(column.into());
        self
    }

    pub fn measures<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.y_axis.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn mode(mut self, mode: AggregationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Names of the fields each output record carries besides the x axis.
    pub fn output_measures(&self) -> Vec<String> {
        if self.y_axis.is_empty() {
            vec![COUNT_FIELD.to_string()]
        } else {
            self.y_axis.clone()
        }
    }

    /// Rewrite axis references from `old` to `new`.
    pub fn rename_column(&mut self, old: &str, new: &str) {
        if self.x_axis.as_deref() == Some(old) {
            self.x_axis = Some(new.to_string());
        }
        for measure in &mut self.y_axis {
            if measure == old {
                *measure = new.to_string();
            }
        }
    }
}

/// One plotted point.
///
/// Serialises as a flat object: the x axis name mapped to the group key,
/// followed by each measure in request order. Keys are unique: the x axis
/// entry wins over a measure of the same name, and a repeated measure keeps
/// its first value.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRecord {
    x_axis: String,
    key: CellValue,
    measures: Vec<(String, CellValue)>,
}

impl AggregatedRecord {
    pub fn new(x_axis: impl Into<String>, key: CellValue, measures: Vec<(String, CellValue)>) -> Self {
        Self {
            x_axis: x_axis.into(),
            key,
            measures,
        }
    }

    pub fn x_axis(&self) -> &str {
        &self.x_axis
    }

    /// The grouping key, or the raw x value in passthrough mode.
    pub fn key(&self) -> &CellValue {
        &self.key
    }

    pub fn measures(&self) -> &[(String, CellValue)] {
        &self.measures
    }

    /// Look up a measure by name.
    pub fn measure(&self, name: &str) -> Option<&CellValue> {
        self.measures
            .iter()
            .find(|(measure, _)| measure == name)
            .map(|(_, value)| value)
    }
}

impl Serialize for AggregatedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut written: Vec<&str> = Vec::with_capacity(self.measures.len() + 1);
        written.push(&self.x_axis);
        let mut entries = Vec::with_capacity(self.measures.len());
        for (name, value) in &self.measures {
            if !written.contains(&name.as_str()) {
                written.push(name);
                entries.push((name, value));
            }
        }

        let mut map = serializer.serialize_map(Some(entries.len() + 1))?;
        map.serialize_entry(&self.x_axis, &self.key)?;
        for (name, value) in entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Output caps for the aggregation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationConfig {
    pub raw_record_limit: usize,
    pub grouped_record_limit: usize,
}

impl AggregationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw_record_limit(mut self, limit: usize) -> Self {
        self.raw_record_limit = limit;
        self
    }

    pub fn with_grouped_record_limit(mut self, limit: usize) -> Self {
        self.grouped_record_limit = limit;
        self
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            raw_record_limit: DEFAULT_RAW_RECORD_LIMIT,
            grouped_record_limit: DEFAULT_GROUPED_RECORD_LIMIT,
        }
    }
}

/// Bookkeeping about an aggregation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationMetadata {
    /// Records that would exist without the cap (groups, or rows in passthrough)
    pub total_records: usize,
    /// Records actually returned
    pub included_records: usize,
    /// Whether the cap cut the output
    pub truncated: bool,
}

impl AggregationMetadata {
    fn new(total_records: usize, included_records: usize) -> Self {
        Self {
            total_records,
            included_records,
            truncated: included_records < total_records,
        }
    }
}

/// Records plus the metadata describing how they were produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationOutput {
    pub records: Vec<AggregatedRecord>,
    pub metadata: AggregationMetadata,
}

/// One group under construction: first-seen key plus the rows' positions.
struct Group<'a> {
    key: &'a CellValue,
    rows: Vec<&'a Row>,
}

/// Reduces rows into [`AggregatedRecord`]s.
#[derive(Debug, Clone, Default)]
pub struct AggregationEngine {
    config: AggregationConfig,
}

impl AggregationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AggregationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Aggregate rows into records.
    pub fn aggregate(&self, rows: &RowSet, spec: &AggregationSpec) -> Vec<AggregatedRecord> {
        self.aggregate_with_meta(rows, spec).records
    }

    /// Aggregate rows and report whether the output was capped.
    #[instrument(skip_all, fields(rows = rows.len(), x_axis = ?spec.x_axis, mode = ?spec.mode))]
    pub fn aggregate_with_meta(&self, rows: &RowSet, spec: &AggregationSpec) -> AggregationOutput {
        let Some(x_axis) = spec.x_axis.as_deref() else {
            debug!("No x axis selected");
            return AggregationOutput::default();
        };
        let Some(x_index) = rows.column_index(x_axis) else {
            debug!(x_axis = %x_axis, "X axis column absent from row set");
            return AggregationOutput::default();
        };

        if spec.y_axis.is_empty() {
            self.count_by_key(rows, x_axis, x_index)
        } else if spec.mode == AggregationMode::None {
            self.passthrough(rows, x_axis, x_index, &spec.y_axis)
        } else {
            self.reduce_groups(rows, x_axis, x_index, &spec.y_axis, spec.mode)
        }
    }

    fn count_by_key(&self, rows: &RowSet, x_axis: &str, x_index: usize) -> AggregationOutput {
        let groups = group_rows(rows, x_index);
        let total = groups.len();

        let mut records: Vec<AggregatedRecord> = groups
            .into_iter()
            .map(|group| {
                AggregatedRecord::new(
                    x_axis,
                    group.key.clone(),
                    vec![(COUNT_FIELD.to_string(), CellValue::Number(group.rows.len() as f64))],
                )
            })
            .collect();

        // Stable: equal counts stay in first-seen order.
        records.sort_by(|a, b| {
            let count = |r: &AggregatedRecord| r.measure(COUNT_FIELD).and_then(CellValue::as_number);
            count(b).partial_cmp(&count(a)).unwrap_or(std::cmp::Ordering::Equal)
        });
        records.truncate(self.config.raw_record_limit);

        let metadata = AggregationMetadata::new(total, records.len());
        AggregationOutput { records, metadata }
    }

    fn passthrough(
        &self,
        rows: &RowSet,
        x_axis: &str,
        x_index: usize,
        measures: &[String],
    ) -> AggregationOutput {
        let indices: Vec<Option<usize>> = measures.iter().map(|m| rows.column_index(m)).collect();

        let records: Vec<AggregatedRecord> = rows
            .rows()
            .iter()
            .take(self.config.raw_record_limit)
            .map(|row| {
                let values = measures
                    .iter()
                    .zip(&indices)
                    .map(|(name, index)| {
                        let value = index.map(|i| row.get(i).clone()).unwrap_or_default();
                        (name.clone(), value)
                    })
                    .collect();
                AggregatedRecord::new(x_axis, row.get(x_index).clone(), values)
            })
            .collect();

        let metadata = AggregationMetadata::new(rows.len(), records.len());
        AggregationOutput { records, metadata }
    }

    fn reduce_groups(
        &self,
        rows: &RowSet,
        x_axis: &str,
        x_index: usize,
        measures: &[String],
        mode: AggregationMode,
    ) -> AggregationOutput {
        let indices: Vec<Option<usize>> = measures.iter().map(|m| rows.column_index(m)).collect();
        let groups = group_rows(rows, x_index);
        let total = groups.len();

        let records: Vec<AggregatedRecord> = groups
            .into_iter()
            .take(self.config.grouped_record_limit)
            .map(|group| {
                let values = measures
                    .iter()
                    .zip(&indices)
                    .map(|(name, index)| {
                        let value = reduce(&group.rows, *index, mode);
                        (name.clone(), CellValue::Number(value))
                    })
                    .collect();
                AggregatedRecord::new(x_axis, group.key.clone(), values)
            })
            .collect();

        let metadata = AggregationMetadata::new(total, records.len());
        AggregationOutput { records, metadata }
    }
}

/// Group rows by the stringified x value, in first-seen order.
fn group_rows(rows: &RowSet, x_index: usize) -> Vec<Group<'_>> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Group<'_>> = Vec::new();

    for row in rows.rows() {
        let key = row.get(x_index);
        let stringified = key.key();
        match positions.get(stringified.as_ref()) {
            Some(&position) => groups[position].rows.push(row),
            None => {
                positions.insert(stringified.into_owned(), groups.len());
                groups.push(Group {
                    key,
                    rows: vec![row],
                });
            }
        }
    }

    groups
}

/// Reduce one measure over one group. Empty inputs reduce to 0.
fn reduce(rows: &[&Row], index: Option<usize>, mode: AggregationMode) -> f64 {
    if mode == AggregationMode::Count {
        return rows.len() as f64;
    }

    let Some(index) = index else {
        return 0.0;
    };
    let numbers: Vec<f64> = rows.iter().filter_map(|row| row.get(index).as_number()).collect();
    let sum: f64 = numbers.iter().sum();

    match mode {
        AggregationMode::Avg if numbers.is_empty() => 0.0,
        AggregationMode::Avg => sum / numbers.len() as f64,
        _ => sum,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city_sales() -> RowSet {
        RowSet::from_cells(
            ["city", "sales"],
            vec![
                vec!["NY".into(), 10.into()],
                vec!["NY".into(), 20.into()],
                vec!["LA".into(), 5.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_sum_keeps_first_seen_order() {
        let spec = AggregationSpec::new("city")
            .measure("sales")
            .mode(AggregationMode::Sum);
        let records = AggregationEngine::new().aggregate(&city_sales(), &spec);

        let json = serde_json::to_value(&records).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"city": "NY", "sales": 30.0}, {"city": "LA", "sales": 5.0}])
        );
    }

    #[test]
    fn test_record_json_has_unique_keys() {
        let record = AggregatedRecord::new(
            "city",
            "NY".into(),
            vec![
                ("city".to_string(), 2.into()),
                ("sales".to_string(), 30.into()),
                ("sales".to_string(), 99.into()),
            ],
        );
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"city":"NY","sales":30.0}"#);
    }

    #[test]
    fn test_avg() {
        let spec = AggregationSpec::new("city")
            .measure("sales")
            .mode(AggregationMode::Avg);
        let records = AggregationEngine::new().aggregate(&city_sales(), &spec);

        assert_eq!(records[0].measure("sales"), Some(&CellValue::Number(15.0)));
        assert_eq!(records[1].measure("sales"), Some(&CellValue::Number(5.0)));
    }

    #[test]
    fn test_avg_of_nothing_is_zero() {
        let rows = RowSet::from_cells(
            ["k", "v"],
            vec![vec!["a".into(), "x".into()], vec!["a".into(), CellValue::Null]],
        )
        .unwrap();
        let spec = AggregationSpec::new("k").measure("v").mode(AggregationMode::Avg);
        let records = AggregationEngine::new().aggregate(&rows, &spec);
        assert_eq!(records[0].measure("v"), Some(&CellValue::Number(0.0)));
    }

    #[test]
    fn test_count_mode_counts_rows_not_numbers() {
        let rows = RowSet::from_cells(
            ["k", "v"],
            vec![
                vec!["a".into(), "x".into()],
                vec!["a".into(), CellValue::Null],
                vec!["b".into(), 1.into()],
            ],
        )
        .unwrap();
        let spec = AggregationSpec::new("k").measure("v").mode(AggregationMode::Count);
        let records = AggregationEngine::new().aggregate(&rows, &spec);
        assert_eq!(records[0].measure("v"), Some(&CellValue::Number(2.0)));
        assert_eq!(records[1].measure("v"), Some(&CellValue::Number(1.0)));
    }

    #[test]
    fn test_empty_measures_count_sorted_descending() {
        let rows = RowSet::from_cells(
            ["k"],
            vec![
                vec!["a".into()],
                vec!["b".into()],
                vec!["b".into()],
                vec!["c".into()],
            ],
        )
        .unwrap();

        for mode in [AggregationMode::None, AggregationMode::Sum, AggregationMode::Count] {
            let spec = AggregationSpec::new("k").mode(mode);
            let records = AggregationEngine::new().aggregate(&rows, &spec);
            let keys: Vec<_> = records.iter().map(|r| r.key().key().into_owned()).collect();
            assert_eq!(keys, vec!["b", "a", "c"]);
            assert_eq!(records[0].measure(COUNT_FIELD), Some(&CellValue::Number(2.0)));
        }
    }

    #[test]
    fn test_passthrough() {
        let spec = AggregationSpec::new("city").measures(["sales", "ghost"]);
        let records = AggregationEngine::new().aggregate(&city_sales(), &spec);

        assert_eq!(records.len(), 3);
        assert_eq!(records[2].key(), &CellValue::from("LA"));
        assert_eq!(records[2].measure("sales"), Some(&CellValue::from(5)));
        assert_eq!(records[2].measure("ghost"), Some(&CellValue::Null));
    }

    #[test]
    fn test_missing_x_axis_is_empty() {
        let engine = AggregationEngine::new();
        assert!(engine.aggregate(&city_sales(), &AggregationSpec::default()).is_empty());
        assert!(engine
            .aggregate(&city_sales(), &AggregationSpec::new("region"))
            .is_empty());
    }

    #[test]
    fn test_caps_and_metadata() {
        let data: Vec<Vec<CellValue>> = (0..30).map(|i| vec![CellValue::from(i), 1.into()]).collect();
        let rows = RowSet::from_cells(["k", "v"], data).unwrap();
        let engine = AggregationEngine::with_config(
            AggregationConfig::new()
                .with_raw_record_limit(10)
                .with_grouped_record_limit(5),
        );

        let grouped = engine.aggregate_with_meta(
            &rows,
            &AggregationSpec::new("k").measure("v").mode(AggregationMode::Sum),
        );
        assert_eq!(grouped.records.len(), 5);
        assert_eq!(grouped.metadata.total_records, 30);
        assert!(grouped.metadata.truncated);

        let raw = engine.aggregate_with_meta(&rows, &AggregationSpec::new("k").measure("v"));
        assert_eq!(raw.records.len(), 10);

        let counted = engine.aggregate_with_meta(&rows, &AggregationSpec::new("k"));
        assert_eq!(counted.records.len(), 10);
        assert_eq!(counted.metadata.included_records, 10);
    }

    #[test]
    fn test_numeric_keys_group_by_string_form() {
        let rows = RowSet::from_cells(
            ["year", "v"],
            vec![
                vec![2024.into(), 1.into()],
                vec!["2024".into(), 2.into()],
                vec![2023.into(), 4.into()],
            ],
        )
        .unwrap();
        let spec = AggregationSpec::new("year").measure("v").mode(AggregationMode::Sum);
        let records = AggregationEngine::new().aggregate(&rows, &spec);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key(), &CellValue::from(2024));
        assert_eq!(records[0].measure("v"), Some(&CellValue::Number(3.0)));
    }

    #[test]
    fn test_spec_json_shape() {
        let spec: AggregationSpec =
            serde_json::from_str(r#"{"xAxis":"city","yAxis":["sales"],"mode":"avg"}"#).unwrap();
        assert_eq!(spec.x_axis.as_deref(), Some("city"));
        assert_eq!(spec.mode, AggregationMode::Avg);

        let bare: AggregationSpec = serde_json::from_str("{}").unwrap();
        assert_eq!(bare.mode, AggregationMode::None);
        assert!(bare.y_axis.is_empty());
    }

    #[test]
    fn test_rename_column() {
        let mut spec = AggregationSpec::new("city").measures(["sales", "city"]);
        spec.rename_column("city", "town");
        assert_eq!(spec.x_axis.as_deref(), Some("town"));
        assert_eq!(spec.y_axis, vec!["sales".to_string(), "town".to_string()]);
    }
}
