//! End-to-end tests: ingest, build charts, edit the data, render dashboards.

mod common;

use datadeck::analyzers::{AggregationMode, AggregationSpec, ColumnType, FilterSpec, InsightsPipeline};
use datadeck::config::DeckConfig;
use datadeck::project::{
    ChartConfig, ChartKind, GlobalDashboard, MissingReason, Project, ProjectSource, TileLayout,
};
use datadeck::sources::{ingest_bytes, DecodeOptions, SheetFormat};
use datadeck::table::CellValue;
use serde_json::json;

const ORDERS_CSV: &[u8] = b"region,product,units,price,shipped\n\
north,widget,3,2.5,true\n\
south,widget,1,2.5,false\n\
north,gadget,2,10,true\n\
east,widget,5,2.5,true\n\
north,widget,3,2.5,true\n\
south,gadget,,10,false\n";

fn orders_project() -> Project {
    let rows = ingest_bytes(ORDERS_CSV, SheetFormat::Csv, &DecodeOptions::new()).unwrap();
    Project::new("Orders", ProjectSource::upload("orders.csv", true), rows)
}

fn units_by_region() -> ChartConfig {
    ChartConfig::new(
        "Units by region",
        ChartKind::Bar,
        AggregationSpec::new("region").measure("units").mode(AggregationMode::Sum),
    )
}

#[test]
fn test_ingested_project_profiles() {
    common::init_test_logging();
    let project = orders_project();
    let pipeline = InsightsPipeline::new();

    assert_eq!(project.column_types()["units"], ColumnType::Numeric);
    assert_eq!(project.column_types()["shipped"], ColumnType::Boolean);
    assert_eq!(project.column_types()["region"], ColumnType::Categorical);

    let profiles = project.baseline_profiles(&pipeline);
    let units = &profiles["units"];
    assert_eq!(units.missing_count, 1);
    let summary = units.numeric.as_ref().unwrap();
    assert_eq!(summary.min, 1.0);
    assert_eq!(summary.max, 5.0);
    assert_eq!(summary.median, 3.0);

    let region = serde_json::to_value(&profiles["region"]).unwrap();
    assert_eq!(region["type"], "categorical");
    assert_eq!(region["topCategories"][0], json!({"value": "north", "count": 3}));

    let insights = project.insights(&pipeline, &FilterSpec::new().allow("shipped", ["false"]));
    assert_eq!(insights.rows.len(), 2);
    assert_eq!(insights.profiles["units"].missing_count, 1);
    assert_eq!(insights.profiles["region"].unique_count, 1);
}

#[test]
fn test_chart_modes() {
    let project = orders_project();
    let pipeline = InsightsPipeline::new();

    let sums = project.preview_chart(&pipeline, &units_by_region());
    assert_eq!(
        serde_json::to_value(&sums.records).unwrap(),
        json!([
            {"region": "north", "units": 8.0},
            {"region": "south", "units": 1.0},
            {"region": "east", "units": 5.0},
        ])
    );

    let counts = project.preview_chart(
        &pipeline,
        &ChartConfig::new("Orders per product", ChartKind::Pie, AggregationSpec::new("product")),
    );
    assert_eq!(counts.measures, vec!["count".to_string()]);
    assert_eq!(counts.records[0].key(), &CellValue::from("widget"));
    assert_eq!(counts.records[0].measure("count"), Some(&CellValue::Number(4.0)));

    let raw = project.preview_chart(
        &pipeline,
        &ChartConfig::new(
            "Price vs units",
            ChartKind::Scatter,
            AggregationSpec::new("price").measure("units"),
        ),
    );
    assert_eq!(raw.records.len(), 6);
    assert_eq!(raw.records[5].measure("units"), Some(&CellValue::Null));

    let filtered = project.preview_chart(
        &pipeline,
        &units_by_region().with_filters(FilterSpec::new().allow("product", ["gadget"])),
    );
    assert_eq!(filtered.records.len(), 2);
    assert_eq!(filtered.records[0].measure("units"), Some(&CellValue::Number(2.0)));
    assert_eq!(filtered.records[1].measure("units"), Some(&CellValue::Number(0.0)));
}

#[test]
fn test_configured_caps_mark_truncation() {
    let project = orders_project();
    let config = DeckConfig::default().with_grouped_record_limit(2);
    let pipeline = InsightsPipeline::from_config(&config);

    let data = project.preview_chart(&pipeline, &units_by_region());
    assert_eq!(data.records.len(), 2);
    assert!(data.truncated);
}

#[test]
fn test_edits_flow_into_saved_charts() {
    let mut project = orders_project();
    let pipeline = InsightsPipeline::new();
    let chart_id = project.add_chart(
        units_by_region().with_filters(FilterSpec::new().min("units", "2")),
    );

    project.rename_column("units", "quantity").unwrap();
    let data = project.chart_data(&pipeline, chart_id).unwrap();
    assert_eq!(data.measures, vec!["quantity".to_string()]);
    assert_eq!(data.records[0].measure("quantity"), Some(&CellValue::Number(8.0)));

    assert_eq!(project.remove_duplicate_rows(), 1);
    let data = project.chart_data(&pipeline, chart_id).unwrap();
    assert_eq!(data.records[0].measure("quantity"), Some(&CellValue::Number(5.0)));

    let snapshot = project.rows();
    project.delete_row(0).unwrap();
    assert_eq!(snapshot.len(), 5);
    assert_eq!(project.rows().len(), 4);

    assert!(matches!(
        project.rename_column("quantity", "region"),
        Err(datadeck::error::DeckError::DuplicateColumn { .. })
    ));
}

#[test]
fn test_project_dashboard_layout() {
    let mut project = orders_project();
    let first = project.add_chart(units_by_region());
    let second = project.add_chart(ChartConfig::new(
        "Products",
        ChartKind::Pie,
        AggregationSpec::new("product"),
    ));

    assert_eq!(project.layout().tile(first).unwrap().layout, TileLayout::new(0, 0, 6, 4));
    assert_eq!(project.layout().tile(second).unwrap().layout, TileLayout::new(0, 4, 6, 4));

    project.arrange_tile(second, TileLayout::new(6, 0, 6, 4)).unwrap();
    let third = project.add_chart(units_by_region());
    assert_eq!(project.layout().tile(third).unwrap().layout.y, 4);
}

#[test]
fn test_global_dashboard_reports_missing_tiles() {
    let mut orders = orders_project();
    let kept = orders.add_chart(units_by_region());
    let dropped = orders.add_chart(ChartConfig::new(
        "Products",
        ChartKind::Pie,
        AggregationSpec::new("product"),
    ));

    let mut other = Project::new("Cities", ProjectSource::Inline, common::city_sales());
    let other_chart = other.add_chart(ChartConfig::new(
        "Cities",
        ChartKind::Bar,
        AggregationSpec::new("city"),
    ));

    let mut dashboard = GlobalDashboard::new();
    dashboard.pin(orders.id(), kept);
    dashboard.pin(orders.id(), dropped);
    dashboard.pin(other.id(), other_chart);

    orders.remove_chart(dropped).unwrap();
    let render = dashboard.render(&InsightsPipeline::new(), [&orders]);

    assert_eq!(render.tiles.len(), 1);
    assert_eq!(render.tiles[0].project_name, "Orders");
    assert_eq!(render.tiles[0].data.chart_id, Some(kept));
    assert_eq!(render.missing.len(), 2);
    assert_eq!(render.missing[0].reason, MissingReason::ChartNotFound);
    assert_eq!(render.missing[1].reason, MissingReason::ProjectNotFound);

    assert_eq!(dashboard.prune_project(other.id()), 1);
    let render = dashboard.render(&InsightsPipeline::new(), [&orders, &other]);
    assert_eq!(render.missing.len(), 1);
}
