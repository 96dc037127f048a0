//! Helpers shared by the integration tests.

#![allow(dead_code)]

use datadeck::table::{CellValue, RowSet};

/// Builds a row set, panicking on malformed input.
pub fn rows<const N: usize>(columns: [&str; N], data: Vec<Vec<CellValue>>) -> RowSet {
    RowSet::from_cells(columns, data).expect("valid test rows")
}

/// A single-column row set of numbers.
pub fn numbers(column: &str, values: &[f64]) -> RowSet {
    RowSet::from_cells([column], values.iter().map(|v| vec![CellValue::Number(*v)]))
        .expect("valid test rows")
}

/// City/sales rows: NY 10, NY 20, LA 5.
pub fn city_sales() -> RowSet {
    rows(
        ["city", "sales"],
        vec![
            vec!["NY".into(), 10.into()],
            vec!["NY".into(), 20.into()],
            vec!["LA".into(), 5.into()],
        ],
    )
}

/// Routes tracing output through the test harness. Safe to call repeatedly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("datadeck=debug")
        .with_test_writer()
        .try_init();
}
