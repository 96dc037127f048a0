//! Row sets shared by unit tests, integration tests and benches.
//!
//! Every fixture is deterministic so assertions can name exact counts.

use crate::table::{CellValue, RowSet};

const REGIONS: [&str; 5] = ["north", "south", "east", "west", "central"];
const PLANS: [&str; 3] = ["free", "pro", "team"];

/// Three city/sales rows: NY 10, NY 20, LA 5.
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

/// A `status` column of `active, active, inactive`.
pub fn statuses() -> RowSet {
    rows(
        ["status"],
        vec![
            vec!["active".into()],
            vec!["active".into()],
            vec!["inactive".into()],
        ],
    )
}

/// Customers with one column per inferred type and a sprinkling of blanks.
///
/// | column     | type        | missing |
/// |------------|-------------|---------|
/// | `name`     | categorical | 1       |
/// | `age`      | numeric     | 1       |
/// | `active`   | boolean     | 0       |
/// | `joined`   | datetime    | 1       |
/// | `notes`    | unknown     | 6       |
pub fn customers() -> RowSet {
    rows(
        ["name", "age", "active", "joined", "notes"],
        vec![
            vec!["Alice".into(), 25.into(), true.into(), "2023-01-15".into(), CellValue::Null],
            vec!["Bob".into(), 30.into(), "false".into(), "2023-02-01".into(), "".into()],
            vec!["Carol".into(), "35".into(), "true".into(), CellValue::Null, "".into()],
            vec![CellValue::Null, 41.into(), "false".into(), "2023-03-10T09:30:00".into(), CellValue::Null],
            vec!["Erin".into(), CellValue::Null, true.into(), "2023-04-22".into(), CellValue::Null],
            vec!["Frank".into(), 52.into(), false.into(), "2023-05-05".into(), CellValue::Null],
        ],
    )
}

/// `count` rows of generated sales data.
///
/// Columns: `id` (1..=count), `region` cycling through five regions, `plan`
/// cycling through three plans, `revenue` in `0..1000`, `active`
/// alternating booleans and `signup` as ISO dates in 2024. Every 17th revenue
/// is blank.
pub fn generated_sales(count: usize) -> RowSet {
    let data = (0..count).map(|i| {
        let revenue = if i % 17 == 16 {
            CellValue::Null
        } else {
            CellValue::Number(((i * 7919) % 1000) as f64 + 0.5)
        };
        vec![
            CellValue::Number((i + 1) as f64),
            REGIONS[i % REGIONS.len()].into(),
            PLANS[i % PLANS.len()].into(),
            revenue,
            CellValue::Bool(i % 2 == 0),
            format!("2024-{:02}-{:02}", i % 12 + 1, i % 28 + 1).into(),
        ]
    });
    rows(["id", "region", "plan", "revenue", "active", "signup"], data)
}

fn rows<const N: usize>(
    columns: [&str; N],
    data: impl IntoIterator<Item = Vec<CellValue>>,
) -> RowSet {
    match RowSet::from_cells(columns, data) {
        Ok(rows) => rows,
        Err(e) => panic!("invalid fixture: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::{ColumnType, TypeInferenceEngine};

    #[test]
    fn test_customer_types() {
        let types = TypeInferenceEngine::new().infer_columns(&customers());
        assert_eq!(types["name"], ColumnType::Categorical);
        assert_eq!(types["age"], ColumnType::Numeric);
        assert_eq!(types["active"], ColumnType::Boolean);
        assert_eq!(types["joined"], ColumnType::Datetime);
        assert_eq!(types["notes"], ColumnType::Unknown);
    }

    #[test]
    fn test_generated_sales_shape() {
        let rows = generated_sales(100);
        assert_eq!(rows.len(), 100);
        assert_eq!(rows.columns().len(), 6);
        assert_eq!(rows.cell(16, "revenue"), Some(&CellValue::Null));

        let types = TypeInferenceEngine::new().infer_columns(&rows);
        assert_eq!(types["revenue"], ColumnType::Numeric);
        assert_eq!(types["signup"], ColumnType::Datetime);
        assert_eq!(types["active"], ColumnType::Boolean);
    }
}
