//! Row sets: the in-memory table backing a project.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::value::CellValue;
use crate::error::{DeckError, Result};

/// One row, positionally aligned with the owning [`RowSet`]'s columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    cells: Vec<CellValue>,
}

impl Row {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    /// Returns the cell at `index`; positions past the end read as `null`.
    pub fn get(&self, index: usize) -> &CellValue {
        static NULL: CellValue = CellValue::Null;
        self.cells.get(index).unwrap_or(&NULL)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl From<Vec<CellValue>> for Row {
    fn from(cells: Vec<CellValue>) -> Self {
        Self::new(cells)
    }
}

/// An ordered list of column names plus the rows under them.
///
/// Row sets are immutable values. Every edit returns a new row set so that a
/// snapshot handed to a consumer never changes underneath it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl RowSet {
    /// Creates a row set, padding short rows with `null` and rejecting rows
    /// wider than the column list or repeated column names.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(DeckError::DuplicateColumn {
                    column: column.clone(),
                });
            }
        }

        let width = columns.len();
        let mut padded = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(DeckError::Internal(format!(
                    "row {index} has {} cells but only {width} columns exist",
                    row.len()
                )));
            }
            let mut cells = row.cells;
            cells.resize(width, CellValue::Null);
            padded.push(Row { cells });
        }

        Ok(Self {
            columns,
            rows: padded,
        })
    }

    /// Convenience constructor from column names and raw cell vectors.
    pub fn from_cells<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: impl IntoIterator<Item = Vec<CellValue>>,
    ) -> Result<Self> {
        Self::new(
            columns.into_iter().map(Into::into).collect(),
            rows.into_iter().map(Row::new).collect(),
        )
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Iterates the values of one column, or `None` if the column is absent.
    pub fn column_values<'a>(
        &'a self,
        column: &str,
    ) -> Option<impl Iterator<Item = &'a CellValue> + 'a> {
        let index = self.column_index(column)?;
        Some(self.rows.iter().map(move |row| row.get(index)))
    }

    /// Returns one cell by row position and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|r| r.get(index))
    }

    /// Returns a row set with the same columns and only the rows matching `keep`.
    pub fn filter_rows<F>(&self, mut keep: F) -> RowSet
    where
        F: FnMut(&Row) -> bool,
    {
        RowSet {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }

    /// Returns a copy with `old` renamed to `new`.
    pub fn rename_column(&self, old: &str, new: &str) -> Result<RowSet> {
        let index = self
            .column_index(old)
            .ok_or_else(|| DeckError::column_not_found(old))?;
        if old != new && self.has_column(new) {
            return Err(DeckError::DuplicateColumn {
                column: new.to_string(),
            });
        }

        let mut columns = self.columns.clone();
        columns[index] = new.to_string();
        Ok(RowSet {
            columns,
            rows: self.rows.clone(),
        })
    }

    /// Returns a copy without the row at `index`.
    pub fn delete_row(&self, index: usize) -> Result<RowSet> {
        if index >= self.rows.len() {
            return Err(DeckError::RowOutOfBounds {
                index,
                len: self.rows.len(),
            });
        }

        let mut rows = self.rows.clone();
        rows.remove(index);
        Ok(RowSet {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Returns a copy keeping only the first occurrence of each distinct row,
    /// plus the number of rows removed.
    ///
    /// Rows are compared by their stringified cells, with `null` and empty
    /// text kept apart.
    pub fn remove_duplicate_rows(&self) -> (RowSet, usize) {
        let mut seen: HashSet<Vec<(u8, String)>> = HashSet::with_capacity(self.rows.len());
        let mut rows = Vec::with_capacity(self.rows.len());

        for row in &self.rows {
            let signature = row
                .cells
                .iter()
                .map(|cell| {
                    let tag = match cell {
                        CellValue::Null => 0,
                        CellValue::Bool(_) => 1,
                        CellValue::Number(_) => 2,
                        CellValue::Text(_) => 3,
                    };
                    (tag, cell.key().into_owned())
                })
                .collect::<Vec<_>>();
            if seen.insert(signature) {
                rows.push(row.clone());
            }
        }

        let removed = self.rows.len() - rows.len();
        (
            RowSet {
                columns: self.columns.clone(),
                rows,
            },
            removed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cities() -> RowSet {
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
    fn test_short_rows_are_padded() {
        let rows = RowSet::from_cells(["a", "b"], vec![vec![1.into()]]).unwrap();
        assert_eq!(rows.cell(0, "b"), Some(&CellValue::Null));
    }

    #[test]
    fn test_wide_rows_are_rejected() {
        let result = RowSet::from_cells(["a"], vec![vec![1.into(), 2.into()]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_columns_are_rejected() {
        let result = RowSet::from_cells(["a", "a"], Vec::<Vec<CellValue>>::new());
        assert!(matches!(result, Err(DeckError::DuplicateColumn { .. })));
    }

    #[test]
    fn test_column_values() {
        let rows = cities();
        let sales: Vec<_> = rows.column_values("sales").unwrap().cloned().collect();
        assert_eq!(sales, vec![10.into(), 20.into(), 5.into()]);
        assert!(rows.column_values("missing").is_none());
    }

    #[test]
    fn test_rename_column_is_copy_on_write() {
        let rows = cities();
        let renamed = rows.rename_column("sales", "revenue").unwrap();
        assert_eq!(renamed.columns(), &["city".to_string(), "revenue".to_string()]);
        assert_eq!(rows.columns(), &["city".to_string(), "sales".to_string()]);
        assert_eq!(renamed.cell(1, "revenue"), Some(&CellValue::from(20)));
    }

    #[test]
    fn test_rename_column_errors() {
        let rows = cities();
        assert!(matches!(
            rows.rename_column("nope", "x"),
            Err(DeckError::ColumnNotFound { .. })
        ));
        assert!(matches!(
            rows.rename_column("sales", "city"),
            Err(DeckError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn test_delete_row() {
        let rows = cities();
        let fewer = rows.delete_row(0).unwrap();
        assert_eq!(fewer.len(), 2);
        assert_eq!(fewer.cell(0, "sales"), Some(&CellValue::from(20)));
        assert!(matches!(
            rows.delete_row(3),
            Err(DeckError::RowOutOfBounds { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_remove_duplicate_rows_keeps_first() {
        let rows = RowSet::from_cells(
            ["k", "v"],
            vec![
                vec!["a".into(), 1.into()],
                vec!["b".into(), CellValue::Null],
                vec!["a".into(), 1.into()],
                vec!["b".into(), "".into()],
                vec!["b".into(), CellValue::Null],
            ],
        )
        .unwrap();

        let (deduped, removed) = rows.remove_duplicate_rows();
        assert_eq!(removed, 2);
        assert_eq!(deduped.len(), 3);
        assert_eq!(deduped.cell(2, "v"), Some(&CellValue::from("")));
    }
}
