//! Spreadsheet ingestion.
//!
//! Uploaded files and fetched URLs arrive as raw bytes. This module works out
//! whether they hold CSV or XLSX, decodes them into raw cell grids and then
//! shapes the grid into a [`RowSet`]:
//!
//! - fully blank rows are dropped
//! - in header mode the first remaining row names the columns; blank names
//!   become `Column_<n>` and repeated names get `_1`, `_2`, ... suffixes
//! - without header mode the columns are `Column_1..Column_N`, N being the
//!   widest row
//! - rows shorter than the column list are padded with `null`
//!
//! Decoding happens once, with no retries. A malformed file is an error for the
//! caller to show.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{ErrorContext, Result};
use crate::table::{CellValue, Row, RowSet};

mod csv;
#[cfg(feature = "remote")]
mod remote;
mod xlsx;

pub use self::csv::decode_csv;
#[cfg(feature = "remote")]
pub use self::remote::{fetch_sheet, import_url, validate_url, FetchOptions, FetchedSheet};
pub use self::xlsx::decode_xlsx;

/// Local file headers of a ZIP archive, which every XLSX package is.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Spreadsheet formats datadeck can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetFormat {
    Csv,
    Xlsx,
}

impl SheetFormat {
    /// Format implied by a file name or path, if recognisable.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" | "tsv" | "txt" => Some(SheetFormat::Csv),
            "xlsx" | "xlsm" => Some(SheetFormat::Xlsx),
            _ => None,
        }
    }

    /// Format implied by an HTTP `Content-Type`, if recognisable.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "text/csv" | "application/csv" | "text/plain" | "text/tab-separated-values" => {
                Some(SheetFormat::Csv)
            }
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.ms-excel.sheet.macroenabled.12" => Some(SheetFormat::Xlsx),
            _ => None,
        }
    }

    /// Guess from the bytes themselves: ZIP archives are XLSX, anything else CSV.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(ZIP_MAGIC) {
            SheetFormat::Xlsx
        } else {
            SheetFormat::Csv
        }
    }

    /// Pick a format from a file name, then a content type, then the bytes.
    pub fn detect(file_name: Option<&str>, content_type: Option<&str>, bytes: &[u8]) -> Self {
        file_name
            .and_then(Self::from_file_name)
            .or_else(|| content_type.and_then(Self::from_content_type))
            .unwrap_or_else(|| Self::sniff(bytes))
    }

    pub fn name(&self) -> &'static str {
        match self {
            SheetFormat::Csv => "CSV",
            SheetFormat::Xlsx => "XLSX",
        }
    }
}

/// Options controlling how raw grids become row sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecodeOptions {
    /// Whether the first non-blank row holds column names
    pub header_mode: bool,
    /// CSV field delimiter
    pub delimiter: u8,
    /// XLSX sheet to read; the first sheet when unset
    pub sheet_name: Option<String>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            header_mode: true,
            delimiter: b',',
            sheet_name: None,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header_mode(mut self, header_mode: bool) -> Self {
        self.header_mode = header_mode;
        self
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn sheet_name(mut self, sheet_name: impl Into<String>) -> Self {
        self.sheet_name = Some(sheet_name.into());
        self
    }
}

/// Decode spreadsheet bytes of a known format.
#[instrument(skip(bytes, options), fields(bytes = bytes.len(), header_mode = options.header_mode))]
pub fn ingest_bytes(bytes: &[u8], format: SheetFormat, options: &DecodeOptions) -> Result<RowSet> {
    let grid = match format {
        SheetFormat::Csv => decode_csv(bytes, options.delimiter)?,
        SheetFormat::Xlsx => decode_xlsx(bytes, options.sheet_name.as_deref())?,
    };
    let rows = assemble_row_set(grid, options.header_mode)?;
    info!(
        format = format.name(),
        columns = rows.columns().len(),
        rows = rows.len(),
        "Ingested spreadsheet"
    );
    Ok(rows)
}

/// Read and decode a spreadsheet file, detecting its format from the
/// extension and falling back to the file contents.
#[instrument(skip(path, options), fields(path = %path.as_ref().display()))]
pub async fn ingest_file(path: impl AsRef<Path>, options: &DecodeOptions) -> Result<RowSet> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read spreadsheet {}", path.display()))?;
    let format = SheetFormat::detect(path.to_str(), None, &bytes);
    ingest_bytes(&bytes, format, options)
}

/// Shape a raw cell grid into a row set.
pub fn assemble_row_set(grid: Vec<Vec<CellValue>>, header_mode: bool) -> Result<RowSet> {
    let mut records = grid
        .into_iter()
        .filter(|record| !record.iter().all(is_blank));

    let header = if header_mode { records.next() } else { None };
    let body: Vec<Vec<CellValue>> = records.collect();

    if header.is_none() && body.is_empty() {
        return Ok(RowSet::empty());
    }

    let widest = body.iter().map(Vec::len).max().unwrap_or(0);
    let columns = match header {
        Some(header) => header_names(&header, widest),
        None => (1..=widest).map(synthesized_name).collect(),
    };

    RowSet::new(columns, body.into_iter().map(Row::new).collect())
}

/// Null or text that is empty after trimming. Only used for sheet layout.
fn is_blank(cell: &CellValue) -> bool {
    match cell {
        CellValue::Text(s) => s.trim().is_empty(),
        other => other.is_missing(),
    }
}

fn synthesized_name(position: usize) -> String {
    format!("Column_{position}")
}

/// Column names from a header row, widened to `width` and made unique.
fn header_names(header: &[CellValue], width: usize) -> Vec<String> {
    let total = header.len().max(width);
    let mut taken: HashSet<String> = HashSet::with_capacity(total);
    let mut names = Vec::with_capacity(total);

    for position in 0..total {
        let raw = header
            .get(position)
            .filter(|cell| !is_blank(cell))
            .map(|cell| cell.key().trim().to_string())
            .unwrap_or_else(|| synthesized_name(position + 1));

        let mut name = raw.clone();
        let mut suffix = 1;
        while taken.contains(&name) {
            name = format!("{raw}_{suffix}");
            suffix += 1;
        }
        taken.insert(name.clone());
        names.push(name);
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_grid(rows: &[&[&str]]) -> Vec<Vec<CellValue>> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .map(|v| {
                        if v.is_empty() {
                            CellValue::Null
                        } else {
                            CellValue::from(*v)
                        }
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(SheetFormat::from_file_name("sales.CSV"), Some(SheetFormat::Csv));
        assert_eq!(SheetFormat::from_file_name("/tmp/book.xlsx"), Some(SheetFormat::Xlsx));
        assert_eq!(SheetFormat::from_file_name("notes"), None);
        assert_eq!(
            SheetFormat::from_content_type("text/csv; charset=utf-8"),
            Some(SheetFormat::Csv)
        );
        assert_eq!(SheetFormat::sniff(b"PK\x03\x04rest"), SheetFormat::Xlsx);
        assert_eq!(SheetFormat::sniff(b"a,b\n1,2"), SheetFormat::Csv);
        assert_eq!(
            SheetFormat::detect(Some("download"), None, b"PK\x03\x04"),
            SheetFormat::Xlsx
        );
    }

    #[test]
    fn test_header_mode() {
        let grid = text_grid(&[&["city", "sales"], &["NY", "10"], &["LA"]]);
        let rows = assemble_row_set(grid, true).unwrap();
        assert_eq!(rows.columns(), &["city".to_string(), "sales".to_string()]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.cell(1, "sales"), Some(&CellValue::Null));
    }

    #[test]
    fn test_header_names_are_cleaned_up() {
        let grid = text_grid(&[&["id", "", "id", " name "], &["1", "2", "3", "4", "5"]]);
        let rows = assemble_row_set(grid, true).unwrap();
        assert_eq!(
            rows.columns(),
            &["id", "Column_2", "id_1", "name", "Column_5"].map(String::from)
        );
    }

    #[test]
    fn test_without_header_mode() {
        let grid = text_grid(&[&["a"], &["b", "c", "d"]]);
        let rows = assemble_row_set(grid, false).unwrap();
        assert_eq!(
            rows.columns(),
            &["Column_1", "Column_2", "Column_3"].map(String::from)
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.cell(0, "Column_3"), Some(&CellValue::Null));
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let grid = text_grid(&[&["", ""], &["k", "v"], &["", "  "], &["a", "1"]]);
        let rows = assemble_row_set(grid, true).unwrap();
        assert_eq!(rows.columns(), &["k".to_string(), "v".to_string()]);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(assemble_row_set(Vec::new(), true).unwrap().columns().is_empty());
        assert!(assemble_row_set(Vec::new(), false).unwrap().is_empty());
    }

    #[test]
    fn test_header_only() {
        let rows = assemble_row_set(text_grid(&[&["a", "b"]]), true).unwrap();
        assert_eq!(rows.columns().len(), 2);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_ingest_csv_bytes() {
        let rows = ingest_bytes(b"city,sales\nNY,10\nLA,\n", SheetFormat::Csv, &DecodeOptions::new())
            .unwrap();
        assert_eq!(rows.cell(0, "sales"), Some(&CellValue::Number(10.0)));
        assert_eq!(rows.cell(1, "sales"), Some(&CellValue::Null));
    }
}
