//! XLSX decoding via calamine.

use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use tracing::debug;

use crate::error::{DeckError, Result};
use crate::table::CellValue;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Decode an XLSX workbook into a raw cell grid.
///
/// Reads `sheet_name` when given, otherwise the first sheet. Date cells are
/// rendered as ISO-8601 text; empty and error cells become `null`.
pub fn decode_xlsx(bytes: &[u8], sheet_name: Option<&str>) -> Result<Vec<Vec<CellValue>>> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;

    let sheet = match sheet_name {
        Some(name) => name.to_string(),
        None => match workbook.sheet_names().first() {
            Some(first) => first.clone(),
            None => return Ok(Vec::new()),
        },
    };

    let range = workbook.worksheet_range(&sheet).map_err(|e| {
        DeckError::decode("XLSX", format!("failed to read sheet '{sheet}': {e}"))
    })?;

    let grid: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(xlsx_cell).collect())
        .collect();

    debug!(sheet = %sheet, rows = grid.len(), "Decoded XLSX sheet");
    Ok(grid)
}

fn xlsx_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => serial_to_iso(dt.as_f64())
            .map(CellValue::Text)
            .unwrap_or(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Render an Excel serial date (days since 1899-12-30) as ISO-8601.
///
/// Whole days render as `YYYY-MM-DD`, anything with a time of day as
/// `YYYY-MM-DDTHH:MM:SS`.
fn serial_to_iso(serial: f64) -> Option<String> {
    if !serial.is_finite() {
        return None;
    }
    let epoch: NaiveDateTime = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * MILLIS_PER_DAY).round() as i64;
    let datetime = epoch.checked_add_signed(Duration::try_milliseconds(millis)?)?;

    if datetime.num_seconds_from_midnight() == 0 {
        Some(datetime.format("%Y-%m-%d").to_string())
    } else {
        Some(datetime.format("%Y-%m-%dT%H:%M:%S").to_string())
    }
}
