//! CSV decoding.

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{DeckError, Result};
use crate::table::coerce::parse_decimal;
use crate::table::CellValue;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode CSV bytes into a raw cell grid.
///
/// Records may have different widths. Empty fields become `null`, plain
/// decimal numbers become numbers and everything else stays text. Numbers
/// with leading zeros (`"007"`) stay text so identifiers survive intact.
pub fn decode_csv(bytes: &[u8], delimiter: u8) -> Result<Vec<Vec<CellValue>>> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut grid = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            DeckError::decode_with_source("CSV", format!("record {}: {e}", index + 1), Box::new(e))
        })?;
        grid.push(record.iter().map(csv_cell).collect());
    }

    debug!(records = grid.len(), "Decoded CSV records");
    Ok(grid)
}

fn csv_cell(field: &str) -> CellValue {
    if field.is_empty() {
        return CellValue::Null;
    }
    if has_leading_zero(field) {
        return CellValue::from(field);
    }
    match parse_decimal(field) {
        Some(number) => CellValue::Number(number),
        None => CellValue::from(field),
    }
}

/// `"007"` or `"-01"`, but not `"0"` or `"0.5"`.
fn has_leading_zero(field: &str) -> bool {
    let digits = field.trim_start_matches(['+', '-']).as_bytes();
    digits.len() > 1 && digits[0] == b'0' && digits[1].is_ascii_digit()
}
