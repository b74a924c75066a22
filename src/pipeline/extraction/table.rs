//! Normalizes every input shape into one `RawRow` stream.
//!
//! - `.xlsx` / `.xls`: calamine, first sheet with a non-blank row.
//! - `.csv`: csv crate, delimiter sniffed from the first line, UTF-8 with
//!   BOM or Windows-1252.
//! - PDF: one single-cell row per reconstructed line.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use encoding_rs::WINDOWS_1252;

use super::sanitize::sanitize_cell_text;
use super::types::{CellValue, ExtractionWarning, RawRow};
use super::ExtractionError;

/// Rows of one ingested spreadsheet, plus anything worth reporting.
#[derive(Debug, Clone, Default)]
pub struct IngestedTable {
    pub rows: Vec<RawRow>,
    pub warnings: Vec<ExtractionWarning>,
}

impl IngestedTable {
    pub fn has_content(&self) -> bool {
        self.rows.iter().any(|r| !r.is_blank())
    }
}

/// Read an `.xlsx`/`.xls` workbook into rows.
pub fn ingest_workbook(file_bytes: &[u8]) -> Result<IngestedTable, ExtractionError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(file_bytes.to_vec()))
        .map_err(|e| ExtractionError::MalformedSpreadsheet(e.to_string()))?;

    let mut warnings = Vec::new();
    for (sheet, range) in workbook.worksheets() {
        let rows: Vec<RawRow> = range
            .rows()
            .enumerate()
            .map(|(index, cells)| RawRow::new(index, cells.iter().map(data_to_cell).collect()))
            .collect();

        if rows.iter().all(RawRow::is_blank) {
            tracing::debug!(sheet = %sheet, "Skipping empty sheet");
            warnings.push(ExtractionWarning::EmptySheetSkipped { sheet });
            continue;
        }

        tracing::debug!(sheet = %sheet, rows = rows.len(), "Workbook sheet ingested");
        return Ok(IngestedTable { rows, warnings });
    }

    Ok(IngestedTable {
        rows: Vec::new(),
        warnings,
    })
}

fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::text(&sanitize_cell_text(s)),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Error(_) => CellValue::Empty,
        other => CellValue::text(&other.to_string()),
    }
}

/// Read a `.csv` upload into rows.
pub fn ingest_csv(file_bytes: &[u8]) -> Result<IngestedTable, ExtractionError> {
    let text = decode_text(file_bytes);
    let delimiter = sniff_delimiter(&text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ExtractionError::MalformedSpreadsheet(e.to_string()))?;
        let cells = record
            .iter()
            .map(|field| CellValue::text(&sanitize_cell_text(field)))
            .collect();
        rows.push(RawRow::new(index, cells));
    }

    tracing::debug!(rows = rows.len(), delimiter = %(delimiter as char), "CSV ingested");
    Ok(IngestedTable {
        rows,
        warnings: Vec::new(),
    })
}

/// UTF-8 (BOM stripped) when valid, otherwise Windows-1252.
fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEFu8, 0xBB, 0xBF][..]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            tracing::debug!("CSV is not UTF-8, decoding as Windows-1252");
            WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned()
        }
    }
}

/// Most frequent of `;`, `,`, tab on the first non-empty line; `;` wins ties
/// since Portuguese exports use `,` as the decimal mark.
fn sniff_delimiter(text: &str) -> u8 {
    let first = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let count = |c: char| first.matches(c).count();

    [(b';', count(';')), (b'\t', count('\t')), (b',', count(','))]
        .into_iter()
        .fold((b';', 0), |best, candidate| {
            if candidate.1 > best.1 {
                candidate
            } else {
                best
            }
        })
        .0
}

/// Workbooks store numeric item codes as floats, so "1.10" comes back as 1.1.
/// Within one major number the minor part only grows; a numeric minor that
/// does not exceed the previous one gets its trailing zeros back until it does.
pub fn restore_numeric_codes(rows: &mut [RawRow], column: usize) {
    let mut previous: Option<(String, String)> = None;
    for row in rows.iter_mut() {
        let Some(cell) = row.cells.get_mut(column) else {
            continue;
        };
        let text = cell.as_text();
        let Some((major, minor)) = text.split_once('.') else {
            continue;
        };
        let (Some(_), Some(mut value)) = (digits_value(major), digits_value(minor)) else {
            continue;
        };

        let mut minor = minor.to_string();
        let is_number = matches!(cell, CellValue::Number(_));
        if let (true, Some((prev_major, prev_minor))) = (is_number, &previous) {
            let prev_value = digits_value(prev_minor).unwrap_or(0);
            if prev_major == major && value <= prev_value {
                while value <= prev_value && minor.len() <= prev_minor.len() {
                    minor.push('0');
                    value *= 10;
                }
                tracing::debug!(row = row.index, code = %format!("{major}.{minor}"), "Restored numeric item code");
                *cell = CellValue::Text(format!("{major}.{minor}"));
            }
        }
        previous = Some((major.to_string(), minor));
    }
}

fn digits_value(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// PDF lines as single-column rows.
pub fn rows_from_lines(lines: &[String]) -> Vec<RawRow> {
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| RawRow::new(index, vec![CellValue::text(line)]))
        .collect()
}

/// Audit text for a spreadsheet: one line per row, cells separated by " | ".
pub fn rows_to_text(rows: &[RawRow]) -> String {
    rows.iter()
        .filter(|r| !r.is_blank())
        .map(|r| {
            r.cells
                .iter()
                .map(CellValue::as_text)
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
