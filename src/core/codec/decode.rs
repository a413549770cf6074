use anyhow::{Context, Result, anyhow, bail};
use calamine::{Data, Reader, open_workbook_auto};
use std::path::Path;
use tracing::debug;

use crate::core::leads::cell::Cell;

const DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

/// Read the first worksheet of a lead file into rows of cells.
pub fn decode_path(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" | "txt" => {
            let bytes =
                std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
            decode_delimited(&bytes)
        }
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => decode_workbook(path),
        "xml" => bail!(
            "SpreadsheetML (.xml) files can be exported but not imported; save the sheet as .xlsx, .ods or .csv first"
        ),
        other => bail!(
            "Unsupported file type '{}': use .csv, .txt, .xlsx, .xls or .ods",
            other
        ),
    }
}

fn decode_workbook(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("{} contains no worksheets", path.display()))?
        .with_context(|| format!("Failed to read the first worksheet of {}", path.display()))?;

    let rows: Vec<Vec<Cell>> = range
        .rows()
        .map(|row| row.iter().map(data_to_cell).collect())
        .collect();
    debug!("Decoded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::text(s.as_str()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s.as_str()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

/// The delimiter that occurs most often outside quotes on the first non-blank line.
fn sniff_delimiter(text: &str) -> u8 {
    let Some(line) = text.lines().find(|l| !l.trim().is_empty()) else {
        return b',';
    };
    let mut counts = [0usize; DELIMITERS.len()];
    let mut quoted = false;
    for byte in line.bytes() {
        if byte == b'"' {
            quoted = !quoted;
        } else if !quoted {
            if let Some(i) = DELIMITERS.iter().position(|d| *d == byte) {
                counts[i] += 1;
            }
        }
    }
    let mut best = 0;
    for i in 1..DELIMITERS.len() {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    DELIMITERS[best]
}

/// Parse CSV-like bytes, tolerating a UTF-8 BOM and `;` or tab separators.
pub fn decode_delimited(bytes: &[u8]) -> Result<Vec<Vec<Cell>>> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    let delimiter = sniff_delimiter(text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("Malformed delimited input")?;
        rows.push(record.iter().map(Cell::text).collect());
    }
    Ok(rows)
}
