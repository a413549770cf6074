//! Spreadsheet containers for lead import and export.

mod decode;
mod encode;

pub use decode::decode_path;
pub use encode::encode;

use anyhow::{Result, anyhow};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Xlsx,
    Ods,
    /// Excel 2003 XML workbook.
    SpreadsheetMl,
}

impl SheetFormat {
    pub const ALL: [SheetFormat; 4] = [
        SheetFormat::Csv,
        SheetFormat::Xlsx,
        SheetFormat::Ods,
        SheetFormat::SpreadsheetMl,
    ];

    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Ok(SheetFormat::Csv),
            "xlsx" => Ok(SheetFormat::Xlsx),
            "ods" => Ok(SheetFormat::Ods),
            "xml" | "spreadsheetml" => Ok(SheetFormat::SpreadsheetMl),
            other => Err(anyhow!(
                "Unknown format '{}'. Expected one of: {}",
                other,
                Self::ALL.map(Self::extension).join(", ")
            )),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| anyhow!("'{}' has no file extension", path.display()))?;
        Self::from_name(ext)
    }

    pub fn extension(self) -> &'static str {
        match self {
            SheetFormat::Csv => "csv",
            SheetFormat::Xlsx => "xlsx",
            SheetFormat::Ods => "ods",
            SheetFormat::SpreadsheetMl => "xml",
        }
    }
}

/// Worksheet names are capped at 31 characters and may not contain `[]:*?/\`.
pub(crate) fn sheet_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(31)
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').to_string();
    if cleaned.is_empty() {
        "Leads".to_string()
    } else {
        cleaned
    }
}
