//! Turns pasted text or decoded sheets into validated `{name, phone}` candidates.
//!
//! Two input shapes are supported:
//! - positional text, one `name,phone` record per line;
//! - header-driven sheets, where the first row names the columns.
//!
//! Rows that fail validation are dropped and reported; only an unresolvable
//! column layout aborts a sheet.

use tracing::{debug, warn};

use super::cell::{Cell, row_is_blank};
use super::error::LeadError;

pub const UNNAMED_LEAD: &str = "Unnamed Lead";
pub const MIN_PHONE_DIGITS: usize = 8;

const NAME_TOKENS: &[&str] = &["name", "nome"];
const PHONE_TOKENS: &[&str] = &["phone", "tel", "celular", "whatsapp", "fone"];

/// Fixed external layout: name, unused campaign label, phone.
const LEGACY_LAYOUT: ColumnMap = ColumnMap {
    name_idx: 0,
    phone_idx: 2,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    /// 1-based position in the original input.
    pub row: usize,
    pub reason: String,
}

impl RowRejection {
    pub fn into_error(self) -> LeadError {
        LeadError::Validation {
            row: self.row,
            reason: self.reason,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBatch {
    pub candidates: Vec<Candidate>,
    pub rejected: Vec<RowRejection>,
}

impl NormalizedBatch {
    fn push(&mut self, row: usize, name: &str, raw_phone: &str) {
        match validate_phone(raw_phone) {
            Ok(phone) => self.candidates.push(Candidate {
                name: normalize_name(name),
                phone,
            }),
            Err(reason) => {
                debug!("Dropping row {}: {}", row, reason);
                self.rejected.push(RowRejection { row, reason });
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub name_idx: usize,
    pub phone_idx: usize,
}

/// What to do with a sheet whose first row carries no recognizable header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderPolicy {
    #[default]
    Strict,
    /// Read every row with the fixed name/label/phone layout.
    LegacyLayout,
}

/// Keep only ASCII digits. Idempotent.
pub fn sanitize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn validate_phone(raw: &str) -> Result<String, String> {
    let digits = sanitize_phone(raw);
    if digits.len() < MIN_PHONE_DIGITS {
        return Err(format!(
            "phone '{}' has {} digits, at least {} required",
            raw.trim(),
            digits.len(),
            MIN_PHONE_DIGITS
        ));
    }
    Ok(digits)
}

fn normalize_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNNAMED_LEAD.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse pasted text: each non-blank line is `name,phone[,...]`.
pub fn parse_positional(text: &str) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.split(',');
        let name = parts.next().unwrap_or_default();
        let phone = parts.next().unwrap_or_default();
        batch.push(idx + 1, name, phone);
    }
    batch
}

fn matches_any(header: &str, tokens: &[&str]) -> bool {
    let lowered = header.to_lowercase();
    tokens.iter().any(|t| lowered.contains(t))
}

/// Whether the row looks like a header at all.
pub fn looks_like_header(row: &[Cell]) -> bool {
    row.iter().any(|cell| match cell {
        Cell::Text(s) => matches_any(s, NAME_TOKENS) || matches_any(s, PHONE_TOKENS),
        _ => false,
    })
}

/// Resolve the name and phone column indices from a header row.
pub fn detect_columns(header: &[Cell]) -> Result<ColumnMap, LeadError> {
    let texts: Vec<String> = header.iter().map(Cell::as_text).collect();
    let name_idx = texts.iter().position(|h| matches_any(h, NAME_TOKENS));
    let phone_idx = texts
        .iter()
        .enumerate()
        .position(|(i, h)| Some(i) != name_idx && matches_any(h, PHONE_TOKENS));

    match (name_idx, phone_idx) {
        (Some(name_idx), Some(phone_idx)) => Ok(ColumnMap {
            name_idx,
            phone_idx,
        }),
        _ => Err(header_failure()),
    }
}

fn header_failure() -> LeadError {
    LeadError::HeaderDetection {
        expected_name: "Name/Nome".to_string(),
        expected_phone: "Phone/Telefone/Tel/Celular/WhatsApp".to_string(),
    }
}

/// Parse a decoded sheet, using its first row as the header when it has one.
pub fn parse_sheet(rows: &[Vec<Cell>], policy: HeaderPolicy) -> Result<NormalizedBatch, LeadError> {
    let Some(first) = rows.first() else {
        return Ok(NormalizedBatch::default());
    };

    let (columns, data_start) = if looks_like_header(first) {
        (detect_columns(first)?, 1)
    } else {
        match policy {
            HeaderPolicy::Strict => return Err(header_failure()),
            HeaderPolicy::LegacyLayout => {
                warn!(
                    "No header row detected; reading columns {} (name) and {} (phone)",
                    LEGACY_LAYOUT.name_idx, LEGACY_LAYOUT.phone_idx
                );
                (LEGACY_LAYOUT, 0)
            }
        }
    };

    let mut batch = NormalizedBatch::default();
    for (idx, row) in rows.iter().enumerate().skip(data_start) {
        if row_is_blank(row) {
            continue;
        }
        let name = row
            .get(columns.name_idx)
            .map(Cell::as_text)
            .unwrap_or_default();
        let phone = row
            .get(columns.phone_idx)
            .map(Cell::as_text)
            .unwrap_or_default();
        batch.push(idx + 1, &name, &phone);
    }
    Ok(batch)
}
