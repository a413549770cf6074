use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::fmt::Write;

use super::error::LeadError;
use super::types::Collection;

pub const MISSING_AGENT: &str = "N/A";
pub const NOT_SENT: &str = "Pending";
pub const EXPORT_HEADERS: [&str; 6] = ["Name", "Phone", "Status", "Agent", "Imported At", "Sent At"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub name: String,
    pub phone: String,
    pub status: String,
    pub agent: String,
    pub imported_at: String,
    pub sent_at: String,
}

impl ExportRow {
    pub fn cells(&self) -> [&str; 6] {
        [
            &self.name,
            &self.phone,
            &self.status,
            &self.agent,
            &self.imported_at,
            &self.sent_at,
        ]
    }
}

/// Renders epoch milliseconds for humans.
#[derive(Debug, Clone)]
pub struct TimestampFormat {
    pub offset: FixedOffset,
    pub pattern: String,
}

pub const DEFAULT_TIMESTAMP_PATTERN: &str = "%Y-%m-%d %H:%M:%S";

/// Offsets must stay strictly within one day either side of UTC.
pub fn offset_from_minutes(offset_minutes: i32) -> Option<FixedOffset> {
    offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
}

/// Whether chrono can render `pattern` without a formatting error.
pub fn is_valid_pattern(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

impl TimestampFormat {
    /// Out-of-range offsets fall back to UTC and invalid patterns to the default.
    pub fn new(offset_minutes: i32, pattern: &str) -> Self {
        let offset = offset_from_minutes(offset_minutes).unwrap_or_else(|| Utc.fix());
        let pattern = if is_valid_pattern(pattern) {
            pattern
        } else {
            DEFAULT_TIMESTAMP_PATTERN
        };
        Self {
            offset,
            pattern: pattern.to_string(),
        }
    }

    pub fn render(&self, millis: i64) -> String {
        let Some(dt) = DateTime::from_timestamp_millis(millis) else {
            return millis.to_string();
        };
        let mut out = String::new();
        match write!(out, "{}", dt.with_timezone(&self.offset).format(&self.pattern)) {
            Ok(()) => out,
            Err(_) => millis.to_string(),
        }
    }
}

/// One row per lead of `base_id`, joined with the owning agent's name.
pub fn build_export(
    collection: &Collection,
    base_id: &str,
    timestamps: &TimestampFormat,
) -> Result<Vec<ExportRow>, LeadError> {
    let rows: Vec<ExportRow> = collection
        .leads_for_base(base_id)
        .map(|lead| ExportRow {
            name: lead.name.clone(),
            phone: lead.phone.clone(),
            status: lead.status.as_str().to_string(),
            agent: collection
                .find_profile(&lead.seller_id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| MISSING_AGENT.to_string()),
            imported_at: timestamps.render(lead.created_at),
            sent_at: lead
                .sent_at
                .map(|at| timestamps.render(at))
                .unwrap_or_else(|| NOT_SENT.to_string()),
        })
        .collect();

    if rows.is_empty() {
        return Err(LeadError::EmptyExport {
            base: base_id.to_string(),
        });
    }
    Ok(rows)
}

/// Header row followed by the data rows, as plain strings.
pub fn to_table(rows: &[ExportRow]) -> Vec<Vec<String>> {
    let mut table = Vec::with_capacity(rows.len() + 1);
    table.push(EXPORT_HEADERS.iter().map(|h| h.to_string()).collect());
    for row in rows {
        table.push(row.cells().iter().map(|c| c.to_string()).collect());
    }
    table
}
