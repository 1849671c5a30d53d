//! Roster file import
//!
//! Reads comma/semicolon separated text and XLSX workbooks into roster
//! candidates. Columns are positional: name, tax ID, email, phone.

pub mod delimited;
pub mod spreadsheet;

use crate::{
    error::{AppError, AppResult},
    models::{
        enrollee::{normalize_tax_id, NewEnrolledPerson},
        import_report::{ImportRow, ParsedImport, SkippedRow},
    },
};

/// Zero-based position of the tax-ID column
pub const TAX_ID_COLUMN: usize = 1;

/// Uploaded file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Csv,
    Xlsx,
}

impl ImportFormat {
    /// Detect the format from a file name, falling back to the content type
    pub fn detect(file_name: Option<&str>, content_type: Option<&str>) -> Option<Self> {
        let ext = file_name
            .and_then(|n| n.rsplit_once('.'))
            .map(|(_, ext)| ext.to_lowercase());
        match ext.as_deref() {
            Some("csv") | Some("txt") => return Some(ImportFormat::Csv),
            Some("xlsx") => return Some(ImportFormat::Xlsx),
            _ => {}
        }
        match content_type {
            Some(ct) if ct.starts_with("text/") => Some(ImportFormat::Csv),
            Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet") => {
                Some(ImportFormat::Xlsx)
            }
            _ => None,
        }
    }
}

/// Parse an uploaded file into candidate rows
pub fn parse(format: ImportFormat, bytes: &[u8]) -> AppResult<ParsedImport> {
    let cells = match format {
        ImportFormat::Csv => delimited::read_rows(bytes)?,
        ImportFormat::Xlsx => spreadsheet::read_rows(bytes)?,
    };
    if cells.is_empty() {
        return Err(AppError::BadRequest("The uploaded file has no rows".to_string()));
    }
    Ok(map_rows(cells))
}

/// Map raw cells to roster records, skipping a header row if present
pub fn map_rows(rows: Vec<Vec<String>>) -> ParsedImport {
    let mut parsed = ParsedImport::default();

    for (idx, cells) in rows.into_iter().enumerate() {
        let line = idx + 1;
        let cell = |i: usize| cells.get(i).map(|s| s.trim()).unwrap_or_default();

        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        // Header: the tax ID column holds a label rather than a number
        if idx == 0 && normalize_tax_id(cell(TAX_ID_COLUMN)).is_empty() {
            parsed.skipped.push(SkippedRow {
                line,
                reason: "header row".to_string(),
            });
            continue;
        }

        let optional = |i: usize| Some(cell(i).to_string()).filter(|s| !s.is_empty());
        let record = NewEnrolledPerson {
            name: cell(0).to_string(),
            tax_id: cell(TAX_ID_COLUMN).to_string(),
            email: optional(2),
            phone: optional(3),
            enrollment_number: None,
        }
        .normalized();

        if record.name.is_empty() {
            parsed.skipped.push(SkippedRow {
                line,
                reason: "missing name".to_string(),
            });
        } else if record.tax_id.is_empty() {
            parsed.skipped.push(SkippedRow {
                line,
                reason: "missing tax ID".to_string(),
            });
        } else {
            parsed.rows.push(ImportRow { line, record });
        }
    }

    tracing::debug!(
        "Import parsed: {} rows, {} skipped",
        parsed.rows.len(),
        parsed.skipped.len()
    );
    parsed
}
