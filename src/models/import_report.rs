//! Roster import preview and result models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::enrollee::NewEnrolledPerson;

/// Row read from an uploaded file, before deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    /// 1-based line (or spreadsheet row) number
    pub line: usize,
    pub record: NewEnrolledPerson,
}

/// Row dropped while parsing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SkippedRow {
    pub line: usize,
    pub reason: String,
}

/// Output of the file parser.
#[derive(Debug, Clone, Default)]
pub struct ParsedImport {
    pub rows: Vec<ImportRow>,
    pub skipped: Vec<SkippedRow>,
}

/// Candidate shown to the operator before confirming.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PreviewRow {
    pub line: usize,
    #[serde(flatten)]
    pub record: NewEnrolledPerson,
    /// Tax ID already on the roster
    pub duplicate: bool,
    /// Pre-selected for import (false for duplicates)
    pub selected: bool,
}

/// Report returned by the preview step.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportPreview {
    pub rows: Vec<PreviewRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRow>,
    /// Rows collapsed because the same tax ID appeared earlier in the file
    pub collapsed: usize,
}

/// Confirmed selection sent back by the client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportRequest {
    pub records: Vec<NewEnrolledPerson>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ImportResult {
    pub inserted: usize,
    /// Records ignored because their tax ID already existed
    pub skipped_existing: usize,
}
