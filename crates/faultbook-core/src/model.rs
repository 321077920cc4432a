use serde::{Deserialize, Serialize};
use std::fmt;

/// Bounding box in PDF points, origin at the top-left of the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BBox {
    pub fn y_center(&self) -> f32 {
        (self.y_min + self.y_max) / 2.0
    }
}

/// A single positioned word on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub bbox: BBox,
}

/// The text layer of one PDF page (1-based page number).
#[derive(Debug, Clone)]
pub struct PageRegion {
    pub page_number: usize,
    pub fragments: Vec<TextFragment>,
}

/// Text cells believed to belong to one table row, one entry per inferred
/// column. Missing columns are empty strings.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub page_number: usize,
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new<I, S>(page_number: usize, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RawRow {
            page_number,
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }
}

/// Which table layout the classifier expects. Chosen once per run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsingMode {
    #[default]
    Generic,
    Sew,
}

impl fmt::Display for ParsingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsingMode::Generic => write!(f, "generic"),
            ParsingMode::Sew => write!(f, "SEW"),
        }
    }
}

/// A row from a generic error-code table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorCodeRecord {
    /// Table the record is destined for.
    pub source_table: String,
    pub code: String,
    /// Non-empty cells after the code, joined by a single space.
    pub description: String,
    /// Every cell of the row as extracted (normalized), including empty ones.
    pub raw_columns: Vec<String>,
}

/// A row from an SEW fault table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SewErrorCodeRecord {
    pub fault_code: String,
    /// Empty when the fault has no sub-errors.
    pub suberror_code: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    Generic(ErrorCodeRecord),
    Sew(SewErrorCodeRecord),
}

impl Record {
    pub fn mode(&self) -> ParsingMode {
        match self {
            Record::Generic(_) => ParsingMode::Generic,
            Record::Sew(_) => ParsingMode::Sew,
        }
    }
}

/// A page-local failure recorded in the run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageError {
    pub page_number: usize,
    pub reason: String,
}

/// Summary of one extraction run. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRun {
    pub table_name: String,
    pub mode: ParsingMode,
    pub pages_processed: usize,
    pub records_inserted: usize,
    pub rows_rejected: usize,
    /// Continuation rows folded into the description of a preceding record.
    pub rows_merged: usize,
    pub errors: Vec<PageError>,
}

impl ExtractionRun {
    pub fn new(table_name: &str, mode: ParsingMode) -> Self {
        ExtractionRun {
            table_name: table_name.to_string(),
            mode,
            pages_processed: 0,
            records_inserted: 0,
            rows_rejected: 0,
            rows_merged: 0,
            errors: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
