use std::path::PathBuf;

use crate::model::ParsingMode;

#[derive(Debug, thiserror::Error)]
pub enum FaultbookError {
    #[error("PDF document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    #[error("poppler-utils not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PopplerNotFound,

    #[error("{tool} failed with exit code {code}: {stderr}")]
    PopplerFailed {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("page {page} has no text layer (image-only or rotated pages are not supported)")]
    UnsupportedPage { page: usize },

    #[error("no rows on page {page} matched the table layout")]
    NoMatchingRows { page: usize },

    #[error("invalid page range {start}..={end} (document has {page_count} pages)")]
    InvalidRange {
        start: usize,
        end: usize,
        page_count: usize,
    },

    #[error("invalid table name '{name}': {reason}")]
    InvalidTableName { name: String, reason: String },

    #[error("table '{table}' exists but does not have the {mode} schema")]
    SchemaMismatch { table: String, mode: ParsingMode },

    #[error("failed to load config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl FaultbookError {
    /// Whether the error only affects the page being processed.
    ///
    /// Page-local errors are recorded in the run summary and the run moves
    /// on to the next page; everything else aborts the run.
    pub fn is_page_local(&self) -> bool {
        matches!(
            self,
            FaultbookError::UnsupportedPage { .. }
                | FaultbookError::NoMatchingRows { .. }
                | FaultbookError::Extraction(_)
                | FaultbookError::PopplerFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_local_errors() {
        assert!(FaultbookError::UnsupportedPage { page: 2 }.is_page_local());
        assert!(FaultbookError::NoMatchingRows { page: 2 }.is_page_local());
        assert!(!FaultbookError::PopplerNotFound.is_page_local());
        assert!(!FaultbookError::InvalidRange {
            start: 3,
            end: 1,
            page_count: 5
        }
        .is_page_local());
    }

    #[test]
    fn test_unsupported_page_message() {
        let e = FaultbookError::UnsupportedPage { page: 7 };
        assert!(e.to_string().starts_with("page 7 has no text layer"));
    }
}
