use crate::classify::{classify_rows, ClassifyContext};
use crate::config::ExtractConfig;
use crate::error::FaultbookError;
use crate::extraction::poppler::PopplerDocument;
use crate::extraction::{extract, PdfDocument};
use crate::model::{ExtractionRun, PageError, ParsingMode};
use crate::store::{validate_table_name, DescriptionTail, RecordStore};
use std::path::Path;

/// What to extract and where to put it.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// First page, 1-based, inclusive.
    pub start_page: usize,
    /// Last page, inclusive.
    pub end_page: usize,
    pub table_name: String,
    pub mode: ParsingMode,
}

#[derive(Debug, Default)]
struct PageOutcome {
    inserted: usize,
    rejected: usize,
    merged: usize,
    nothing_accepted: bool,
}

/// Extract a page range of a PDF on disk into the configured store.
///
/// Opens the document with poppler and the store at `config.database`;
/// the store connection lives exactly as long as the run.
pub fn run(
    document_path: &Path,
    request: &RunRequest,
    config: &ExtractConfig,
) -> Result<ExtractionRun, FaultbookError> {
    // Reject a bad table name before touching the document or the store
    validate_table_name(&request.table_name)?;

    let document = PopplerDocument::open(document_path)?;
    let store = RecordStore::open(&config.database)?;
    run_with(&document, store, request, config)
}

/// Extract a page range from an opened document into `store`.
///
/// Takes ownership of the store so the connection is released on every
/// exit path. Page-local failures are recorded in the summary; anything
/// else aborts the run, leaving pages committed so far in place.
pub fn run_with(
    document: &dyn PdfDocument,
    mut store: RecordStore,
    request: &RunRequest,
    config: &ExtractConfig,
) -> Result<ExtractionRun, FaultbookError> {
    validate_table_name(&request.table_name)?;
    validate_range(request.start_page, request.end_page, document.page_count())?;
    store.prepare_table(&request.table_name, request.mode)?;

    tracing::info!(
        table = %request.table_name,
        mode = %request.mode,
        start = request.start_page,
        end = request.end_page,
        backend = document.backend_name(),
        "starting extraction"
    );

    let mut summary = ExtractionRun::new(&request.table_name, request.mode);
    // Last record stored by this run; a continuation opening a later page
    // extends its description.
    let mut last_row_id = None;

    for page_number in request.start_page..=request.end_page {
        summary.pages_processed += 1;

        match process_page(
            document,
            &mut store,
            page_number,
            request,
            config,
            &mut last_row_id,
        ) {
            Ok(outcome) => {
                summary.records_inserted += outcome.inserted;
                summary.rows_rejected += outcome.rejected;
                summary.rows_merged += outcome.merged;
                tracing::info!(
                    page = page_number,
                    inserted = outcome.inserted,
                    rejected = outcome.rejected,
                    merged = outcome.merged,
                    "page done"
                );
                if outcome.nothing_accepted {
                    record_page_error(
                        &mut summary,
                        page_number,
                        &FaultbookError::NoMatchingRows { page: page_number },
                    );
                }
            }
            Err(e) if e.is_page_local() => record_page_error(&mut summary, page_number, &e),
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        pages = summary.pages_processed,
        inserted = summary.records_inserted,
        rejected = summary.rows_rejected,
        errors = summary.errors.len(),
        "extraction finished"
    );
    Ok(summary)
}

fn validate_range(start: usize, end: usize, page_count: usize) -> Result<(), FaultbookError> {
    if start == 0 || start > end || end > page_count {
        return Err(FaultbookError::InvalidRange {
            start,
            end,
            page_count,
        });
    }
    Ok(())
}

/// Extract, classify and store one page. Records of the page, and any text
/// it adds to the record before it, are committed together.
fn process_page(
    document: &dyn PdfDocument,
    store: &mut RecordStore,
    page_number: usize,
    request: &RunRequest,
    config: &ExtractConfig,
    last_row_id: &mut Option<i64>,
) -> Result<PageOutcome, FaultbookError> {
    let rows = extract(document, page_number, &config.extractor)?;

    let ctx = ClassifyContext {
        source_table: &request.table_name,
        max_code_len: config.generic.max_code_len,
    };
    let mut classified = classify_rows(&rows, request.mode, &ctx);
    let tail = classified
        .take_leading(last_row_id.is_some())
        .zip(*last_row_id)
        .map(|(text, row_id)| DescriptionTail { row_id, text });

    let written = store.store_page(&classified.records, &request.table_name, tail.as_ref())?;
    if written.last_row_id.is_some() {
        *last_row_id = written.last_row_id;
    }

    Ok(PageOutcome {
        inserted: written.inserted,
        rejected: classified.rejected,
        merged: classified.merged,
        nothing_accepted: classified.nothing_accepted(),
    })
}

fn record_page_error(summary: &mut ExtractionRun, page_number: usize, error: &FaultbookError) {
    tracing::warn!(page = page_number, "{error}");
    summary.errors.push(PageError {
        page_number,
        reason: error.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_range() {
        assert!(validate_range(1, 3, 3).is_ok());
        assert!(validate_range(2, 2, 3).is_ok());
        assert!(validate_range(0, 2, 3).is_err());
        assert!(validate_range(3, 2, 3).is_err());
        assert!(validate_range(1, 4, 3).is_err());
        assert!(validate_range(1, 1, 0).is_err());
    }

    #[test]
    fn test_run_rejects_bad_table_before_opening_anything() {
        let request = RunRequest {
            start_page: 1,
            end_page: 1,
            table_name: "codes; DROP TABLE x".into(),
            mode: ParsingMode::Generic,
        };
        let config = ExtractConfig::default();
        let err = run(Path::new("/nonexistent/manual.pdf"), &request, &config).unwrap_err();
        assert!(matches!(err, FaultbookError::InvalidTableName { .. }));
    }

    #[test]
    fn test_run_missing_document() {
        let request = RunRequest {
            start_page: 1,
            end_page: 1,
            table_name: "codes".into(),
            mode: ParsingMode::Generic,
        };
        let err = run(
            Path::new("/nonexistent/manual.pdf"),
            &request,
            &ExtractConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FaultbookError::DocumentNotFound(_)));
    }
}
