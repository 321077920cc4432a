pub mod layout;
pub mod poppler;

use crate::config::ExtractorSettings;
use crate::error::FaultbookError;
use crate::model::{PageRegion, RawRow};

/// An opened PDF document that can hand out positioned text per page.
pub trait PdfDocument: Send + Sync {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Read the text layer of a 1-based page.
    ///
    /// Returns `Ok(None)` when the page has no text layer at all
    /// (image-only scans), and a region with no fragments when the page
    /// has a text layer that happens to be empty.
    fn read_page(&self, page_number: usize) -> Result<Option<PageRegion>, FaultbookError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Extract table-like rows from one page, top to bottom.
pub fn extract(
    document: &dyn PdfDocument,
    page_number: usize,
    settings: &ExtractorSettings,
) -> Result<Vec<RawRow>, FaultbookError> {
    let page_count = document.page_count();
    if page_number == 0 || page_number > page_count {
        return Err(FaultbookError::PageOutOfRange {
            page: page_number,
            page_count,
        });
    }

    let region = document
        .read_page(page_number)?
        .ok_or(FaultbookError::UnsupportedPage { page: page_number })?;

    let rows = layout::group_rows(&region, settings);
    tracing::debug!(
        page = page_number,
        fragments = region.fragments.len(),
        rows = rows.len(),
        backend = document.backend_name(),
        "extracted page"
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, TextFragment};

    struct OnePage {
        region: Option<PageRegion>,
    }

    impl PdfDocument for OnePage {
        fn page_count(&self) -> usize {
            1
        }

        fn read_page(&self, _page_number: usize) -> Result<Option<PageRegion>, FaultbookError> {
            Ok(self.region.clone())
        }

        fn backend_name(&self) -> &str {
            "test"
        }
    }

    #[test]
    fn test_page_zero_out_of_range() {
        let doc = OnePage { region: None };
        let err = extract(&doc, 0, &ExtractorSettings::default()).unwrap_err();
        assert!(matches!(err, FaultbookError::PageOutOfRange { page: 0, .. }));
    }

    #[test]
    fn test_page_past_end_out_of_range() {
        let doc = OnePage { region: None };
        let err = extract(&doc, 2, &ExtractorSettings::default()).unwrap_err();
        assert!(matches!(
            err,
            FaultbookError::PageOutOfRange {
                page: 2,
                page_count: 1
            }
        ));
    }

    #[test]
    fn test_no_text_layer_is_unsupported() {
        let doc = OnePage { region: None };
        let err = extract(&doc, 1, &ExtractorSettings::default()).unwrap_err();
        assert!(matches!(err, FaultbookError::UnsupportedPage { page: 1 }));
    }

    #[test]
    fn test_empty_text_layer_yields_no_rows() {
        let doc = OnePage {
            region: Some(PageRegion {
                page_number: 1,
                fragments: vec![],
            }),
        };
        let rows = extract(&doc, 1, &ExtractorSettings::default()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_rows_are_produced() {
        let word = |text: &str, x: f32| TextFragment {
            text: text.into(),
            bbox: BBox {
                x_min: x,
                y_min: 100.0,
                x_max: x + 20.0,
                y_max: 110.0,
            },
        };
        let doc = OnePage {
            region: Some(PageRegion {
                page_number: 1,
                fragments: vec![word("F07", 50.0), word("Overheat", 120.0)],
            }),
        };
        let rows = extract(&doc, 1, &ExtractorSettings::default()).unwrap();
        assert_eq!(rows, vec![RawRow::new(1, ["F07", "Overheat"])]);
    }
}
