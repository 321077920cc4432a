use super::normalize::{join_non_empty, normalize_cells};
use super::{Classification, ClassifyContext, RejectReason};
use crate::model::{ErrorCodeRecord, RawRow, Record};
use regex::Regex;
use std::sync::LazyLock;

/// Alphanumeric start, then alphanumerics or the punctuation codes tend to
/// use ("E-101", "0x1A", "F07.3", "A/12").
static CODE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9.\-/_:#]*$").unwrap());

/// Check if a cell looks like an error code.
///
/// Requires at least one digit so header words ("Code", "Fault") are not
/// mistaken for codes.
pub fn is_error_code(cell: &str, max_len: usize) -> bool {
    cell.chars().count() <= max_len
        && CODE_TOKEN.is_match(cell)
        && cell.chars().any(|c| c.is_ascii_digit())
}

/// Classify a row of a generic error-code table.
pub fn classify_generic(row: &RawRow, ctx: &ClassifyContext) -> Classification {
    let cells = normalize_cells(&row.cells);

    let non_empty = cells.iter().filter(|c| !c.is_empty()).count();
    if non_empty == 0 {
        return Classification::Rejected(RejectReason::Empty);
    }
    if non_empty < 2 {
        return Classification::Rejected(RejectReason::TooFewCells);
    }

    let code = &cells[0];
    if !is_error_code(code, ctx.max_code_len) {
        return Classification::Rejected(RejectReason::NotACode);
    }

    Classification::Record(Record::Generic(ErrorCodeRecord {
        source_table: ctx.source_table.to_string(),
        code: code.clone(),
        description: join_non_empty(&cells[1..]),
        raw_columns: cells.clone(),
    }))
}
