pub mod generic;
pub mod normalize;
pub mod sew;

use crate::model::{ParsingMode, RawRow, Record};
use generic::classify_generic;
use normalize::append_text;
use serde::Serialize;
use sew::classify_sew;

/// Why a row was not turned into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    Empty,
    TooFewCells,
    NotACode,
    /// A lone page number or "Page N" marker in the description column.
    PageFooter,
    /// A continuation row with no record before it in the run.
    OrphanContinuation,
}

/// Outcome of classifying a single row.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Record(Record),
    /// Wrapped text that belongs to the previous record's description.
    Continuation(String),
    Rejected(RejectReason),
}

/// Inputs the classifier needs besides the row itself.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyContext<'a> {
    pub source_table: &'a str,
    pub max_code_len: usize,
}

/// Classify one row according to the run's parsing mode.
pub fn classify(row: &RawRow, mode: ParsingMode, ctx: &ClassifyContext) -> Classification {
    match mode {
        ParsingMode::Generic => classify_generic(row, ctx),
        ParsingMode::Sew => classify_sew(row),
    }
}

/// Records accepted from a sequence of rows, plus counts of what was not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedRows {
    pub records: Vec<Record>,
    pub rejected: usize,
    pub merged: usize,
    /// Continuation text seen before the first record, waiting for a record
    /// from an earlier page.
    pub leading: Vec<String>,
}

impl ClassifiedRows {
    /// Fold one classified row into the accumulator.
    ///
    /// A continuation merges into the last accepted record; before the first
    /// record it is held in `leading`.
    pub fn absorb(mut self, classification: Classification) -> Self {
        match classification {
            Classification::Record(record) => self.records.push(record),
            Classification::Continuation(text) => match self.records.last_mut() {
                Some(Record::Sew(last)) => {
                    append_text(&mut last.description, &text);
                    self.merged += 1;
                }
                Some(Record::Generic(last)) => {
                    append_text(&mut last.description, &text);
                    self.merged += 1;
                }
                None => self.leading.push(text),
            },
            Classification::Rejected(_) => self.rejected += 1,
        }
        self
    }

    /// Settle the continuation rows held in `leading`.
    ///
    /// With an earlier record to extend, returns their text joined and counts
    /// them as merged. Otherwise they are rejected as orphans.
    pub fn take_leading(&mut self, has_previous: bool) -> Option<String> {
        if self.leading.is_empty() {
            return None;
        }
        let rows = std::mem::take(&mut self.leading);
        if !has_previous {
            tracing::debug!(
                rows = rows.len(),
                reason = ?RejectReason::OrphanContinuation,
                "rejected row"
            );
            self.rejected += rows.len();
            return None;
        }

        self.merged += rows.len();
        let mut text = String::new();
        for row in &rows {
            append_text(&mut text, row);
        }
        Some(text)
    }

    /// True when rows were seen but none produced or extended a record.
    pub fn nothing_accepted(&self) -> bool {
        self.records.is_empty()
            && self.merged == 0
            && self.leading.is_empty()
            && self.rejected > 0
    }
}

/// Classify rows in document order, merging continuation rows.
pub fn classify_rows(rows: &[RawRow], mode: ParsingMode, ctx: &ClassifyContext) -> ClassifiedRows {
    rows.iter()
        .fold(ClassifiedRows::default(), |acc, row| {
            let classification = classify(row, mode, ctx);
            if let Classification::Rejected(reason) = &classification {
                tracing::debug!(page = row.page_number, cells = ?row.cells, ?reason, "rejected row");
            }
            acc.absorb(classification)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SewErrorCodeRecord;

    const CTX: ClassifyContext<'static> = ClassifyContext {
        source_table: "sew_error_codes",
        max_code_len: 16,
    };

    fn sew_records(result: &ClassifiedRows) -> Vec<SewErrorCodeRecord> {
        result
            .records
            .iter()
            .map(|r| match r {
                Record::Sew(s) => s.clone(),
                other => panic!("expected SEW record, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_continuation_merges_with_single_space() {
        let rows = vec![
            RawRow::new(1, ["101", "02", "Motor"]),
            RawRow::new(1, ["", "", "overload"]),
        ];
        let result = classify_rows(&rows, ParsingMode::Sew, &CTX);
        let records = sew_records(&result);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, "Motor overload");
        assert_eq!(result.merged, 1);
        assert_eq!(result.rejected, 0);
    }

    #[test]
    fn test_continuation_skips_rejected_rows() {
        // Noise between a record and its continuation does not break the merge
        let rows = vec![
            RawRow::new(1, ["07", "", "DC link"]),
            RawRow::new(1, ["Fault", "Sub", "Description"]),
            RawRow::new(1, ["", "", "overvoltage"]),
            RawRow::new(1, ["08", "01", "Speed"]),
            RawRow::new(1, ["", "", "monitoring"]),
            RawRow::new(1, ["", "", "motor mode"]),
        ];
        let result = classify_rows(&rows, ParsingMode::Sew, &CTX);
        let records = sew_records(&result);
        assert_eq!(records[0].description, "DC link overvoltage");
        assert_eq!(records[1].description, "Speed monitoring motor mode");
        assert_eq!(result.rejected, 1);
        assert_eq!(result.merged, 3);
    }

    #[test]
    fn test_leading_continuation_is_held() {
        let rows = vec![
            RawRow::new(2, ["", "", "left over from"]),
            RawRow::new(2, ["", "", "previous page"]),
            RawRow::new(2, ["09", "", "Commissioning"]),
        ];
        let mut result = classify_rows(&rows, ParsingMode::Sew, &CTX);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.leading.len(), 2);
        assert_eq!(result.rejected, 0);

        let tail = result.take_leading(true);
        assert_eq!(tail.as_deref(), Some("left over from previous page"));
        assert_eq!(result.merged, 2);
        assert!(result.leading.is_empty());
    }

    #[test]
    fn test_orphan_continuation_rejected() {
        let rows = vec![
            RawRow::new(1, ["", "", "no record before this"]),
            RawRow::new(1, ["09", "", "Commissioning"]),
        ];
        let mut result = classify_rows(&rows, ParsingMode::Sew, &CTX);
        assert_eq!(result.take_leading(false), None);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.rejected, 1);
        assert_eq!(result.merged, 0);
        assert_eq!(result.take_leading(true), None);
    }

    #[test]
    fn test_footer_does_not_extend_description() {
        let rows = vec![
            RawRow::new(3, ["07", "", "DC link overvoltage"]),
            RawRow::new(3, ["", "", "12"]),
            RawRow::new(3, ["", "", "Page 12"]),
        ];
        let result = classify_rows(&rows, ParsingMode::Sew, &CTX);
        let records = sew_records(&result);
        assert_eq!(records[0].description, "DC link overvoltage");
        assert_eq!(result.rejected, 2);
        assert_eq!(result.merged, 0);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let rows = vec![
            RawRow::new(1, ["101", "02", "Motor"]),
            RawRow::new(1, ["", "", "overload"]),
            RawRow::new(1, ["Page 3", ""]),
        ];
        let first = classify_rows(&rows, ParsingMode::Sew, &CTX);
        let second = classify_rows(&rows, ParsingMode::Sew, &CTX);
        assert_eq!(first, second);
    }

    #[test]
    fn test_generic_mode_never_merges() {
        let rows = vec![
            RawRow::new(1, ["E-1", "Overcurrent"]),
            RawRow::new(1, ["", "", "wrapped"]),
        ];
        let result = classify_rows(&rows, ParsingMode::Generic, &CTX);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.merged, 0);
        assert_eq!(result.rejected, 1);
    }

    #[test]
    fn test_nothing_accepted() {
        let rows = vec![RawRow::new(1, ["Fault", "Description"])];
        assert!(classify_rows(&rows, ParsingMode::Sew, &CTX).nothing_accepted());
        assert!(!classify_rows(&[], ParsingMode::Sew, &CTX).nothing_accepted());
    }
}
