use super::normalize::{join_non_empty, normalize_cells};
use super::{Classification, RejectReason};
use crate::model::{RawRow, Record, SewErrorCodeRecord};
use regex::Regex;
use std::sync::LazyLock;

/// SEW fault codes: "07", "101", "F07", "F-42", "14A".
static FAULT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[A-Za-z]{1,2}-?)?\d{1,4}[A-Za-z]?$").unwrap());

/// SEW sub-error codes are plain numbers: "0", "02", "1034".
static SUBERROR_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{1,5}$").unwrap());

/// Page footers: "12", "- 12 -", "Page 12", "Seite 12 von 40".
static PAGE_FOOTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:page|seite|p\.)\s*)?-?\s*\d{1,4}\s*-?(?:\s*(?:/|of|von)\s*\d{1,4})?$")
        .unwrap()
});

pub fn is_fault_code(cell: &str) -> bool {
    FAULT_CODE.is_match(cell)
}

pub fn is_suberror_code(cell: &str) -> bool {
    SUBERROR_CODE.is_match(cell)
}

pub fn is_page_footer(text: &str) -> bool {
    PAGE_FOOTER.is_match(text)
}

/// Classify a row of an SEW fault table.
///
/// Layout: fault code, optional sub-error code, free-text description.
/// A row whose leading cell is empty continues the description of the
/// previous record.
pub fn classify_sew(row: &RawRow) -> Classification {
    let cells = normalize_cells(&row.cells);

    let non_empty: Vec<&String> = cells.iter().filter(|c| !c.is_empty()).collect();
    if non_empty.is_empty() {
        return Classification::Rejected(RejectReason::Empty);
    }

    let lead = cells[0].as_str();
    if lead.is_empty() {
        let text = join_non_empty(non_empty);
        if is_page_footer(&text) {
            return Classification::Rejected(RejectReason::PageFooter);
        }
        return Classification::Continuation(text);
    }

    // A lone code is almost always a page number or a stray label
    if non_empty.len() < 2 {
        return Classification::Rejected(RejectReason::TooFewCells);
    }

    if !is_fault_code(lead) {
        return Classification::Rejected(RejectReason::NotACode);
    }

    let rest = &non_empty[1..];
    let (suberror_code, description_cells) = match rest.split_first() {
        Some((first, tail)) if is_suberror_code(first) => (first.to_string(), tail),
        _ => (String::new(), rest),
    };

    Classification::Record(Record::Sew(SewErrorCodeRecord {
        fault_code: lead.to_string(),
        suberror_code,
        description: join_non_empty(description_cells.iter().copied()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sew(row: &RawRow) -> SewErrorCodeRecord {
        match classify_sew(row) {
            Classification::Record(Record::Sew(r)) => r,
            other => panic!("expected SEW record, got {other:?}"),
        }
    }

    #[test]
    fn test_fault_and_suberror() {
        let r = sew(&RawRow::new(1, ["101", "02", "Motor"]));
        assert_eq!(r.fault_code, "101");
        assert_eq!(r.suberror_code, "02");
        assert_eq!(r.description, "Motor");
    }

    #[test]
    fn test_fault_without_suberror() {
        let r = sew(&RawRow::new(1, ["07", "", "DC link  overvoltage"]));
        assert_eq!(r.fault_code, "07");
        assert_eq!(r.suberror_code, "");
        assert_eq!(r.description, "DC link overvoltage");
    }

    #[test]
    fn test_description_starting_with_number_is_not_a_suberror() {
        let r = sew(&RawRow::new(1, ["F07", "24V supply missing"]));
        assert_eq!(r.suberror_code, "");
        assert_eq!(r.description, "24V supply missing");
    }

    #[test]
    fn test_continuation() {
        assert_eq!(
            classify_sew(&RawRow::new(1, ["", "", "overload"])),
            Classification::Continuation("overload".into())
        );
    }

    #[test]
    fn test_page_footer_rejected() {
        for footer in ["12", "- 12 -", "Page 12", "Seite 12 von 40", "12 / 40"] {
            assert_eq!(
                classify_sew(&RawRow::new(1, ["", "", footer])),
                Classification::Rejected(RejectReason::PageFooter),
                "{footer}"
            );
        }
        assert!(!is_page_footer("in regenerative mode"));
        assert!(!is_page_footer("24 V supply"));
    }

    #[test]
    fn test_header_rejected() {
        assert_eq!(
            classify_sew(&RawRow::new(1, ["Fault", "Sub", "Description"])),
            Classification::Rejected(RejectReason::NotACode)
        );
    }

    #[test]
    fn test_lone_page_number_rejected() {
        assert_eq!(
            classify_sew(&RawRow::new(1, ["12"])),
            Classification::Rejected(RejectReason::TooFewCells)
        );
    }

    #[test]
    fn test_fault_code_patterns() {
        for code in ["07", "101", "F07", "F-42", "14A"] {
            assert!(is_fault_code(code), "{code}");
        }
        for code in ["Fault", "12345", "07-02", "Seite 4"] {
            assert!(!is_fault_code(code), "{code}");
        }
    }
}
