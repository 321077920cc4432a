/// Normalize the text of one table cell.
///
/// Steps:
/// 1. Whitespace characters (including line breaks and tabs) become spaces
/// 2. Other control characters are dropped
/// 3. Runs of whitespace collapse to a single space, ends are trimmed
///
/// The function is idempotent and never touches non-whitespace content.
pub fn normalize_cell(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some(' ')
            } else if c.is_control() {
                None
            } else {
                Some(c)
            }
        })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize every cell of a row.
pub fn normalize_cells(cells: &[String]) -> Vec<String> {
    cells.iter().map(|c| normalize_cell(c)).collect()
}

/// Append a wrapped line to a description, separated by a single space.
pub fn append_text(description: &mut String, continuation: &str) {
    let continuation = continuation.trim();
    if continuation.is_empty() {
        return;
    }
    if !description.is_empty() {
        description.push(' ');
    }
    description.push_str(continuation);
}

/// Join the non-empty cells of a row with single spaces.
pub fn join_non_empty<'a>(cells: impl IntoIterator<Item = &'a String>) -> String {
    cells
        .into_iter()
        .map(|c| c.as_str())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
