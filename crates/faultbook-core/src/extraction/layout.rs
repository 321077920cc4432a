//! Reconstruct table rows from positioned words.
//!
//! Words are grouped into lines by vertical proximity, each line is split
//! into cells at wide horizontal gaps, and the left edges of all cells on the
//! page are clustered into column anchors. Every row is then laid out against
//! the same anchors, so a wrapped description line that starts in the third
//! column becomes `["", "", "text"]`.

use crate::config::ExtractorSettings;
use crate::model::{PageRegion, RawRow, TextFragment};

#[derive(Debug)]
struct Line<'a> {
    y_center: f32,
    fragments: Vec<&'a TextFragment>,
}

#[derive(Debug, Clone, PartialEq)]
struct Cell {
    x_min: f32,
    text: String,
}

/// Group the words of a page into rows, in reading order.
pub fn group_rows(region: &PageRegion, settings: &ExtractorSettings) -> Vec<RawRow> {
    let lines = group_lines(&region.fragments, settings.row_tolerance);
    let cell_lines: Vec<Vec<Cell>> = lines
        .iter()
        .map(|line| split_cells(line, settings.column_gap))
        .filter(|cells| !cells.is_empty())
        .collect();

    let anchors = column_anchors(&cell_lines, settings.column_snap);

    cell_lines
        .into_iter()
        .map(|cells| RawRow {
            page_number: region.page_number,
            cells: place_in_columns(cells, &anchors),
        })
        .collect()
}

fn group_lines(fragments: &[TextFragment], tolerance: f32) -> Vec<Line<'_>> {
    let mut sorted: Vec<&TextFragment> = fragments
        .iter()
        .filter(|f| !f.text.trim().is_empty())
        .collect();
    sorted.sort_by(|a, b| {
        a.bbox
            .y_center()
            .total_cmp(&b.bbox.y_center())
            .then(a.bbox.x_min.total_cmp(&b.bbox.x_min))
    });

    let mut lines: Vec<Line> = Vec::new();
    for fragment in sorted {
        let y = fragment.bbox.y_center();
        match lines.last_mut() {
            Some(line) if (y - line.y_center).abs() <= tolerance => {
                // Running mean keeps slightly skewed baselines together.
                let n = line.fragments.len() as f32;
                line.y_center = (line.y_center * n + y) / (n + 1.0);
                line.fragments.push(fragment);
            }
            _ => lines.push(Line {
                y_center: y,
                fragments: vec![fragment],
            }),
        }
    }

    for line in &mut lines {
        line.fragments
            .sort_by(|a, b| a.bbox.x_min.total_cmp(&b.bbox.x_min));
    }
    lines
}

fn split_cells(line: &Line, column_gap: f32) -> Vec<Cell> {
    let mut cells: Vec<Cell> = Vec::new();
    let mut prev_x_max: Option<f32> = None;

    for fragment in &line.fragments {
        let text = fragment.text.trim();
        let starts_cell = match prev_x_max {
            Some(x_max) => fragment.bbox.x_min - x_max > column_gap,
            None => true,
        };
        match cells.last_mut() {
            Some(cell) if !starts_cell => {
                cell.text.push(' ');
                cell.text.push_str(text);
            }
            _ => cells.push(Cell {
                x_min: fragment.bbox.x_min,
                text: text.to_string(),
            }),
        }
        prev_x_max = Some(match prev_x_max {
            Some(x) => x.max(fragment.bbox.x_max),
            None => fragment.bbox.x_max,
        });
    }

    cells
}

/// Left edges of the page's columns, ascending.
fn column_anchors(lines: &[Vec<Cell>], snap: f32) -> Vec<f32> {
    let mut starts: Vec<f32> = lines.iter().flatten().map(|c| c.x_min).collect();
    starts.sort_by(f32::total_cmp);

    let mut anchors: Vec<f32> = Vec::new();
    for x in starts {
        match anchors.last() {
            Some(&anchor) if x - anchor <= snap => {}
            _ => anchors.push(x),
        }
    }
    anchors
}

fn place_in_columns(cells: Vec<Cell>, anchors: &[f32]) -> Vec<String> {
    let mut columns = vec![String::new(); anchors.len()];
    for cell in cells {
        let idx = anchors
            .partition_point(|&a| a <= cell.x_min)
            .saturating_sub(1);
        let slot = &mut columns[idx];
        if !slot.is_empty() {
            slot.push(' ');
        }
        slot.push_str(&cell.text);
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BBox;

    fn word(text: &str, x: f32, y: f32) -> TextFragment {
        // ~5pt per character at a 10pt font
        let width = text.chars().count() as f32 * 5.0;
        TextFragment {
            text: text.into(),
            bbox: BBox {
                x_min: x,
                y_min: y,
                x_max: x + width,
                y_max: y + 10.0,
            },
        }
    }

    fn region(fragments: Vec<TextFragment>) -> PageRegion {
        PageRegion {
            page_number: 4,
            fragments,
        }
    }

    #[test]
    fn test_continuation_row_gets_empty_leading_cells() {
        let page = region(vec![
            word("101", 50.0, 100.0),
            word("02", 100.0, 100.0),
            word("Motor", 150.0, 100.0),
            word("overload", 150.0, 114.0),
        ]);
        let rows = group_rows(&page, &ExtractorSettings::default());
        assert_eq!(
            rows,
            vec![
                RawRow::new(4, ["101", "02", "Motor"]),
                RawRow::new(4, ["", "", "overload"]),
            ]
        );
    }

    #[test]
    fn test_words_in_one_cell_are_joined() {
        // "Motor" ends at 175, "overload" starts 2pt later
        let page = region(vec![
            word("7", 50.0, 100.0),
            word("Motor", 150.0, 100.0),
            word("overload", 177.0, 100.0),
        ]);
        let rows = group_rows(&page, &ExtractorSettings::default());
        assert_eq!(rows, vec![RawRow::new(4, ["7", "Motor overload"])]);
    }

    #[test]
    fn test_rows_ordered_top_to_bottom() {
        let page = region(vec![
            word("B2", 50.0, 200.0),
            word("second", 120.0, 200.0),
            word("A1", 50.0, 100.0),
            word("first", 120.0, 100.0),
        ]);
        let rows = group_rows(&page, &ExtractorSettings::default());
        assert_eq!(rows[0].cells, vec!["A1", "first"]);
        assert_eq!(rows[1].cells, vec!["B2", "second"]);
    }

    #[test]
    fn test_slightly_skewed_baseline_stays_on_one_row() {
        let page = region(vec![word("E1", 50.0, 100.0), word("Fault", 120.0, 101.5)]);
        let rows = group_rows(&page, &ExtractorSettings::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells, vec!["E1", "Fault"]);
    }

    #[test]
    fn test_nearby_left_edges_snap_to_one_column() {
        let page = region(vec![
            word("E1", 50.0, 100.0),
            word("first", 120.0, 100.0),
            word("E22", 53.0, 120.0),
            word("second", 126.0, 120.0),
        ]);
        let rows = group_rows(&page, &ExtractorSettings::default());
        assert_eq!(rows[1].cells, vec!["E22", "second"]);
    }

    #[test]
    fn test_blank_fragments_ignored() {
        let page = region(vec![word("  ", 50.0, 100.0)]);
        assert!(group_rows(&page, &ExtractorSettings::default()).is_empty());
    }

    #[test]
    fn test_empty_page() {
        assert!(group_rows(&region(vec![]), &ExtractorSettings::default()).is_empty());
    }
}
