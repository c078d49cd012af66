//! Table types.

use super::word::{join_words, Word};
use crate::datapoint::BoundingBox;
use serde::Serialize;

/// Largest number of rows or columns a table renders.
const MAX_GRID_SIDE: u32 = 1024;

/// A segmented table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    /// Id of the underlying annotation
    pub annotation_id: String,

    /// Location on the page
    pub bounding_box: BoundingBox,

    /// Detection confidence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,

    /// 1-based position among the page's blocks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading_order: Option<u32>,

    /// Number of rows
    pub number_of_rows: u32,

    /// Number of columns
    pub number_of_columns: u32,

    /// Cells sorted by row, then column
    pub cells: Vec<Cell>,
}

impl Table {
    /// Check if the table has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell covering the given 1-based position, taking spans into account.
    pub fn cell(&self, row: u32, column: u32) -> Option<&Cell> {
        self.cells.iter().find(|c| c.covers(row, column))
    }

    /// Cells starting in the given row, left to right.
    pub fn row(&self, row: u32) -> Vec<&Cell> {
        self.cells.iter().filter(|c| c.row_number == row).collect()
    }

    /// Cells starting in the given column, top to bottom.
    pub fn column(&self, column: u32) -> Vec<&Cell> {
        self.cells
            .iter()
            .filter(|c| c.column_number == column)
            .collect()
    }

    /// Check if the table has merged cells.
    pub fn has_merged_cells(&self) -> bool {
        self.cells.iter().any(|c| c.is_merged())
    }

    /// Rows and columns that can be rendered.
    ///
    /// Trailing rows and columns no cell reaches are cut, and each side is
    /// capped at 1024, so values read from a file cannot blow up the grid.
    pub fn grid_size(&self) -> (u32, u32) {
        let reach = |position: fn(&Cell) -> (u32, u32)| {
            self.cells
                .iter()
                .map(|c| {
                    let (start, span) = position(c);
                    start.saturating_add(span.max(1) - 1)
                })
                .max()
                .unwrap_or(0)
        };
        (
            self.number_of_rows
                .min(reach(|c| (c.row_number, c.row_span)))
                .min(MAX_GRID_SIDE),
            self.number_of_columns
                .min(reach(|c| (c.column_number, c.column_span)))
                .min(MAX_GRID_SIDE),
        )
    }

    /// Text of the table as a `rows x columns` grid.
    ///
    /// A merged cell contributes its text to its top-left position only.
    pub fn grid(&self) -> Vec<Vec<String>> {
        let (rows, cols) = self.grid_size();
        let (rows, cols) = (rows as usize, cols as usize);
        let mut grid = vec![vec![String::new(); cols]; rows];
        for cell in &self.cells {
            if cell.row_number == 0 || cell.column_number == 0 {
                continue;
            }
            let r = cell.row_number as usize - 1;
            let c = cell.column_number as usize - 1;
            if r < rows && c < cols {
                grid[r][c] = cell.text();
            }
        }
        grid
    }

    /// Plain text: one line per row, cells separated by tabs.
    pub fn plain_text(&self) -> String {
        self.grid()
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// HTML rendering with `rowspan`/`colspan` attributes.
    pub fn html(&self) -> String {
        let (rows, _) = self.grid_size();
        let mut output = String::from("<table>");
        for row in 1..=rows {
            output.push_str("<tr>");
            for cell in self.row(row) {
                let mut attrs = String::new();
                if cell.row_span > 1 {
                    attrs.push_str(&format!(" rowspan=\"{}\"", cell.row_span));
                }
                if cell.column_span > 1 {
                    attrs.push_str(&format!(" colspan=\"{}\"", cell.column_span));
                }
                output.push_str(&format!("<td{}>{}</td>", attrs, escape_html(&cell.text())));
            }
            output.push_str("</tr>");
        }
        output.push_str("</table>");
        output
    }
}

/// A table cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    /// Id of the underlying annotation
    pub annotation_id: String,

    /// Location on the page
    pub bounding_box: BoundingBox,

    /// Detection confidence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,

    /// 1-based first row (0 when unsegmented)
    pub row_number: u32,

    /// 1-based first column (0 when unsegmented)
    pub column_number: u32,

    /// Number of rows the cell spans
    pub row_span: u32,

    /// Number of columns the cell spans
    pub column_span: u32,

    /// Words in reading order
    pub words: Vec<Word>,
}

impl Cell {
    /// Text of the cell.
    pub fn text(&self) -> String {
        join_words(&self.words)
    }

    /// Check if this cell spans multiple rows or columns.
    pub fn is_merged(&self) -> bool {
        self.row_span > 1 || self.column_span > 1
    }

    /// Check whether the cell covers a 1-based grid position.
    pub fn covers(&self, row: u32, column: u32) -> bool {
        row >= self.row_number
            && row < self.row_number.saturating_add(self.row_span.max(1))
            && column >= self.column_number
            && column < self.column_number.saturating_add(self.column_span.max(1))
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str) -> Word {
        Word {
            annotation_id: text.to_string(),
            text: text.to_string(),
            bounding_box: BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap(),
            score: None,
            reading_order: None,
            token_class: None,
            tag: None,
        }
    }

    fn cell(row: u32, col: u32, row_span: u32, col_span: u32, text: &str) -> Cell {
        Cell {
            annotation_id: format!("{row}-{col}"),
            bounding_box: BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap(),
            score: None,
            row_number: row,
            column_number: col,
            row_span,
            column_span: col_span,
            words: vec![word(text)],
        }
    }

    fn sample_table() -> Table {
        Table {
            annotation_id: "t".to_string(),
            bounding_box: BoundingBox::new(0.0, 0.0, 100.0, 100.0).unwrap(),
            score: None,
            reading_order: None,
            number_of_rows: 2,
            number_of_columns: 2,
            cells: vec![
                cell(1, 1, 1, 2, "Header"),
                cell(2, 1, 1, 1, "a"),
                cell(2, 2, 1, 1, "b<c"),
            ],
        }
    }

    #[test]
    fn test_cell_lookup_with_spans() {
        let table = sample_table();
        assert_eq!(table.cell(1, 2).unwrap().text(), "Header");
        assert_eq!(table.cell(2, 2).unwrap().text(), "b<c");
        assert!(table.cell(3, 1).is_none());
        assert!(table.has_merged_cells());
        assert_eq!(table.row(2).len(), 2);
        assert_eq!(table.column(1).len(), 2);
    }

    #[test]
    fn test_plain_text_grid() {
        assert_eq!(sample_table().plain_text(), "Header\t\na\tb<c");
    }

    #[test]
    fn test_oversized_values_are_bounded() {
        let mut table = sample_table();
        table.number_of_rows = u32::MAX;
        table.number_of_columns = u32::MAX;
        table.cells.push(cell(u32::MAX - 1, 1, u32::MAX, 1, "far"));
        assert!(table.cell(u32::MAX - 1, 1).is_some());
        assert!(table.cell(1, u32::MAX).is_none());
        assert_eq!(table.grid_size(), (1024, 2));
        assert_eq!(table.grid().len(), 1024);

        table.cells.pop();
        assert_eq!(table.grid_size(), (2, 2));
        assert_eq!(table.grid().len(), 2);
        assert_eq!(table.plain_text(), "Header\t\na\tb<c");
    }

    #[test]
    fn test_html() {
        assert_eq!(
            sample_table().html(),
            "<table><tr><td colspan=\"2\">Header</td></tr><tr><td>a</td><td>b&lt;c</td></tr></table>"
        );
    }
}
