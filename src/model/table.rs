//! Table types.

use super::{Alignment, Bounds, TextItem};
use serde::{Deserialize, Serialize};

/// A table reconstructed from column-aligned text items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableData {
    /// Rows in the table, top to bottom
    pub rows: Vec<TableRow>,

    /// Number of grid columns
    pub column_count: usize,

    /// Region covered by the table on its page
    pub bounds: Bounds,

    /// Items the table was built from
    #[serde(skip)]
    pub items: Vec<TextItem>,
}

impl TableData {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row, widening the grid if needed.
    pub fn add_row(&mut self, row: TableRow) {
        self.column_count = self.column_count.max(row.cells.len()).max(row.span_width());
        self.rows.push(row);
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check if the first row is a header row.
    pub fn has_header(&self) -> bool {
        self.rows.first().map(|r| r.is_header).unwrap_or(false)
    }

    /// Get plain text representation of the table.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Check if any cell spans multiple columns.
    pub fn has_merged_cells(&self) -> bool {
        self.rows
            .iter()
            .flat_map(|r| &r.cells)
            .any(|c| c.column_span > 1)
    }
}

/// A table row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableRow {
    /// Cells in the row, left to right
    pub cells: Vec<TableCell>,

    /// Whether this is a header row
    pub is_header: bool,
}

impl TableRow {
    /// Create a new row with cells.
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self {
            cells,
            is_header: false,
        }
    }

    /// Create a row from text values.
    pub fn from_strings<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(values.into_iter().map(TableCell::text).collect())
    }

    /// Number of grid columns the row occupies.
    pub fn span_width(&self) -> usize {
        self.cells.iter().map(|c| c.column_span.max(1) as usize).sum()
    }

    /// Get plain text representation.
    pub fn plain_text(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\t")
    }
}

/// A table cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell text
    pub text: String,

    /// Number of columns this cell spans
    pub column_span: u8,

    /// Cell alignment
    pub alignment: Alignment,

    /// Whether the cell text is bold
    #[serde(default)]
    pub bold: bool,

    /// Dominant font size of the cell text
    #[serde(default)]
    pub font_size: f32,
}

impl TableCell {
    /// Create a new cell with text content.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            column_span: 1,
            alignment: Alignment::Left,
            bold: false,
            font_size: 0.0,
        }
    }

    /// Set column span and return self.
    pub fn colspan(mut self, span: u8) -> Self {
        self.column_span = span.max(1);
        self
    }

    /// Set alignment and return self.
    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Check if the cell is empty.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
