//! Layout heuristics configuration.

/// Every threshold the segmenter, classifier and table inferencer use.
///
/// Ratios are relative to the quantity named in the field docs. The value is
/// immutable once built and shared by reference across page workers.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Fraction of page height at the top that holds running headers
    pub header_ratio: f32,
    /// Fraction of page height at the bottom that holds running footers
    pub footer_ratio: f32,
    /// Same-line tolerance as a fraction of the page's average font size
    pub line_tolerance_factor: f32,
    /// Floor for the same-line tolerance (points)
    pub min_line_tolerance: f32,
    /// Vertical break threshold in line heights
    pub block_gap_lines: f32,
    /// Font size ratio above the block average that starts a new block
    pub font_ratio_high: f32,
    /// Font size ratio below the block average that starts a new block
    pub font_ratio_low: f32,
    /// Same-line gap (in space widths) beyond which items are not merged
    pub max_same_line_gap_spaces: f32,
    /// Fallback font size when a page reports none
    pub default_font_size: f32,

    /// Centering tolerance as a fraction of page width
    pub center_tolerance: f32,
    /// Blocks wider than this fraction of the page are never "center"
    pub max_centered_width: f32,
    /// Blocks starting beyond this fraction of page width are "right"
    pub right_start: f32,
    /// Average same-line gap (in space widths) that reads as justified
    pub justify_gap_spaces: f32,

    /// Font size above which a block may be a heading
    pub heading_min_font_size: f32,
    /// All-caps blocks shorter than this may be headings
    pub heading_max_caps_len: usize,
    /// Headings are shorter than this
    pub heading_max_len: usize,
    /// List items are shorter than this
    pub list_max_len: usize,
    /// Address and contact blocks are shorter than this
    pub contact_max_len: usize,
    /// Captions are shorter than this
    pub caption_max_len: usize,

    /// Gap (in space widths) above which three spaces are inserted
    pub triple_space_gap: f32,
    /// Gap (in space widths) above which two spaces are inserted
    pub double_space_gap: f32,
    /// Gap (in space widths) above which one space is inserted
    pub single_space_gap: f32,

    /// Horizontal quantization bucket for table columns (points)
    pub column_bucket: f32,
    /// Vertical quantization bucket for table rows (points)
    pub row_bucket: f32,
    /// Items a quantized column needs to count as aligned
    pub min_column_items: usize,
    /// Rows a table needs
    pub min_table_rows: usize,
    /// Items per row a table region needs on average
    pub min_items_per_row: f32,
    /// Horizontal gap that separates two cells (points)
    pub min_cell_gap: f32,
    /// Font ratio of the first row over the rest that marks a header
    pub header_font_ratio: f32,
}

impl LayoutConfig {
    /// Create a config with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set header and footer bands.
    pub fn with_margins(mut self, header_ratio: f32, footer_ratio: f32) -> Self {
        self.header_ratio = header_ratio.clamp(0.0, 0.5);
        self.footer_ratio = footer_ratio.clamp(0.0, 0.5);
        self
    }

    /// Set the vertical break threshold in line heights.
    pub fn with_block_gap_lines(mut self, lines: f32) -> Self {
        self.block_gap_lines = lines;
        self
    }

    /// Set the font size ratios that break blocks.
    pub fn with_font_ratios(mut self, low: f32, high: f32) -> Self {
        self.font_ratio_low = low;
        self.font_ratio_high = high;
        self
    }

    /// Set the centering tolerance.
    pub fn with_center_tolerance(mut self, tolerance: f32) -> Self {
        self.center_tolerance = tolerance;
        self
    }

    /// Set the minimum gap between table cells.
    pub fn with_min_cell_gap(mut self, gap: f32) -> Self {
        self.min_cell_gap = gap;
        self
    }

    /// Same-line tolerance for a page with the given average font size.
    pub fn line_tolerance(&self, avg_font_size: f32) -> f32 {
        (avg_font_size * self.line_tolerance_factor).max(self.min_line_tolerance)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            header_ratio: 0.10,
            footer_ratio: 0.10,
            line_tolerance_factor: 0.8,
            min_line_tolerance: 5.0,
            block_gap_lines: 1.8,
            font_ratio_high: 1.3,
            font_ratio_low: 0.7,
            max_same_line_gap_spaces: 5.0,
            default_font_size: 12.0,

            center_tolerance: 0.15,
            max_centered_width: 0.65,
            right_start: 0.7,
            justify_gap_spaces: 1.5,

            heading_min_font_size: 13.0,
            heading_max_caps_len: 100,
            heading_max_len: 200,
            list_max_len: 500,
            contact_max_len: 300,
            caption_max_len: 200,

            triple_space_gap: 3.0,
            double_space_gap: 1.5,
            single_space_gap: 0.5,

            column_bucket: 10.0,
            row_bucket: 5.0,
            min_column_items: 3,
            min_table_rows: 2,
            min_items_per_row: 2.0,
            min_cell_gap: 10.0,
            header_font_ratio: 1.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_tolerance_floor() {
        let config = LayoutConfig::default();
        assert_eq!(config.line_tolerance(12.0), 12.0 * 0.8);
        assert_eq!(config.line_tolerance(4.0), 5.0);
    }

    #[test]
    fn test_builder() {
        let config = LayoutConfig::new()
            .with_margins(0.8, 0.05)
            .with_font_ratios(0.6, 1.5)
            .with_block_gap_lines(2.0)
            .with_center_tolerance(0.1)
            .with_min_cell_gap(14.0);

        assert_eq!(config.header_ratio, 0.5);
        assert_eq!(config.footer_ratio, 0.05);
        assert_eq!(config.font_ratio_low, 0.6);
        assert_eq!(config.font_ratio_high, 1.5);
        assert_eq!(config.block_gap_lines, 2.0);
        assert_eq!(config.center_tolerance, 0.1);
        assert_eq!(config.min_cell_gap, 14.0);
    }
}
