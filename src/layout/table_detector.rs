//! Table inference from column-aligned text items.
//!
//! Tables are detected without ruling lines: x positions are quantized into
//! buckets, buckets that collect enough cell starts become aligned columns,
//! and runs of rows with cells in at least two aligned columns become
//! tables.

use std::collections::{BTreeMap, HashSet};

use crate::model::{is_all_caps, Alignment, Bounds, TableCell, TableData, TableRow, TextItem};

use super::classifier::starts_with_list_marker;
use super::options::LayoutConfig;
use super::text::TextAssembler;

/// An aligned column: a run of adjacent x buckets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnAnchor {
    /// Leftmost cell start seen in the column
    pub x: f32,
    /// First bucket of the run
    pub first_bucket: i32,
    /// Last bucket of the run
    pub last_bucket: i32,
    /// Rows with a cell start in the column
    pub rows: usize,
}

impl ColumnAnchor {
    fn contains_bucket(&self, bucket: i32) -> bool {
        (self.first_bucket..=self.last_bucket).contains(&bucket)
    }
}

/// A row of items grouped by vertical position, sorted left to right.
#[derive(Debug, Clone)]
struct RowData {
    items: Vec<TextItem>,
}

/// Detects and rebuilds tables.
#[derive(Debug, Clone)]
pub struct TableInferencer<'a> {
    config: &'a LayoutConfig,
    assembler: TextAssembler<'a>,
}

impl<'a> TableInferencer<'a> {
    /// Create an inferencer.
    pub fn new(config: &'a LayoutConfig) -> Self {
        Self {
            config,
            assembler: TextAssembler::new(config),
        }
    }

    /// Carve table regions out of a set of items.
    ///
    /// Returns the tables and the items that were not claimed by any table.
    pub fn infer(&self, items: Vec<TextItem>) -> (Vec<TableData>, Vec<TextItem>) {
        let min_items = self.config.min_table_rows * 2;
        if items.len() < min_items {
            log::debug!(
                "TableInferencer: not enough items ({} < {})",
                items.len(),
                min_items
            );
            return (Vec::new(), items);
        }

        let rows = self.group_rows(items);
        let anchors = self.column_anchors(&rows, self.config.min_column_items);
        log::debug!(
            "TableInferencer: {} rows, {} aligned columns at {:?}",
            rows.len(),
            anchors.len(),
            anchors.iter().map(|a| a.x).collect::<Vec<_>>()
        );

        if anchors.len() < 2 {
            return (Vec::new(), rows.into_iter().flat_map(|r| r.items).collect());
        }

        let regions = self.find_regions(&rows, &anchors);
        log::debug!("TableInferencer: {} candidate regions", regions.len());

        let mut claimed = vec![false; rows.len()];
        let mut region_rows: Vec<(usize, usize)> = Vec::new();
        for (start, end) in regions {
            let slice = &rows[start..=end];
            let item_count: usize = slice.iter().map(|r| r.items.len()).sum();
            let row_count = slice.len();

            if (item_count as f32) < self.config.min_items_per_row * row_count as f32 {
                log::debug!(
                    "TableInferencer: skipping region - too sparse ({} items in {} rows)",
                    item_count,
                    row_count
                );
                continue;
            }
            if self.is_list_pattern(slice) {
                log::debug!("TableInferencer: skipping region - detected as list pattern");
                continue;
            }

            claimed[start..=end].iter_mut().for_each(|c| *c = true);
            region_rows.push((start, end));
        }

        let mut tables = Vec::new();
        let mut remaining = Vec::new();
        let mut current: Vec<Vec<TextItem>> = Vec::new();
        let mut regions = region_rows.into_iter().peekable();

        for (idx, row) in rows.into_iter().enumerate() {
            if !claimed[idx] {
                remaining.extend(row.items);
                continue;
            }
            current.push(row.items);
            if regions.peek().map(|(_, end)| *end == idx).unwrap_or(false) {
                regions.next();
                let table = self.build_table(std::mem::take(&mut current), &anchors);
                log::debug!(
                    "TableInferencer: table with {} rows x {} columns",
                    table.row_count(),
                    table.column_count
                );
                tables.push(table);
            }
        }

        (tables, remaining)
    }

    /// Rebuild a table from items already judged tabular.
    ///
    /// Columns only need to recur on two rows here.
    pub fn reconstruct(&self, items: Vec<TextItem>) -> TableData {
        let rows = self.group_rows(items);
        let anchors = self.column_anchors(&rows, 2);
        self.build_table(rows.into_iter().map(|r| r.items).collect(), &anchors)
    }

    /// Group items into rows by vertical position, top first.
    fn group_rows(&self, mut items: Vec<TextItem>) -> Vec<RowData> {
        items.sort_by(|a, b| {
            a.y.partial_cmp(&b.y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
        });

        let mut rows: Vec<RowData> = Vec::new();
        let mut anchor_y: Option<f32> = None;

        for item in items {
            match (anchor_y, rows.last_mut()) {
                (Some(y), Some(row)) if (item.y - y).abs() <= self.config.row_bucket => {
                    row.items.push(item)
                }
                _ => {
                    anchor_y = Some(item.y);
                    rows.push(RowData { items: vec![item] });
                }
            }
        }

        for row in &mut rows {
            row.items
                .sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        }
        rows
    }

    fn bucket(&self, x: f32) -> i32 {
        (x / self.config.column_bucket).round() as i32
    }

    /// Items that start a cell: the first in a row, or one far enough from
    /// the previous item's right edge.
    fn cell_starts<'r>(&self, row: &'r RowData) -> Vec<&'r TextItem> {
        let mut starts = Vec::new();
        let mut prev: Option<&TextItem> = None;
        for item in &row.items {
            let is_start = prev
                .map(|p| item.x - p.right() >= self.config.min_cell_gap)
                .unwrap_or(true);
            if is_start {
                starts.push(item);
            }
            prev = Some(item);
        }
        starts
    }

    /// Aligned columns: runs of adjacent buckets with at least `min_rows` cell starts.
    fn column_anchors(&self, rows: &[RowData], min_rows: usize) -> Vec<ColumnAnchor> {
        let mut counts: BTreeMap<i32, (usize, f32)> = BTreeMap::new();

        for row in rows {
            let mut seen = HashSet::new();
            for item in self.cell_starts(row) {
                let bucket = self.bucket(item.x);
                let entry = counts.entry(bucket).or_insert((0, item.x));
                if seen.insert(bucket) {
                    entry.0 += 1;
                }
                entry.1 = entry.1.min(item.x);
            }
        }

        let mut anchors: Vec<ColumnAnchor> = Vec::new();
        for (bucket, (count, x)) in counts {
            match anchors.last_mut() {
                Some(last) if bucket == last.last_bucket + 1 => {
                    last.last_bucket = bucket;
                    last.rows += count;
                    last.x = last.x.min(x);
                }
                _ => anchors.push(ColumnAnchor {
                    x,
                    first_bucket: bucket,
                    last_bucket: bucket,
                    rows: count,
                }),
            }
        }

        anchors.retain(|a| a.rows >= min_rows.max(1));
        anchors
    }

    /// Indices of aligned columns a row has cell starts in.
    fn row_columns(&self, row: &RowData, anchors: &[ColumnAnchor]) -> HashSet<usize> {
        self.cell_starts(row)
            .into_iter()
            .filter_map(|item| {
                let bucket = self.bucket(item.x);
                anchors.iter().position(|a| a.contains_bucket(bucket))
            })
            .collect()
    }

    /// Runs of consecutive table rows that are long enough.
    fn find_regions(&self, rows: &[RowData], anchors: &[ColumnAnchor]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            let is_table_row = self.row_columns(row, anchors).len() >= 2;
            match (is_table_row, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    if i - s >= self.config.min_table_rows {
                        regions.push((s, i - 1));
                    }
                    start = None;
                }
                _ => {}
            }
        }

        if let Some(s) = start {
            if rows.len() - s >= self.config.min_table_rows {
                regions.push((s, rows.len() - 1));
            }
        }

        regions
    }

    /// Check if candidate rows are a numbered or bulleted list.
    ///
    /// A marker and its item text often arrive as separate items at
    /// different x positions, which looks like two columns.
    fn is_list_pattern(&self, rows: &[RowData]) -> bool {
        if rows.is_empty() {
            return false;
        }

        let marked = rows
            .iter()
            .filter(|row| match row.items.first() {
                Some(first) => is_marker_only(&first.text) || starts_with_list_marker(&first.text),
                None => false,
            })
            .count();

        marked as f32 / rows.len() as f32 >= 0.5
    }

    /// Build a table from rows of items.
    fn build_table(&self, rows: Vec<Vec<TextItem>>, anchors: &[ColumnAnchor]) -> TableData {
        let mut table = TableData::new();
        let mut all_items: Vec<TextItem> = Vec::new();

        for items in rows {
            let cells = self.build_cells(&items, anchors);
            table.add_row(TableRow::new(cells));
            all_items.extend(items);
        }

        if self.first_row_is_header(&table) {
            if let Some(first) = table.rows.first_mut() {
                first.is_header = true;
            }
        }

        table.bounds = Bounds::of_items(&all_items).unwrap_or_default();
        table.items = all_items;
        table
    }

    /// Merge fragments closer than the cell gap and compute column spans.
    fn build_cells(&self, items: &[TextItem], anchors: &[ColumnAnchor]) -> Vec<TableCell> {
        let mut groups: Vec<Vec<&TextItem>> = Vec::new();
        for item in items {
            match groups.last_mut().and_then(|g| g.last().copied().map(|p| (g, p))) {
                Some((group, prev)) if item.x - prev.right() < self.config.min_cell_gap => {
                    group.push(item)
                }
                _ => groups.push(vec![item]),
            }
        }

        groups
            .into_iter()
            .map(|group| {
                let left = group.first().map(|i| i.x).unwrap_or(0.0);
                let right = group.iter().map(|i| i.right()).fold(left, f32::max);
                let first_bucket = self.bucket(left);

                let span = anchors
                    .iter()
                    .filter(|a| a.contains_bucket(first_bucket) || (a.x > left && a.x < right))
                    .count()
                    .clamp(1, u8::MAX as usize) as u8;

                let text = self.assembler.line_text(&group);
                let chars: usize = group.iter().map(|i| i.char_count()).sum();
                let bold_chars: usize = group
                    .iter()
                    .filter(|i| i.bold)
                    .map(|i| i.char_count())
                    .sum();

                let mut cell = TableCell::text(text.trim()).colspan(span).align(Alignment::Left);
                cell.bold = chars > 0 && bold_chars * 2 > chars;
                cell.font_size = group.iter().map(|i| i.font_size).fold(0.0, f32::max);
                cell
            })
            .collect()
    }

    /// First row is bold, larger or all caps while the rest is not.
    fn first_row_is_header(&self, table: &TableData) -> bool {
        let (first, rest) = match table.rows.split_first() {
            Some((first, rest)) if !rest.is_empty() => (first, rest),
            _ => return false,
        };
        let rest_cells = || rest.iter().flat_map(|r| r.cells.iter());

        let bold = first.cells.iter().any(|c| c.bold) && !rest_cells().any(|c| c.bold);

        let first_size = average(first.cells.iter().map(|c| c.font_size));
        let rest_size = average(rest_cells().map(|c| c.font_size));
        let larger = rest_size > 0.0 && first_size > rest_size * self.config.header_font_ratio;

        let caps = first.cells.iter().any(|c| is_all_caps(&c.text))
            && !rest_cells().any(|c| is_all_caps(&c.text));

        bold || larger || caps
    }
}

fn average(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

/// Check if text is only a list marker (bullet glyph, "1.", "a)", "(2)").
fn is_marker_only(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    if matches!(
        cleaned.as_str(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "►" | "■" | "●" | "□" | "◆" | "➤"
    ) {
        return true;
    }

    let inner = cleaned
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .or_else(|| cleaned.strip_suffix('.'))
        .or_else(|| cleaned.strip_suffix(')'));

    match inner {
        Some(inner) => {
            (!inner.is_empty() && inner.len() <= 3 && inner.chars().all(|c| c.is_ascii_digit()))
                || (inner.chars().count() == 1 && inner.chars().all(char::is_alphabetic))
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(text: &str, x: f32, y: f32) -> TextItem {
        let mut item = TextItem::new(text, x, y, 12.0, "Helvetica").with_width(text.len() as f32 * 6.0);
        item.height = 12.0;
        item.space_width = 3.3;
        item
    }

    fn grid() -> Vec<TextItem> {
        vec![
            item("Name", 50.0, 100.0).with_bold(true),
            item("Age", 200.0, 100.0).with_bold(true),
            item("City", 350.0, 100.0).with_bold(true),
            item("Alice", 50.0, 120.0),
            item("30", 200.0, 120.0),
            item("Seoul", 350.0, 120.0),
            item("Bob", 50.0, 140.0),
            item("25", 200.0, 140.0),
            item("Busan", 350.0, 140.0),
        ]
    }

    #[test]
    fn test_detect_grid() {
        let config = LayoutConfig::default();
        let (tables, remaining) = TableInferencer::new(&config).infer(grid());

        assert_eq!(tables.len(), 1);
        assert!(remaining.is_empty());

        let table = &tables[0];
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count, 3);
        assert!(table.has_header());
        assert_eq!(table.rows[1].cells[2].text, "Seoul");
        assert_eq!(table.items.len(), 9);
    }

    #[test]
    fn test_header_by_font_size() {
        let config = LayoutConfig::default();
        let mut items = grid();
        for item in items.iter_mut() {
            item.bold = false;
            if item.y == 100.0 {
                item.font_size = 14.0;
            }
        }
        let (tables, _) = TableInferencer::new(&config).infer(items);
        assert!(tables[0].has_header());
    }

    #[test]
    fn test_no_header_for_uniform_rows() {
        let config = LayoutConfig::default();
        let items = grid().into_iter().map(|i| i.with_bold(false)).collect();
        let (tables, _) = TableInferencer::new(&config).infer(items);
        assert!(!tables[0].has_header());
    }

    #[test]
    fn test_no_table_single_column() {
        let config = LayoutConfig::default();
        let items = vec![
            item("Line 1", 10.0, 100.0),
            item("Line 2", 10.0, 115.0),
            item("Line 3", 10.0, 130.0),
        ];
        let (tables, remaining) = TableInferencer::new(&config).infer(items);
        assert!(tables.is_empty());
        assert_eq!(remaining.len(), 3);
    }

    #[test]
    fn test_numbered_list_not_detected_as_table() {
        let config = LayoutConfig::default();
        let items = vec![
            item("1.", 50.0, 400.0),
            item("장비관리설정", 80.0, 400.0),
            item("2.", 50.0, 430.0),
            item("Object관리", 80.0, 430.0),
            item("3.", 50.0, 460.0),
            item("정책관리 및 라우팅", 80.0, 460.0),
        ];
        let (tables, remaining) = TableInferencer::new(&config).infer(items);
        assert!(tables.is_empty(), "Numbered list should not be detected as a table");
        assert_eq!(remaining.len(), 6);
    }

    #[test]
    fn test_table_keeps_surrounding_text() {
        let config = LayoutConfig::default();
        let mut items = grid();
        items.push(item("Intro paragraph", 50.0, 60.0));
        items.push(item("Closing words", 50.0, 200.0));

        let (tables, remaining) = TableInferencer::new(&config).infer(items);
        assert_eq!(tables.len(), 1);
        assert_eq!(remaining.len(), 2);
    }

    #[test]
    fn test_fragments_merge_into_cell() {
        let config = LayoutConfig::default();
        let items = vec![
            item("New", 50.0, 100.0),
            item("York", 71.0, 100.0),
            item("8.3M", 200.0, 100.0),
            item("Paris", 50.0, 120.0),
            item("2.1M", 200.0, 120.0),
            item("Rome", 50.0, 140.0),
            item("2.8M", 200.0, 140.0),
        ];
        let (tables, _) = TableInferencer::new(&config).infer(items);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[0].cells[0].text, "New York");
        assert_eq!(tables[0].column_count, 2);
    }

    #[test]
    fn test_spanning_cell() {
        let config = LayoutConfig::default();
        let items = vec![
            item("Quarterly results for all regions", 50.0, 100.0),
            item("Q1", 50.0, 120.0),
            item("Q2", 200.0, 120.0),
            item("10", 50.0, 140.0),
            item("20", 200.0, 140.0),
        ];
        let table = TableInferencer::new(&config).reconstruct(items);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows[0].cells[0].column_span, 2);
        assert_eq!(table.column_count, 2);
        assert!(table
            .rows
            .iter()
            .all(|r| r.cells.len() <= table.column_count));
    }

    #[test]
    fn test_is_marker_only() {
        assert!(is_marker_only("1."));
        assert!(is_marker_only("12)"));
        assert!(is_marker_only("(3)"));
        assert!(is_marker_only("•"));
        assert!(is_marker_only("a."));
        assert!(!is_marker_only("Name"));
        assert!(!is_marker_only(""));
    }
}
