//! Line grouping and text reconstruction from positioned items.

use std::borrow::Borrow;
use std::cmp::Ordering;

use crate::model::TextItem;

use super::cleanup::CleanupPipeline;
use super::metrics::MetricsEngine;
use super::options::LayoutConfig;

/// Sort items into reading order and group them into visual lines.
///
/// Items are sorted top of page first. An item joins the current line when
/// its y differs from the line's anchor (its first item) by less than
/// `tolerance`; each line is then sorted left to right.
pub fn group_lines<T: Borrow<TextItem>>(mut items: Vec<T>, tolerance: f32) -> Vec<Vec<T>> {
    items.sort_by(|a, b| {
        let (a, b) = (a.borrow(), b.borrow());
        a.y.partial_cmp(&b.y)
            .unwrap_or(Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });

    let mut lines: Vec<Vec<T>> = Vec::new();
    let mut anchor: Option<f32> = None;

    for item in items {
        let y = item.borrow().y;
        match (anchor, lines.last_mut()) {
            (Some(a), Some(line)) if (y - a).abs() < tolerance => line.push(item),
            _ => {
                anchor = Some(y);
                lines.push(vec![item]);
            }
        }
    }

    for line in &mut lines {
        line.sort_by(|a, b| {
            a.borrow()
                .x
                .partial_cmp(&b.borrow().x)
                .unwrap_or(Ordering::Equal)
        });
    }

    lines
}

/// Average font size of a set of items, or `fallback` when there are none.
pub fn average_font_size<'a>(items: impl IntoIterator<Item = &'a TextItem>, fallback: f32) -> f32 {
    let (sum, count) = items
        .into_iter()
        .filter(|i| i.font_size > 0.0)
        .fold((0.0f32, 0usize), |(s, c), i| (s + i.font_size, c + 1));
    if count == 0 {
        fallback
    } else {
        sum / count as f32
    }
}

/// Check if a character belongs to a script written without word spaces.
///
/// Hangul is excluded: Korean separates words with spaces.
pub fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        || (0x3040..=0x309F).contains(&code)
        || (0x30A0..=0x30FF).contains(&code)
        || (0x3000..=0x303F).contains(&code)
}

/// Rebuilds text from item geometry.
#[derive(Debug, Clone)]
pub struct TextAssembler<'a> {
    config: &'a LayoutConfig,
    metrics: MetricsEngine,
    cleanup: CleanupPipeline,
}

impl<'a> TextAssembler<'a> {
    /// Create an assembler with default cleanup.
    pub fn new(config: &'a LayoutConfig) -> Self {
        Self {
            config,
            metrics: MetricsEngine::new(),
            cleanup: CleanupPipeline::default(),
        }
    }

    /// Space width for an item, estimated when the extractor did not report one.
    pub fn space_width(&self, item: &TextItem) -> f32 {
        if item.space_width > 0.0 {
            item.space_width
        } else {
            self.metrics.space_width(item.font_size, item.family())
        }
    }

    /// Horizontal gap between two items on the same line, in space widths.
    pub fn gap_in_spaces(&self, prev: &TextItem, next: &TextItem) -> f32 {
        let space = self.space_width(next).max(0.1);
        (next.x - prev.right()) / space
    }

    /// Number of spaces (0-3) to insert between two adjacent items.
    pub fn spaces_between(&self, prev: &TextItem, next: &TextItem) -> usize {
        if prev.text.ends_with(char::is_whitespace) || next.text.starts_with(char::is_whitespace) {
            return 0;
        }

        let both_spaceless = prev
            .text
            .chars()
            .last()
            .map(is_spaceless_script_char)
            .unwrap_or(false)
            && next
                .text
                .chars()
                .next()
                .map(is_spaceless_script_char)
                .unwrap_or(false);
        if both_spaceless {
            return 0;
        }

        let gap = self.gap_in_spaces(prev, next);
        if gap > self.config.triple_space_gap {
            3
        } else if gap > self.config.double_space_gap {
            2
        } else if gap > self.config.single_space_gap {
            1
        } else {
            0
        }
    }

    /// Text of one visual line, items already sorted left to right.
    pub fn line_text<T: Borrow<TextItem>>(&self, line: &[T]) -> String {
        let mut text = String::new();
        let mut prev: Option<&TextItem> = None;

        for item in line {
            let item = item.borrow();
            if let Some(p) = prev {
                text.extend(std::iter::repeat(' ').take(self.spaces_between(p, item)));
            }
            text.push_str(&item.text);
            prev = Some(item);
        }

        text
    }

    /// Raw text of a set of items: lines joined by one space, with
    /// end-of-line hyphenation joined.
    pub fn raw_text(&self, items: &[TextItem]) -> String {
        let tolerance = self
            .config
            .line_tolerance(average_font_size(items, self.config.default_font_size));
        let lines = group_lines(items.iter().collect(), tolerance);

        let mut text = String::new();
        for line in &lines {
            let line_text = self.line_text(line);
            let line_text = line_text.trim();
            if line_text.is_empty() {
                continue;
            }

            if text.is_empty() {
                text.push_str(line_text);
            } else if ends_with_hyphenated_word(&text)
                && line_text.starts_with(|c: char| c.is_lowercase())
            {
                text.pop();
                text.push_str(line_text);
            } else {
                text.push(' ');
                text.push_str(line_text);
            }
        }

        text
    }

    /// Cleaned text of a set of items.
    pub fn block_text(&self, items: &[TextItem]) -> String {
        self.cleanup.process(&self.raw_text(items))
    }
}

/// A trailing `-` directly after a letter.
fn ends_with_hyphenated_word(text: &str) -> bool {
    let mut chars = text.chars().rev();
    matches!(chars.next(), Some('-')) && chars.next().map(char::is_alphabetic).unwrap_or(false)
}
