//! Block classification: semantic type, alignment, indentation and text.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{is_all_caps, Alignment, BlockStyle, BlockType, Bounds, Color, TextBlock, TextItem};

use super::options::LayoutConfig;
use super::text::{average_font_size, group_lines, TextAssembler};

static HEADING_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^(chapter|section|part)\s+([0-9]+|[ivxlcdm]+)\b",
        r"(?i)^(abstract|introduction|conclusions?|summary|references|bibliography|appendix|contents|table of contents|acknowledge?ments)\b",
        r"^\d+(\.\d+)*\.?\s+\p{Lu}",
        r"^[IVXLCDM]+\.\s+\p{Lu}",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static LIST_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([•●○■□▪▫◦‣⁃∙►▸➤✓]\s*\S|[-–—*]\s+\S|\d{1,3}[.)]\s+\S|[a-zA-Z][.)]\s+\S|\((\d{1,3}|[a-zA-Z])\)\s*\S)")
        .unwrap()
});

static BULLET_GLYPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[•●○■□▪▫◦‣⁃∙►▸➤✓]\s*|[-–—*]\s+)").unwrap());

static ADDRESS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // House number, one to four capitalized or ordinal name words, suffix.
        r"\b\d{1,6}\s+(?:(?:\p{Lu}[\p{L}'-]*|\d+(?:st|nd|rd|th))\.?\s+){1,4}(?i:street|st|avenue|ave|road|rd|boulevard|blvd|lane|ln|drive|dr|court|ct|way|place|pl|parkway|pkwy|highway|hwy|suite)\b\.?",
        r"\b[A-Z]{2}\s+\d{5}(-\d{4})?\b",
        r"(?i)\bp\.?\s*o\.?\s*box\s+\d+",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static CONTACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(\+\d{1,3}[\s.-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]\d{4}\b",
        r"[\w.+-]+@[\w-]+\.[\w.-]+",
        r"(?i)\b(https?://|www\.)\S+",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static CAPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*((figure|fig\.|table)\s*\d+|\[image\s+\d+\])").unwrap());

/// Alignment from geometry alone: center, right or left.
pub fn geometric_alignment(bounds: &Bounds, page_width: f32, config: &LayoutConfig) -> Alignment {
    if page_width <= 0.0 {
        return Alignment::Left;
    }

    let centered = (bounds.center_x() - page_width / 2.0).abs() <= page_width * config.center_tolerance
        && bounds.width() <= page_width * config.max_centered_width;

    if centered {
        Alignment::Center
    } else if bounds.left > page_width * config.right_start {
        Alignment::Right
    } else {
        Alignment::Left
    }
}

/// Check if text matches a heading pattern (numbered section, chapter, etc.).
pub fn matches_heading_pattern(text: &str) -> bool {
    let text = text.trim();
    HEADING_PATTERNS.iter().any(|re| re.is_match(text))
}

/// Check if text starts with a list marker.
pub fn starts_with_list_marker(text: &str) -> bool {
    LIST_MARKER.is_match(text)
}

/// Text after a leading bullet glyph, or `None` when the text has no bullet.
///
/// Ordinal markers such as `1.` or `(a)` are not bullets.
pub fn strip_bullet(text: &str) -> Option<&str> {
    BULLET_GLYPH.find(text).map(|m| &text[m.end()..])
}

/// Check if text looks like a postal address.
pub fn looks_like_address(text: &str) -> bool {
    ADDRESS_PATTERNS.iter().any(|re| re.is_match(text))
}

/// Check if text contains a phone number, email or URL.
pub fn looks_like_contact(text: &str) -> bool {
    CONTACT_PATTERNS.iter().any(|re| re.is_match(text))
}

/// Check if text starts like a figure or table caption.
pub fn looks_like_caption(text: &str) -> bool {
    CAPTION.is_match(text)
}

/// Assigns a type, style and text to segmented blocks.
#[derive(Debug, Clone)]
pub struct BlockClassifier<'a> {
    config: &'a LayoutConfig,
    assembler: TextAssembler<'a>,
}

impl<'a> BlockClassifier<'a> {
    /// Create a classifier.
    pub fn new(config: &'a LayoutConfig) -> Self {
        Self {
            config,
            assembler: TextAssembler::new(config),
        }
    }

    /// Fill in style, text and type.
    pub fn classify(&self, mut block: TextBlock, page_width: f32) -> TextBlock {
        if let Some(bounds) = Bounds::of_items(&block.items) {
            block.bounds = bounds;
        }
        block.style = self.style(&block, page_width);
        block.text = self.assembler.block_text(&block.items);
        block.block_type = self.block_type(&block);

        log::trace!(
            "Classified block as {} ({} items): {:?}",
            block.block_type.as_str(),
            block.items.len(),
            truncate(&block.text, 40)
        );
        block
    }

    /// Fill in style and text and force a type (for header and footer bands).
    pub fn classify_as(&self, block: TextBlock, page_width: f32, block_type: BlockType) -> TextBlock {
        let mut block = self.classify(block, page_width);
        block.block_type = block_type;
        block
    }

    /// Semantic type, first match wins.
    pub fn block_type(&self, block: &TextBlock) -> BlockType {
        let config = self.config;
        let text = block.text.trim();
        let len = text.chars().count();

        if len == 0 {
            return BlockType::Paragraph;
        }

        let emphasized = block.style.font_size > config.heading_min_font_size
            || block.is_mostly_bold()
            || (is_all_caps(text) && len < config.heading_max_caps_len);
        if emphasized
            && len < config.heading_max_len
            && (block.style.alignment == Alignment::Center || matches_heading_pattern(text))
        {
            return BlockType::Heading;
        }

        if len < config.list_max_len && starts_with_list_marker(text) {
            return BlockType::List;
        }

        if len < config.contact_max_len && looks_like_address(text) {
            return BlockType::Address;
        }

        if len < config.contact_max_len && looks_like_contact(text) {
            return BlockType::Contact;
        }

        if self.has_recurring_columns(&block.items) {
            return BlockType::Table;
        }

        if len < config.caption_max_len && looks_like_caption(text) {
            return BlockType::Caption;
        }

        BlockType::Paragraph
    }

    /// Aggregated style of a block.
    pub fn style(&self, block: &TextBlock, page_width: f32) -> BlockStyle {
        let items = &block.items;
        let mut alignment = geometric_alignment(&block.bounds, page_width, self.config);
        if alignment == Alignment::Left && self.is_justified(items) {
            alignment = Alignment::Justify;
        }

        BlockStyle {
            alignment,
            indent: block.bounds.left.max(0.0),
            font_size: dominant_font_size(items).unwrap_or(block.style.font_size),
            font_family: dominant_by_chars(items, |i| i.family().to_string())
                .unwrap_or_else(|| super::style::DEFAULT_FAMILY.to_string()),
            has_bold: items.iter().any(|i| i.bold),
            has_italic: items.iter().any(|i| i.italic),
            color: dominant_by_chars(items, |i| i.color).unwrap_or(Color::BLACK),
        }
    }

    /// Average same-line gap beyond the justify threshold.
    fn is_justified(&self, items: &[TextItem]) -> bool {
        let lines = self.lines(items);
        if lines.len() < 2 {
            return false;
        }

        let mut total = 0.0;
        let mut count = 0usize;
        // Last lines of justified paragraphs are ragged.
        for line in &lines[..lines.len() - 1] {
            for pair in line.windows(2) {
                total += self.assembler.gap_in_spaces(pair[0], pair[1]);
                count += 1;
            }
        }

        count > 0 && total / count as f32 > self.config.justify_gap_spaces
    }

    /// Three or more items whose column starts recur on at least two lines.
    fn has_recurring_columns(&self, items: &[TextItem]) -> bool {
        if items.len() < self.config.min_column_items {
            return false;
        }

        let lines = self.lines(items);
        let mut bucket_lines: HashMap<i32, usize> = HashMap::new();

        for line in &lines {
            let mut buckets = HashSet::new();
            let mut prev: Option<&TextItem> = None;
            for &item in line {
                let is_cell_start = prev
                    .map(|p| item.x - p.right() >= self.config.min_cell_gap)
                    .unwrap_or(true);
                if is_cell_start {
                    buckets.insert((item.x / self.config.column_bucket).round() as i32);
                }
                prev = Some(item);
            }
            if buckets.len() >= 2 {
                for bucket in buckets {
                    *bucket_lines.entry(bucket).or_insert(0) += 1;
                }
            }
        }

        bucket_lines.values().filter(|&&n| n >= 2).count() >= 2
    }

    fn lines<'i>(&self, items: &'i [TextItem]) -> Vec<Vec<&'i TextItem>> {
        let tolerance = self
            .config
            .line_tolerance(average_font_size(items, self.config.default_font_size));
        group_lines(items.iter().collect(), tolerance)
    }
}

/// Font size carrying the most characters.
fn dominant_font_size(items: &[TextItem]) -> Option<f32> {
    dominant_by_chars(items, |i| (i.font_size * 2.0).round() as i32).map(|half| half as f32 / 2.0)
}

/// Key value carrying the most characters; ties go to the first seen.
fn dominant_by_chars<K, F>(items: &[TextItem], key: F) -> Option<K>
where
    K: Eq + std::hash::Hash + Clone,
    F: Fn(&TextItem) -> K,
{
    let mut weights: HashMap<K, usize> = HashMap::new();
    let mut order: Vec<K> = Vec::new();

    for item in items {
        let k = key(item);
        let weight = weights.entry(k.clone()).or_insert_with(|| {
            order.push(k.clone());
            0
        });
        *weight += item.char_count().max(1);
    }

    let mut best: Option<(K, usize)> = None;
    for k in order {
        let w = weights[&k];
        if best.as_ref().map(|(_, bw)| w > *bw).unwrap_or(true) {
            best = Some((k, w));
        }
    }
    best.map(|(k, _)| k)
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
