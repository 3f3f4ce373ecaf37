//! Text blocks and their derived geometry and style.

use serde::{Deserialize, Serialize};

use super::{Color, TextItem};

/// Axis-aligned bounding box in page space (top-left origin).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge
    pub left: f32,
    /// Top edge
    pub top: f32,
    /// Right edge
    pub right: f32,
    /// Bottom edge
    pub bottom: f32,
}

impl Bounds {
    /// Bounds of a single item.
    pub fn of_item(item: &TextItem) -> Self {
        Self {
            left: item.x,
            top: item.y,
            right: item.right(),
            bottom: item.bottom(),
        }
    }

    /// Smallest bounds containing every item, or `None` for no items.
    pub fn of_items<'a>(items: impl IntoIterator<Item = &'a TextItem>) -> Option<Self> {
        let mut iter = items.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::of_item(first);
        for item in iter {
            bounds.extend(item);
        }
        Some(bounds)
    }

    /// Grow to contain an item.
    pub fn extend(&mut self, item: &TextItem) {
        self.left = self.left.min(item.x);
        self.top = self.top.min(item.y);
        self.right = self.right.max(item.right());
        self.bottom = self.bottom.max(item.bottom());
    }

    /// Check if an item's geometry lies inside.
    pub fn contains(&self, item: &TextItem) -> bool {
        item.x >= self.left
            && item.y >= self.top
            && item.right() <= self.right
            && item.bottom() <= self.bottom
    }

    /// Width of the box.
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Height of the box.
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Horizontal center.
    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }
}

/// Semantic type of a block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    /// A regular paragraph
    #[default]
    Paragraph,
    /// A heading
    Heading,
    /// A list item
    List,
    /// Tabular content detected by the classifier
    Table,
    /// A figure or table caption
    Caption,
    /// A postal address
    Address,
    /// Phone, email, or URL line
    Contact,
    /// Running header at the top of the page
    Header,
    /// Running footer at the bottom of the page
    Footer,
}

impl BlockType {
    /// Lowercase name, as used in JSON output and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Paragraph => "paragraph",
            BlockType::Heading => "heading",
            BlockType::List => "list",
            BlockType::Table => "table",
            BlockType::Caption => "caption",
            BlockType::Address => "address",
            BlockType::Contact => "contact",
            BlockType::Header => "header",
            BlockType::Footer => "footer",
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left alignment (default)
    #[default]
    Left,
    /// Center alignment
    Center,
    /// Right alignment
    Right,
    /// Justified alignment
    Justify,
}

/// Aggregated style of a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockStyle {
    /// Horizontal alignment
    pub alignment: Alignment,
    /// Left indent in points (minimum member x)
    pub indent: f32,
    /// Dominant font size (weighted by character count)
    pub font_size: f32,
    /// Dominant resolved family
    pub font_family: String,
    /// Any member item is bold
    pub has_bold: bool,
    /// Any member item is italic
    pub has_italic: bool,
    /// Dominant color
    pub color: Color,
}

/// A group of text items judged to belong together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    /// Member items in reading order
    pub items: Vec<TextItem>,
    /// Box containing every member
    pub bounds: Bounds,
    /// Semantic type
    #[serde(rename = "type")]
    pub block_type: BlockType,
    /// Aggregated style
    pub style: BlockStyle,
    /// Reconstructed text
    pub text: String,
}

impl TextBlock {
    /// Check if the block has no items or only whitespace text.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() || self.text.trim().is_empty()
    }

    /// Number of member items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Check if more than half of the characters are bold.
    pub fn is_mostly_bold(&self) -> bool {
        let total: usize = self.items.iter().map(|i| i.char_count()).sum();
        let bold: usize = self
            .items
            .iter()
            .filter(|i| i.bold)
            .map(|i| i.char_count())
            .sum();
        total > 0 && bold as f32 / total as f32 > 0.5
    }
}
