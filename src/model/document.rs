//! Document-level types: extraction input and reconstructed structure.

use super::{TableData, TextBlock, TextItem};
use serde::{Deserialize, Serialize};

fn default_page_width() -> f32 {
    612.0
}

fn default_page_height() -> f32 {
    792.0
}

/// Document metadata as reported by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    #[serde(default)]
    pub title: String,

    /// Document author
    #[serde(default)]
    pub author: String,

    /// Document subject
    #[serde(default)]
    pub subject: String,

    /// Keywords
    #[serde(default)]
    pub keywords: String,
}

impl Metadata {
    /// Check if every field is blank.
    pub fn is_empty(&self) -> bool {
        [&self.title, &self.author, &self.subject, &self.keywords]
            .iter()
            .all(|s| s.trim().is_empty())
    }
}

/// Placeholder for a non-text object (image, figure) on a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImagePlaceholder {
    /// X position (left edge)
    pub x: f32,
    /// Y position (top edge)
    pub y: f32,
    /// Width
    #[serde(default)]
    pub width: f32,
    /// Height
    #[serde(default)]
    pub height: f32,
}

/// One page of extracted items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInput {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in points
    #[serde(default = "default_page_width")]
    pub width: f32,

    /// Page height in points
    #[serde(default = "default_page_height")]
    pub height: f32,

    /// Text items in extraction order
    #[serde(default)]
    pub items: Vec<TextItem>,

    /// Non-text objects passed through as placeholders
    #[serde(default)]
    pub images: Vec<ImagePlaceholder>,
}

impl PageInput {
    /// Create a new page with the given dimensions.
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            items: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Create a new page with standard Letter size (8.5 x 11 inches).
    pub fn letter(number: u32) -> Self {
        Self::new(number, default_page_width(), default_page_height())
    }

    /// Add an item to the page.
    pub fn add_item(&mut self, item: TextItem) {
        self.items.push(item);
    }

    /// Add items and return self.
    pub fn with_items(mut self, items: impl IntoIterator<Item = TextItem>) -> Self {
        self.items.extend(items);
        self
    }
}

/// Everything the extraction collaborator hands over.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInput {
    /// Metadata, or `None` when extracting it failed
    #[serde(default)]
    pub metadata: Option<Metadata>,

    /// Pages in order
    #[serde(default)]
    pub pages: Vec<PageInput>,
}

impl DocumentInput {
    /// Create an empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read input records from JSON.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::Error::InvalidInput(e.to_string()))
    }

    /// Add a page.
    pub fn add_page(&mut self, page: PageInput) {
        self.pages.push(page);
    }

    /// Total number of text items across pages.
    pub fn item_count(&self) -> usize {
        self.pages.iter().map(|p| p.items.len()).sum()
    }

    /// Check if metadata is missing or blank.
    pub fn metadata_is_empty(&self) -> bool {
        self.metadata.as_ref().map(Metadata::is_empty).unwrap_or(true)
    }
}

/// The reconstructed structure of one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageStructure {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in points
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Body blocks in reading order
    pub blocks: Vec<TextBlock>,

    /// Running header blocks
    pub headers: Vec<TextBlock>,

    /// Running footer blocks
    pub footers: Vec<TextBlock>,

    /// Tables carved out of the body
    pub tables: Vec<TableData>,

    /// Image placeholders passed through from the input
    #[serde(default)]
    pub images: Vec<ImagePlaceholder>,
}

impl PageStructure {
    /// Create an empty page.
    pub fn empty(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            blocks: Vec::new(),
            headers: Vec::new(),
            footers: Vec::new(),
            tables: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Check if the page has no text content.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
            && self.headers.is_empty()
            && self.footers.is_empty()
            && self.tables.is_empty()
    }

    /// Number of items held by blocks and tables on this page.
    pub fn item_count(&self) -> usize {
        self.headers
            .iter()
            .chain(&self.blocks)
            .chain(&self.footers)
            .map(|b| b.items.len())
            .sum::<usize>()
            + self.tables.iter().map(|t| t.items.len()).sum::<usize>()
    }

    /// Get plain text content of the page body.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text.clone())
            .chain(self.tables.iter().map(|t| t.plain_text()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// The reconstructed document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentStructure {
    /// Pages in order
    pub pages: Vec<PageStructure>,

    /// Document title (empty when unavailable)
    pub title: String,

    /// Document author (empty when unavailable)
    pub author: String,

    /// Document subject (empty when unavailable)
    pub subject: String,

    /// Keywords (empty when unavailable)
    pub keywords: String,
}

impl DocumentStructure {
    /// Create an empty document with metadata.
    pub fn with_metadata(metadata: Metadata) -> Self {
        Self {
            pages: Vec::new(),
            title: metadata.title,
            author: metadata.author,
            subject: metadata.subject,
            keywords: metadata.keywords,
        }
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by number (1-indexed).
    pub fn get_page(&self, page_num: u32) -> Option<&PageStructure> {
        self.pages.iter().find(|p| p.number == page_num)
    }

    /// Iterate over all body blocks.
    pub fn blocks(&self) -> impl Iterator<Item = &TextBlock> {
        self.pages.iter().flat_map(|p| p.blocks.iter())
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .map(|page| page.plain_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_empty() {
        assert!(Metadata::default().is_empty());
        let meta = Metadata {
            title: "Report".to_string(),
            ..Default::default()
        };
        assert!(!meta.is_empty());
    }

    #[test]
    fn test_input_from_json_defaults_page_size() {
        let json = r#"{"pages":[{"number":1,"items":[]}]}"#;
        let input = DocumentInput::from_json(json).unwrap();
        assert_eq!(input.pages[0].width, 612.0);
        assert_eq!(input.pages[0].height, 792.0);
        assert!(input.metadata_is_empty());
    }

    #[test]
    fn test_input_from_invalid_json() {
        let result = DocumentInput::from_json("{not json");
        assert!(matches!(result, Err(crate::Error::InvalidInput(_))));
    }

    #[test]
    fn test_document_with_metadata() {
        let doc = DocumentStructure::with_metadata(Metadata {
            title: "T".to_string(),
            ..Default::default()
        });
        assert_eq!(doc.title, "T");
        assert_eq!(doc.author, "");
        assert_eq!(doc.page_count(), 0);
    }
}
