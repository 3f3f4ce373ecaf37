//! # relayout
//!
//! Layout reconstruction for extracted PDF text.
//!
//! This library takes the positioned text runs a PDF extractor produces and
//! rebuilds the document's semantic structure: paragraphs, headings, lists,
//! tables, captions, addresses, contact lines and running headers/footers.
//! The structure is then re-emitted as DOCX, JSON, or plain text.
//!
//! ## Quick Start
//!
//! ```no_run
//! use relayout::{analyze, read_input, render};
//!
//! fn main() -> relayout::Result<()> {
//!     // Load items produced by the extractor
//!     let input = read_input("items.json")?;
//!
//!     // Rebuild the structure
//!     let doc = analyze(&input)?;
//!
//!     // Write a Word document
//!     let options = render::RenderOptions::default();
//!     let bytes = render::to_docx(&doc, &options)?;
//!     std::fs::write("output.docx", bytes)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Font resolution**: Subset tags, weights and vendor suffixes mapped to system families
//! - **Block segmentation**: Gap, line and single-block strategies in a fallback chain
//! - **Table inference**: Column-aligned items rebuilt into rows and cells
//! - **Classification**: Headings, lists, captions, addresses, contact lines
//! - **CJK support**: No spurious spaces between ideographs
//! - **Parallel processing**: Uses Rayon for multi-page documents

pub mod convert;
pub mod error;
pub mod layout;
pub mod model;
pub mod render;

// Re-export commonly used types
pub use convert::{build_structure, ConvertOptions, ConvertResult, OutputFormat};
pub use error::{Error, Result};
pub use layout::{CleanupOptions, LayoutConfig, SegmentStrategy};
pub use model::{
    Alignment, BlockStyle, BlockType, Bounds, Color, DocumentInput, DocumentStructure,
    ImagePlaceholder, Metadata, PageInput, PageStructure, ResolvedStyle, TableCell, TableData,
    TableRow, TextBlock, TextItem,
};
pub use render::{JsonFormat, PageSelection, RenderOptions};

use std::path::Path;

/// Read extractor output from a JSON file.
///
/// # Example
///
/// ```no_run
/// use relayout::read_input;
///
/// let input = read_input("items.json").unwrap();
/// println!("Pages: {}", input.pages.len());
/// ```
pub fn read_input<P: AsRef<Path>>(path: P) -> Result<DocumentInput> {
    let json = std::fs::read_to_string(path)?;
    DocumentInput::from_json(&json)
}

/// Rebuild the document structure with default options.
///
/// # Errors
///
/// Returns [`Error::InputEmpty`] when there are no text items and no
/// metadata.
///
/// # Example
///
/// ```no_run
/// use relayout::{analyze, read_input};
///
/// let doc = analyze(&read_input("items.json").unwrap()).unwrap();
/// for block in doc.blocks() {
///     println!("{:?}: {}", block.block_type, block.text);
/// }
/// ```
pub fn analyze(input: &DocumentInput) -> Result<DocumentStructure> {
    build_structure(input, &ConvertOptions::default())
}

/// Rebuild the document structure with custom options.
pub fn analyze_with_options(input: &DocumentInput, options: &ConvertOptions) -> Result<DocumentStructure> {
    build_structure(input, options)
}

/// Convert extracted items to DOCX bytes.
///
/// # Example
///
/// ```no_run
/// use relayout::{read_input, to_docx};
///
/// let bytes = to_docx(&read_input("items.json").unwrap()).unwrap();
/// std::fs::write("output.docx", bytes).unwrap();
/// ```
pub fn to_docx(input: &DocumentInput) -> Result<Vec<u8>> {
    let doc = analyze(input)?;
    render::to_docx(&doc, &RenderOptions::default())
}

/// Convert extracted items to plain text.
///
/// # Example
///
/// ```no_run
/// use relayout::{read_input, to_text, RenderOptions};
///
/// let options = RenderOptions::new().with_headers_footers(false);
/// let text = to_text(&read_input("items.json").unwrap(), &options).unwrap();
/// ```
pub fn to_text(input: &DocumentInput, options: &RenderOptions) -> Result<String> {
    let doc = analyze(input)?;
    render::to_text(&doc, options)
}

/// Convert extracted items to a JSON dump of the structure.
///
/// # Example
///
/// ```no_run
/// use relayout::{read_input, to_json, JsonFormat};
///
/// let json = to_json(&read_input("items.json").unwrap(), JsonFormat::Pretty).unwrap();
/// std::fs::write("structure.json", json).unwrap();
/// ```
pub fn to_json(input: &DocumentInput, format: JsonFormat) -> Result<String> {
    let doc = analyze(input)?;
    render::to_json(&doc, format)
}

/// Builder for analyzing and rendering extracted documents.
///
/// # Example
///
/// ```no_run
/// use relayout::{read_input, Relayout};
///
/// let input = read_input("items.json")?;
/// let bytes = Relayout::new()
///     .sequential()
///     .with_page_markers()
///     .analyze(&input)?
///     .to_docx()?;
/// # Ok::<(), relayout::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Relayout {
    options: ConvertOptions,
}

impl Relayout {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable parallel page analysis.
    pub fn sequential(mut self) -> Self {
        self.options.parallel = false;
        self
    }

    /// Set layout thresholds.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.options.layout = layout;
        self
    }

    /// Set the segmentation strategy order.
    pub fn with_strategies(mut self, strategies: Vec<SegmentStrategy>) -> Self {
        self.options = self.options.with_strategies(strategies);
        self
    }

    /// Emit "--- Page N ---" markers in DOCX output.
    pub fn with_page_markers(mut self) -> Self {
        self.options.render = self.options.render.with_page_markers(true);
        self
    }

    /// Do not start each page on a new DOCX page.
    pub fn without_page_breaks(mut self) -> Self {
        self.options.render = self.options.render.with_page_breaks(false);
        self
    }

    /// Drop running headers and footers from output.
    pub fn without_headers_footers(mut self) -> Self {
        self.options.render = self.options.render.with_headers_footers(false);
        self
    }

    /// Set page selection for output.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.options.render = self.options.render.with_pages(pages);
        self
    }

    /// Analyze the input and return a result wrapper.
    pub fn analyze(self, input: &DocumentInput) -> Result<RelayoutResult> {
        let document = build_structure(input, &self.options)?;
        Ok(RelayoutResult {
            document,
            options: self.options,
        })
    }
}

/// Result of analyzing a document.
#[derive(Debug, Clone)]
pub struct RelayoutResult {
    /// The reconstructed document
    pub document: DocumentStructure,
    /// Options to render with
    options: ConvertOptions,
}

impl RelayoutResult {
    /// Convert to DOCX bytes.
    pub fn to_docx(&self) -> Result<Vec<u8>> {
        render::DocxWriter::new(&self.options.render, &self.options.layout).write(&self.document)
    }

    /// Convert to plain text.
    pub fn to_text(&self) -> Result<String> {
        render::to_text(&self.document, &self.options.render)
    }

    /// Convert to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.document, format)
    }

    /// Get plain text without banners.
    pub fn plain_text(&self) -> String {
        self.document.plain_text()
    }

    /// Get the document.
    pub fn document(&self) -> &DocumentStructure {
        &self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> DocumentInput {
        let mut input = DocumentInput::new();
        input.add_page(PageInput::letter(1).with_items(vec![
            TextItem::new("Introduction", 72.0, 100.0, 18.0, "Arial-BoldMT"),
            TextItem::new("Some body text.", 72.0, 160.0, 11.0, "ArialMT"),
        ]));
        input
    }

    #[test]
    fn test_relayout_builder() {
        let builder = Relayout::new().sequential().with_page_markers();
        assert!(!builder.options.parallel);
        assert!(builder.options.render.page_markers);
    }

    #[test]
    fn test_relayout_builder_with_pages() {
        let builder = Relayout::new().with_pages(PageSelection::Range(1..=5));
        assert!(matches!(
            builder.options.render.page_selection,
            PageSelection::Range(_)
        ));
    }

    #[test]
    fn test_relayout_builder_without_headers_footers() {
        let builder = Relayout::new().without_headers_footers().without_page_breaks();
        assert!(!builder.options.render.include_headers_footers);
        assert!(!builder.options.render.page_breaks);
    }

    #[test]
    fn test_analyze_and_render() {
        let result = Relayout::new().analyze(&input()).unwrap();
        assert_eq!(result.document().page_count(), 1);
        assert!(result.plain_text().contains("Some body text."));
        assert!(result.to_text().unwrap().contains("PAGE 1"));
        assert!(!result.to_docx().unwrap().is_empty());
    }

    #[test]
    fn test_analyze_empty_input() {
        assert!(matches!(analyze(&DocumentInput::new()), Err(Error::InputEmpty)));
    }

    #[test]
    fn test_read_input_missing_file() {
        let result = read_input("/nonexistent/items.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
