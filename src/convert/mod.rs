//! Conversion pipeline: extracted items in, structure or output bytes out.
//!
//! # Example
//!
//! ```no_run
//! use relayout::convert::{convert, ConvertOptions, OutputFormat};
//! use relayout::DocumentInput;
//!
//! fn main() -> relayout::Result<()> {
//!     let json = std::fs::read_to_string("items.json")?;
//!     let input = DocumentInput::from_json(&json)?;
//!
//!     let options = ConvertOptions::new().with_format(OutputFormat::Docx);
//!     let result = convert(&input, "report.pdf", &options)?;
//!     std::fs::write(&result.file_name, &result.bytes)?;
//!     Ok(())
//! }
//! ```

use std::path::Path;
use std::str::FromStr;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::layout::normalize::prime_style_cache;
use crate::layout::{LayoutAnalyzer, LayoutConfig, SegmentStrategy, SegmentationChain, StyleCache};
use crate::model::{DocumentInput, DocumentStructure, PageStructure};
use crate::render::{to_json, to_text, DocxWriter, RenderOptions};

/// Options for document conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Analyze pages in parallel with rayon
    pub parallel: bool,

    /// Output format
    pub output_format: OutputFormat,

    /// Segmentation strategies, tried in order
    pub strategies: Vec<SegmentStrategy>,

    /// Layout thresholds
    pub layout: LayoutConfig,

    /// Rendering options
    pub render: RenderOptions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            output_format: OutputFormat::default(),
            strategies: SegmentStrategy::DEFAULT_ORDER.to_vec(),
            layout: LayoutConfig::default(),
            render: RenderOptions::default(),
        }
    }
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable parallel page analysis.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set the segmentation strategy order. An empty list keeps the default.
    pub fn with_strategies(mut self, strategies: Vec<SegmentStrategy>) -> Self {
        if !strategies.is_empty() {
            self.strategies = strategies;
        }
        self
    }

    /// Set layout thresholds.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Set rendering options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render = options;
        self
    }
}

/// Output format for conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Word document
    #[default]
    Docx,

    /// JSON structure
    Json,

    /// Plain text
    Text,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Docx => "docx",
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
        }
    }

    /// MIME type of the output.
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            OutputFormat::Json => "application/json",
            OutputFormat::Text => "text/plain",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "docx" | "word" => Ok(OutputFormat::Docx),
            "json" => Ok(OutputFormat::Json),
            "txt" | "text" => Ok(OutputFormat::Text),
            other => Err(Error::InvalidInput(format!("unknown output format: {}", other))),
        }
    }
}

/// Result of document conversion.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// Encoded output
    pub bytes: Vec<u8>,

    /// MIME type of the output
    pub mime_type: &'static str,

    /// Suggested file name, `<base>-converted-<unix-timestamp>.<ext>`
    pub file_name: String,
}

impl ConvertResult {
    /// Get content length in bytes.
    pub fn content_len(&self) -> usize {
        self.bytes.len()
    }
}

/// Rebuild the document structure from extracted items.
///
/// Fonts are resolved in a sequential pre-pass; pages are then analyzed
/// independently, in parallel unless disabled, and kept in input order. A
/// page that fails analysis is logged and comes back empty.
pub fn build_structure(input: &DocumentInput, options: &ConvertOptions) -> Result<DocumentStructure> {
    let has_text = input
        .pages
        .iter()
        .flat_map(|p| &p.items)
        .any(|i| !i.text.trim().is_empty());
    if !has_text && input.metadata_is_empty() {
        return Err(Error::InputEmpty);
    }

    let chain = if options.strategies.is_empty() {
        SegmentationChain::default()
    } else {
        SegmentationChain::from_strategies(&options.strategies)
    };

    let mut cache = StyleCache::new();
    prime_style_cache(&mut cache, &input.pages);

    let analyzer = LayoutAnalyzer::new(&options.layout, &chain, &cache);
    let pages: Vec<PageStructure> = if options.parallel {
        input
            .pages
            .par_iter()
            .map(|page| analyzer.analyze_page_or_empty(page))
            .collect()
    } else {
        input
            .pages
            .iter()
            .map(|page| analyzer.analyze_page_or_empty(page))
            .collect()
    };

    let mut doc = DocumentStructure::with_metadata(input.metadata.clone().unwrap_or_default());
    doc.pages = pages;

    log::debug!(
        "Built structure: {} pages, {} blocks, {} fonts",
        doc.page_count(),
        doc.blocks().count(),
        cache.len()
    );
    Ok(doc)
}

/// Render an already built structure in the requested format.
pub fn render(doc: &DocumentStructure, options: &ConvertOptions) -> Result<Vec<u8>> {
    match options.output_format {
        OutputFormat::Docx => DocxWriter::new(&options.render, &options.layout).write(doc),
        OutputFormat::Json => {
            let mut selected = doc.clone();
            selected
                .pages
                .retain(|p| options.render.page_selection.includes(p.number));
            Ok(to_json(&selected, options.render.json_format)?.into_bytes())
        }
        OutputFormat::Text => Ok(to_text(doc, &options.render)?.into_bytes()),
    }
}

/// Run the whole pipeline and name the output after `original_name`.
pub fn convert(
    input: &DocumentInput,
    original_name: &str,
    options: &ConvertOptions,
) -> Result<ConvertResult> {
    let doc = build_structure(input, options)?;
    let bytes = render(&doc, options)?;
    let format = options.output_format;

    Ok(ConvertResult {
        bytes,
        mime_type: format.mime_type(),
        file_name: output_file_name(
            original_name,
            format.extension(),
            chrono::Utc::now().timestamp(),
        ),
    })
}

/// Output file name: `<original-base-name>-converted-<timestamp>.<ext>`.
pub fn output_file_name(original_name: &str, extension: &str, timestamp: i64) -> String {
    let base = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document");
    format!("{}-converted-{}.{}", base, timestamp, extension)
}
