//! Layout reconstruction for one page.
//!
//! This module turns a page of positioned text items into classified
//! blocks and tables:
//! - Font resolution and width/height estimation
//! - Reading order and block segmentation
//! - Table inference
//! - Semantic classification

pub mod classifier;
pub mod cleanup;
pub mod metrics;
pub mod normalize;
mod options;
pub mod segmenter;
pub mod style;
pub mod table_detector;
pub mod text;

pub use classifier::BlockClassifier;
pub use cleanup::{CleanupOptions, CleanupPipeline};
pub use metrics::MetricsEngine;
pub use options::LayoutConfig;
pub use segmenter::{
    GapSegmenter, LineSegmenter, SegmentStrategy, SegmentationChain, Segmenter,
    SingleBlockSegmenter,
};
pub use style::{resolve_font, StyleCache};
pub use table_detector::TableInferencer;

use crate::error::Result;
use crate::model::{BlockType, PageInput, PageStructure, TextBlock, TextItem};

/// Page facts shared by the layout stages.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    /// Page number (1-indexed)
    pub number: u32,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Heuristic thresholds
    pub config: &'a LayoutConfig,
}

/// Runs the layout stages for pages of one conversion.
#[derive(Debug)]
pub struct LayoutAnalyzer<'a> {
    config: &'a LayoutConfig,
    chain: &'a SegmentationChain,
    cache: &'a StyleCache,
}

impl<'a> LayoutAnalyzer<'a> {
    /// Create an analyzer over a primed style cache.
    pub fn new(config: &'a LayoutConfig, chain: &'a SegmentationChain, cache: &'a StyleCache) -> Self {
        Self {
            config,
            chain,
            cache,
        }
    }

    /// Analyze one page.
    pub fn analyze_page(&self, page: &PageInput) -> Result<PageStructure> {
        let items = normalize::normalize_page(page, self.cache, self.config)?;
        let ctx = PageContext {
            number: page.number,
            width: page.width,
            height: page.height,
            config: self.config,
        };

        let mut structure = PageStructure::empty(page.number, page.width, page.height);
        structure.images = page.images.clone();

        if items.is_empty() {
            log::debug!("Page {}: no text items", page.number);
            return Ok(structure);
        }

        let regions = segmenter::split_regions(items, &ctx);
        let (tables, body) = TableInferencer::new(self.config).infer(regions.body);

        let classifier = BlockClassifier::new(self.config);
        structure.headers = self.blocks(&regions.header, &ctx, &classifier, Some(BlockType::Header))?;
        structure.blocks = self.blocks(&body, &ctx, &classifier, None)?;
        structure.footers = self.blocks(&regions.footer, &ctx, &classifier, Some(BlockType::Footer))?;
        structure.tables = tables;

        log::debug!(
            "Page {}: {} blocks, {} headers, {} footers, {} tables",
            page.number,
            structure.blocks.len(),
            structure.headers.len(),
            structure.footers.len(),
            structure.tables.len()
        );
        Ok(structure)
    }

    /// Analyze one page, degrading to an empty page on failure.
    pub fn analyze_page_or_empty(&self, page: &PageInput) -> PageStructure {
        match self.analyze_page(page) {
            Ok(structure) => structure,
            Err(e) => {
                log::warn!("Page {} degraded to empty: {}", page.number, e);
                let mut structure = PageStructure::empty(page.number, page.width, page.height);
                structure.images = page.images.clone();
                structure
            }
        }
    }

    fn blocks(
        &self,
        items: &[TextItem],
        ctx: &PageContext<'_>,
        classifier: &BlockClassifier<'_>,
        forced: Option<BlockType>,
    ) -> Result<Vec<TextBlock>> {
        let blocks = self.chain.segment(items, ctx)?;
        Ok(blocks
            .into_iter()
            .map(|block| match forced {
                Some(block_type) => classifier.classify_as(block, ctx.width, block_type),
                None => classifier.classify(block, ctx.width),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(page: &PageInput) -> PageStructure {
        let config = LayoutConfig::default();
        let chain = SegmentationChain::default();
        let mut cache = StyleCache::new();
        normalize::prime_style_cache(&mut cache, [page]);
        LayoutAnalyzer::new(&config, &chain, &cache).analyze_page_or_empty(page)
    }

    #[test]
    fn test_header_body_footer() {
        let page = PageInput::letter(1).with_items(vec![
            TextItem::new("Running title", 72.0, 30.0, 9.0, "Arial"),
            TextItem::new("Body text here.", 72.0, 300.0, 12.0, "Arial"),
            TextItem::new("Page 1", 290.0, 760.0, 9.0, "Arial"),
        ]);
        let structure = analyze(&page);

        assert_eq!(structure.headers.len(), 1);
        assert_eq!(structure.headers[0].block_type, BlockType::Header);
        assert_eq!(structure.blocks.len(), 1);
        assert_eq!(structure.blocks[0].text, "Body text here.");
        assert_eq!(structure.footers.len(), 1);
        assert_eq!(structure.footers[0].block_type, BlockType::Footer);
    }

    #[test]
    fn test_malformed_page_degrades() {
        let page = PageInput::letter(2).with_items(vec![TextItem::new(
            "bad",
            f32::INFINITY,
            10.0,
            12.0,
            "Arial",
        )]);
        let structure = analyze(&page);
        assert!(structure.is_empty());
        assert_eq!(structure.number, 2);
    }

    #[test]
    fn test_empty_page() {
        let structure = analyze(&PageInput::letter(1));
        assert!(structure.is_empty());
    }
}
