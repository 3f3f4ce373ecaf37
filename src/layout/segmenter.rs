//! Block segmentation.
//!
//! Items on a page are put into reading order and grouped into blocks. The
//! main strategy breaks blocks on vertical gaps, alignment changes, font
//! size jumps and wide same-line gaps. Simpler strategies are kept as
//! fallbacks and tried in a configured order.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{BlockStyle, BlockType, Bounds, TextBlock, TextItem};

use super::classifier::geometric_alignment;
use super::metrics::MetricsEngine;
use super::text::{average_font_size, group_lines, TextAssembler};
use super::PageContext;

/// Items split into the running header band, the body and the running footer band.
#[derive(Debug, Clone, Default)]
pub struct PageRegions {
    /// Items in the top band
    pub header: Vec<TextItem>,
    /// Items between the bands
    pub body: Vec<TextItem>,
    /// Items in the bottom band
    pub footer: Vec<TextItem>,
}

/// Split items by their vertical position on the page.
pub fn split_regions(items: Vec<TextItem>, ctx: &PageContext<'_>) -> PageRegions {
    let header_limit = ctx.height * ctx.config.header_ratio;
    let footer_limit = ctx.height * (1.0 - ctx.config.footer_ratio);

    let mut regions = PageRegions::default();
    for item in items {
        if item.y < header_limit {
            regions.header.push(item);
        } else if item.y > footer_limit {
            regions.footer.push(item);
        } else {
            regions.body.push(item);
        }
    }
    regions
}

/// Accumulates items into a block while tracking running aggregates.
#[derive(Debug, Default)]
pub struct BlockBuilder {
    items: Vec<TextItem>,
    bounds: Option<Bounds>,
    font_size_sum: f32,
    last_y: f32,
}

impl BlockBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if no item has been added.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Append an item.
    pub fn push(&mut self, item: TextItem) {
        match &mut self.bounds {
            Some(bounds) => bounds.extend(&item),
            None => self.bounds = Some(Bounds::of_item(&item)),
        }
        self.font_size_sum += item.font_size;
        self.last_y = item.y;
        self.items.push(item);
    }

    /// Running average font size.
    pub fn avg_font_size(&self) -> f32 {
        if self.items.is_empty() {
            0.0
        } else {
            self.font_size_sum / self.items.len() as f32
        }
    }

    /// Top edge of the most recent item.
    pub fn last_y(&self) -> f32 {
        self.last_y
    }

    /// Current bounds.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Most recently added item.
    pub fn last_item(&self) -> Option<&TextItem> {
        self.items.last()
    }

    /// Take the accumulated items as a block, leaving the builder empty.
    pub fn finish(&mut self) -> Option<TextBlock> {
        let bounds = self.bounds.take()?;
        let font_size = self.avg_font_size();
        let items = std::mem::take(&mut self.items);
        self.font_size_sum = 0.0;
        self.last_y = 0.0;

        Some(TextBlock {
            items,
            bounds,
            block_type: BlockType::Paragraph,
            style: BlockStyle {
                font_size,
                ..Default::default()
            },
            text: String::new(),
        })
    }
}

/// Why the gap segmenter started a new block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakReason {
    /// Vertical distance beyond the block gap threshold
    VerticalGap,
    /// New line whose alignment differs from the running block
    Alignment,
    /// Font size outside the running average ratio band
    FontSize,
    /// Same-line gap wider than the configured number of spaces
    HorizontalGap,
    /// New line with no horizontal overlap with the running block
    Column,
}

/// A strategy that groups a page's items into blocks.
pub trait Segmenter: Send + Sync {
    /// Strategy name, for logs.
    fn name(&self) -> &'static str;

    /// Group items into blocks in reading order.
    ///
    /// Every input item must end up in exactly one returned block.
    fn segment(&self, items: &[TextItem], ctx: &PageContext<'_>) -> Result<Vec<TextBlock>>;
}

/// Selectable segmentation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStrategy {
    /// Gap-based clustering
    Gap,
    /// One block per visual line
    Line,
    /// Everything in one block
    Single,
}

impl SegmentStrategy {
    /// Default fallback order.
    pub const DEFAULT_ORDER: [SegmentStrategy; 3] = [
        SegmentStrategy::Gap,
        SegmentStrategy::Line,
        SegmentStrategy::Single,
    ];

    fn build(self) -> Box<dyn Segmenter> {
        match self {
            SegmentStrategy::Gap => Box::new(GapSegmenter),
            SegmentStrategy::Line => Box::new(LineSegmenter),
            SegmentStrategy::Single => Box::new(SingleBlockSegmenter),
        }
    }
}

impl std::str::FromStr for SegmentStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gap" => Ok(SegmentStrategy::Gap),
            "line" => Ok(SegmentStrategy::Line),
            "single" => Ok(SegmentStrategy::Single),
            other => Err(Error::InvalidInput(format!(
                "unknown segmentation strategy: {}",
                other
            ))),
        }
    }
}

fn check_geometry(items: &[TextItem], ctx: &PageContext<'_>) -> Result<()> {
    match items.iter().find(|i| !i.has_finite_geometry()) {
        Some(item) => Err(Error::MalformedPage {
            page: ctx.number,
            reason: format!("non-finite coordinates for {:?}", item.text),
        }),
        None => Ok(()),
    }
}

fn page_lines<'i>(items: &'i [TextItem], ctx: &PageContext<'_>) -> Vec<Vec<&'i TextItem>> {
    let tolerance = ctx
        .config
        .line_tolerance(average_font_size(items, ctx.config.default_font_size));
    group_lines(items.iter().collect(), tolerance)
}

/// Gap-based clustering, the primary strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct GapSegmenter;

impl GapSegmenter {
    /// Decide whether `item` starts a new block.
    pub fn break_reason(
        &self,
        builder: &BlockBuilder,
        item: &TextItem,
        starts_line: bool,
        ctx: &PageContext<'_>,
        assembler: &TextAssembler<'_>,
    ) -> Option<BreakReason> {
        let config = ctx.config;
        let avg = builder.avg_font_size();
        let metrics = MetricsEngine::new();

        let gap_limit = metrics.line_height(avg, false) * config.block_gap_lines;
        if item.y - builder.last_y() > gap_limit {
            return Some(BreakReason::VerticalGap);
        }

        if starts_line {
            if let Some(bounds) = builder.bounds() {
                if item.right() < bounds.left || item.x > bounds.right {
                    return Some(BreakReason::Column);
                }

                let running = geometric_alignment(&bounds, ctx.width, config);
                let alone = geometric_alignment(&Bounds::of_item(item), ctx.width, config);
                if running != alone {
                    return Some(BreakReason::Alignment);
                }
            }
        }

        if avg > 0.0
            && (item.font_size > avg * config.font_ratio_high
                || item.font_size < avg * config.font_ratio_low)
        {
            return Some(BreakReason::FontSize);
        }

        if !starts_line {
            if let Some(prev) = builder.last_item() {
                let gap = item.x - prev.right();
                if gap > config.max_same_line_gap_spaces * assembler.space_width(item) {
                    return Some(BreakReason::HorizontalGap);
                }
            }
        }

        None
    }
}

impl Segmenter for GapSegmenter {
    fn name(&self) -> &'static str {
        "gap"
    }

    fn segment(&self, items: &[TextItem], ctx: &PageContext<'_>) -> Result<Vec<TextBlock>> {
        check_geometry(items, ctx)?;

        let assembler = TextAssembler::new(ctx.config);
        let mut blocks = Vec::new();
        let mut builder = BlockBuilder::new();

        for line in page_lines(items, ctx) {
            for (idx, item) in line.into_iter().enumerate() {
                if !builder.is_empty() {
                    if let Some(reason) = self.break_reason(&builder, item, idx == 0, ctx, &assembler)
                    {
                        log::trace!(
                            "Page {}: block break before {:?} ({:?})",
                            ctx.number,
                            item.text,
                            reason
                        );
                        blocks.extend(builder.finish());
                    }
                }
                builder.push(item.clone());
            }
        }
        blocks.extend(builder.finish());

        log::debug!(
            "Page {}: gap segmentation produced {} blocks from {} items",
            ctx.number,
            blocks.len(),
            items.len()
        );
        Ok(blocks)
    }
}

/// One block per visual line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineSegmenter;

impl Segmenter for LineSegmenter {
    fn name(&self) -> &'static str {
        "line"
    }

    fn segment(&self, items: &[TextItem], ctx: &PageContext<'_>) -> Result<Vec<TextBlock>> {
        check_geometry(items, ctx)?;

        Ok(page_lines(items, ctx)
            .into_iter()
            .filter_map(|line| {
                let mut builder = BlockBuilder::new();
                for item in line {
                    builder.push(item.clone());
                }
                builder.finish()
            })
            .collect())
    }
}

/// All items in a single block.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleBlockSegmenter;

impl Segmenter for SingleBlockSegmenter {
    fn name(&self) -> &'static str {
        "single"
    }

    fn segment(&self, items: &[TextItem], ctx: &PageContext<'_>) -> Result<Vec<TextBlock>> {
        let mut builder = BlockBuilder::new();
        for line in page_lines(items, ctx) {
            for item in line {
                builder.push(item.clone());
            }
        }
        Ok(builder.finish().into_iter().collect())
    }
}

/// Strategies tried in order until one yields blocks.
pub struct SegmentationChain {
    strategies: Vec<Box<dyn Segmenter>>,
}

impl SegmentationChain {
    /// Build a chain from strategy names.
    pub fn from_strategies(strategies: &[SegmentStrategy]) -> Self {
        Self {
            strategies: strategies.iter().map(|s| s.build()).collect(),
        }
    }

    /// Build a chain from custom segmenters.
    pub fn with_segmenters(strategies: Vec<Box<dyn Segmenter>>) -> Self {
        Self { strategies }
    }

    /// Number of strategies.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Check if the chain has no strategies.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run the strategies in order and return the first non-empty result.
    ///
    /// Failed strategies are logged and skipped. When every strategy fails
    /// the last error is returned; when all succeed without blocks the
    /// result is empty.
    pub fn segment(&self, items: &[TextItem], ctx: &PageContext<'_>) -> Result<Vec<TextBlock>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut last_error = None;
        for strategy in &self.strategies {
            match strategy.segment(items, ctx) {
                Ok(blocks) if !blocks.is_empty() => return Ok(blocks),
                Ok(_) => {
                    log::debug!(
                        "Page {}: {} segmentation found no blocks",
                        ctx.number,
                        strategy.name()
                    );
                }
                Err(e) => {
                    log::debug!(
                        "Page {}: {} segmentation failed: {}",
                        ctx.number,
                        strategy.name(),
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(Vec::new()),
        }
    }
}

impl Default for SegmentationChain {
    fn default() -> Self {
        Self::from_strategies(&SegmentStrategy::DEFAULT_ORDER)
    }
}

impl std::fmt::Debug for SegmentationChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.strategies.iter().map(|s| s.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutConfig;

    fn item(text: &str, x: f32, y: f32, width: f32, size: f32) -> TextItem {
        let mut item = TextItem::new(text, x, y, size, "Arial").with_width(width);
        item.height = size;
        item.space_width = size * 0.278;
        item
    }

    fn ctx(config: &LayoutConfig) -> PageContext<'_> {
        PageContext {
            number: 1,
            width: 612.0,
            height: 792.0,
            config,
        }
    }

    #[test]
    fn test_same_line_items_form_one_block() {
        let config = LayoutConfig::default();
        let items = vec![
            item("alpha", 50.0, 100.0, 100.0, 12.0),
            item("beta", 150.0, 100.0, 100.0, 12.0),
            item("gamma", 250.0, 100.0, 100.0, 12.0),
        ];
        let blocks = GapSegmenter.segment(&items, &ctx(&config)).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].items.len(), 3);
        assert_eq!(blocks[0].bounds.left, 50.0);
    }

    #[test]
    fn test_vertical_gap_breaks_block() {
        let config = LayoutConfig::default();
        let items = vec![
            item("first", 72.0, 100.0, 40.0, 12.0),
            item("second", 72.0, 114.0, 40.0, 12.0),
            item("far", 72.0, 200.0, 40.0, 12.0),
        ];
        let blocks = GapSegmenter.segment(&items, &ctx(&config)).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].items.len(), 2);
    }

    #[test]
    fn test_font_size_breaks_block() {
        let config = LayoutConfig::default();
        let items = vec![
            item("Title", 72.0, 100.0, 60.0, 24.0),
            item("body", 72.0, 130.0, 40.0, 12.0),
        ];
        let blocks = GapSegmenter.segment(&items, &ctx(&config)).unwrap();
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_wide_same_line_gap_breaks_block() {
        let config = LayoutConfig::default();
        let items = vec![
            item("left", 72.0, 100.0, 30.0, 12.0),
            item("right", 300.0, 100.0, 30.0, 12.0),
        ];
        let blocks = GapSegmenter.segment(&items, &ctx(&config)).unwrap();
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_two_columns_stay_apart() {
        let config = LayoutConfig::default();
        let items = vec![
            item("Left0", 72.0, 100.0, 200.0, 12.0),
            item("Right0", 320.0, 100.0, 200.0, 12.0),
            item("Left1", 72.0, 114.0, 200.0, 12.0),
            item("Right1", 320.0, 114.0, 200.0, 12.0),
        ];
        let blocks = GapSegmenter.segment(&items, &ctx(&config)).unwrap();

        for block in &blocks {
            let left = block.items.iter().any(|i| i.text.starts_with("Left"));
            let right = block.items.iter().any(|i| i.text.starts_with("Right"));
            assert!(!(left && right), "mixed columns: {:?}", block.text);
        }
        assert_eq!(blocks.iter().map(|b| b.items.len()).sum::<usize>(), 4);
    }

    #[test]
    fn test_indented_first_line_continues_block() {
        let config = LayoutConfig::default();
        let items = vec![
            item("Indented opening line", 108.0, 100.0, 400.0, 12.0),
            item("wrapped continuation", 72.0, 114.0, 436.0, 12.0),
        ];
        let blocks = GapSegmenter.segment(&items, &ctx(&config)).unwrap();
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_reading_order_top_first() {
        let config = LayoutConfig::default();
        let items = vec![
            item("second", 72.0, 300.0, 40.0, 12.0),
            item("first", 72.0, 100.0, 40.0, 12.0),
        ];
        let blocks = LineSegmenter.segment(&items, &ctx(&config)).unwrap();
        assert_eq!(blocks[0].items[0].text, "first");
        assert_eq!(blocks[1].items[0].text, "second");
    }

    #[test]
    fn test_split_regions() {
        let config = LayoutConfig::default();
        let items = vec![
            item("header", 72.0, 30.0, 40.0, 10.0),
            item("body", 72.0, 300.0, 40.0, 12.0),
            item("footer", 72.0, 760.0, 40.0, 10.0),
        ];
        let regions = split_regions(items, &ctx(&config));
        assert_eq!(regions.header.len(), 1);
        assert_eq!(regions.body.len(), 1);
        assert_eq!(regions.footer.len(), 1);
    }

    #[test]
    fn test_chain_falls_back_on_error() {
        struct Failing;
        impl Segmenter for Failing {
            fn name(&self) -> &'static str {
                "failing"
            }
            fn segment(&self, _: &[TextItem], ctx: &PageContext<'_>) -> Result<Vec<TextBlock>> {
                Err(Error::MalformedPage {
                    page: ctx.number,
                    reason: "test".to_string(),
                })
            }
        }

        let config = LayoutConfig::default();
        let chain = SegmentationChain::with_segmenters(vec![
            Box::new(Failing),
            Box::new(SingleBlockSegmenter),
        ]);
        let items = vec![
            item("a", 72.0, 100.0, 10.0, 12.0),
            item("b", 72.0, 400.0, 10.0, 12.0),
        ];
        let blocks = chain.segment(&items, &ctx(&config)).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].items.len(), 2);
    }

    #[test]
    fn test_chain_empty_input() {
        let config = LayoutConfig::default();
        let blocks = SegmentationChain::default()
            .segment(&[], &ctx(&config))
            .unwrap();
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("gap".parse::<SegmentStrategy>().unwrap(), SegmentStrategy::Gap);
        assert!("bogus".parse::<SegmentStrategy>().is_err());
    }
}
