//! Rendering module for converting reconstructed structure to output formats.

pub mod docx;
mod json;
mod options;
mod text;

use std::cmp::Ordering;

use crate::model::{ImagePlaceholder, PageStructure, TableData, TextBlock};

pub use docx::{to_docx, DocxWriter};
pub use json::{to_json, JsonFormat};
pub use options::{PageSelection, RenderOptions};
pub use text::to_text;

/// One element of a page body in reading order.
#[derive(Debug, Clone, Copy)]
pub enum BodyElement<'a> {
    /// A classified text block
    Block(&'a TextBlock),
    /// A table carved out by the table inferencer
    Table(&'a TableData),
    /// An image placeholder
    Image(&'a ImagePlaceholder),
}

impl BodyElement<'_> {
    /// Top edge of the element.
    pub fn top(&self) -> f32 {
        match self {
            BodyElement::Block(b) => b.bounds.top,
            BodyElement::Table(t) => t.bounds.top,
            BodyElement::Image(i) => i.y,
        }
    }

    /// Bottom edge of the element.
    pub fn bottom(&self) -> f32 {
        match self {
            BodyElement::Block(b) => b.bounds.bottom,
            BodyElement::Table(t) => t.bounds.bottom,
            BodyElement::Image(i) => i.y + i.height,
        }
    }
}

/// Body blocks, tables and images of a page interleaved by their top y.
///
/// The sort is stable, so elements with the same top keep blocks before
/// tables before images.
pub fn body_elements(page: &PageStructure) -> Vec<BodyElement<'_>> {
    let mut elements: Vec<BodyElement<'_>> = page
        .blocks
        .iter()
        .map(BodyElement::Block)
        .chain(page.tables.iter().map(BodyElement::Table))
        .chain(page.images.iter().map(BodyElement::Image))
        .collect();
    elements.sort_by(|a, b| a.top().partial_cmp(&b.top()).unwrap_or(Ordering::Equal));
    elements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockType, Bounds};

    #[test]
    fn test_body_elements_interleave_by_top() {
        let mut page = PageStructure::empty(1, 612.0, 792.0);
        for top in [100.0, 500.0] {
            page.blocks.push(TextBlock {
                items: Vec::new(),
                bounds: Bounds {
                    top,
                    bottom: top + 12.0,
                    ..Default::default()
                },
                block_type: BlockType::Paragraph,
                style: Default::default(),
                text: String::new(),
            });
        }
        let mut table = TableData::new();
        table.bounds.top = 300.0;
        page.tables.push(table);
        page.images.push(ImagePlaceholder {
            y: 50.0,
            ..Default::default()
        });

        let tops: Vec<f32> = body_elements(&page).iter().map(|e| e.top()).collect();
        assert_eq!(tops, vec![50.0, 100.0, 300.0, 500.0]);
        assert!(matches!(body_elements(&page)[2], BodyElement::Table(_)));
    }
}
