//! Plain text export.

use crate::error::Result;
use crate::model::DocumentStructure;

use super::{body_elements, BodyElement, RenderOptions};

const EMPTY_TEXT: &str = "No text content found.";

/// Convert a document structure to plain text.
///
/// Each page with text starts with a `PAGE N` banner. Tables are written as
/// tab-separated rows.
pub fn to_text(doc: &DocumentStructure, options: &RenderOptions) -> Result<String> {
    let rule = "=".repeat(50);
    let mut sections = Vec::new();

    for page in doc
        .pages
        .iter()
        .filter(|p| options.page_selection.includes(p.number))
    {
        let mut parts: Vec<String> = Vec::new();

        if options.include_headers_footers {
            parts.extend(page.headers.iter().map(|b| b.text.clone()));
        }
        for element in body_elements(page) {
            match element {
                BodyElement::Block(block) => parts.push(block.text.clone()),
                BodyElement::Table(table) => parts.push(table.plain_text()),
                BodyElement::Image(..) => {}
            }
        }
        if options.include_headers_footers {
            parts.extend(page.footers.iter().map(|b| b.text.clone()));
        }

        parts.retain(|p| !p.trim().is_empty());
        if parts.is_empty() {
            continue;
        }

        sections.push(format!(
            "{rule}\nPAGE {}\n{rule}\n\n{}",
            page.number,
            parts.join("\n\n")
        ));
    }

    Ok(collapse_blank_lines(&sections.join("\n\n")))
}

/// Trim trailing spaces and collapse runs of blank lines into one.
fn collapse_blank_lines(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim_end) {
        if line.is_empty() && lines.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }

    let result = lines.join("\n").trim().to_string();
    if result.is_empty() {
        EMPTY_TEXT.to_string()
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockType, Bounds, PageStructure, TableData, TableRow, TextBlock};

    fn block(text: &str, top: f32) -> TextBlock {
        TextBlock {
            items: Vec::new(),
            bounds: Bounds {
                left: 72.0,
                top,
                right: 300.0,
                bottom: top + 12.0,
            },
            block_type: BlockType::Paragraph,
            style: Default::default(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_to_text_banners_and_tables() {
        let mut page = PageStructure::empty(1, 612.0, 792.0);
        page.blocks.push(block("Hello, world!", 100.0));
        page.blocks.push(block("After the table.", 400.0));

        let mut table = TableData::new();
        table.add_row(TableRow::from_strings(["a", "b"]));
        table.bounds.top = 200.0;
        page.tables.push(table);

        let mut doc = DocumentStructure::default();
        doc.pages.push(page);
        doc.pages.push(PageStructure::empty(2, 612.0, 792.0));

        let result = to_text(&doc, &RenderOptions::default()).unwrap();
        assert!(result.starts_with("=========="));
        assert!(result.contains("PAGE 1"));
        assert!(!result.contains("PAGE 2"));

        let hello = result.find("Hello").unwrap();
        let table = result.find("a\tb").unwrap();
        let after = result.find("After").unwrap();
        assert!(hello < table && table < after);
    }

    #[test]
    fn test_headers_can_be_dropped() {
        let mut page = PageStructure::empty(1, 612.0, 792.0);
        page.headers.push(block("Running title", 20.0));
        page.blocks.push(block("Body", 100.0));
        let mut doc = DocumentStructure::default();
        doc.pages.push(page);

        let with = to_text(&doc, &RenderOptions::default()).unwrap();
        assert!(with.contains("Running title"));

        let without = to_text(&doc, &RenderOptions::default().with_headers_footers(false)).unwrap();
        assert!(!without.contains("Running title"));
    }

    #[test]
    fn test_empty_document() {
        let result = to_text(&DocumentStructure::default(), &RenderOptions::default()).unwrap();
        assert_eq!(result, "No text content found.");
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a  \n\n\n\nb\n"), "a\n\nb");
    }
}
