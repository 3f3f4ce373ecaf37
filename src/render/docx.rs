//! DOCX serialization.
//!
//! Writes a minimal WordprocessingML package: content types, package and
//! document relationships, core and app properties, styles, bullet
//! numbering and the document body. Every part is generated with the
//! `quick-xml` event writer and stored deflated in a `zip` container.
//!
//! # Layout approximation
//!
//! - Spacing-before comes from the vertical gap to the previous element
//!   minus one line height.
//! - Wide intra-line gaps become left tab stops at the item's x position,
//!   measured from the page's text edge.
//! - List level comes from the indent relative to the page's text edge.

use std::io::{Cursor, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::layout::classifier::strip_bullet;
use crate::layout::style::DEFAULT_FAMILY;
use crate::layout::text::{average_font_size, group_lines, TextAssembler};
use crate::layout::{CleanupOptions, CleanupPipeline, LayoutConfig, MetricsEngine, TableInferencer};
use crate::model::{
    Alignment, BlockType, Color, DocumentStructure, PageStructure, TableData, TextBlock, TextItem,
};

use super::{body_elements, BodyElement, RenderOptions};

const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const PACKAGE_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const OFFICE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const TWIPS_PER_POINT: f32 = 20.0;
const PAGE_MARGIN_TWIPS: u32 = 1440;
const MAX_SPACING_BEFORE_PT: f32 = 72.0;
const MIN_INDENT_PT: f32 = 2.0;
const LIST_INDENT_STEP_PT: f32 = 50.0;
const MAX_LIST_LEVEL: u8 = 4;
const BULLET_NUM_ID: &str = "1";
const BULLETS: [&str; 5] = ["•", "◦", "▪", "•", "◦"];

const NOTE_HALF_POINTS: u32 = 18;
const MARKER_COLOR: Color = Color::rgb(0x80, 0x80, 0x80);

/// Convert a document structure to DOCX bytes with default thresholds.
pub fn to_docx(doc: &DocumentStructure, options: &RenderOptions) -> Result<Vec<u8>> {
    let config = LayoutConfig::default();
    DocxWriter::new(options, &config).write(doc)
}

/// Heading level for a dominant font size: 18pt and up is level 1, then
/// 16pt, 14pt and everything smaller at level 4.
pub fn heading_level(font_size: f32) -> u8 {
    if font_size >= 18.0 {
        1
    } else if font_size >= 16.0 {
        2
    } else if font_size >= 14.0 {
        3
    } else {
        4
    }
}

/// Bullet level for an indent measured from the page's text edge.
pub fn list_level(indent: f32) -> u8 {
    ((indent.max(0.0) / LIST_INDENT_STEP_PT).floor() as u8).min(MAX_LIST_LEVEL)
}

fn twips(points: f32) -> u32 {
    (points.max(0.0) * TWIPS_PER_POINT).round() as u32
}

fn half_points(font_size: f32, cap: f32) -> u32 {
    (font_size.min(cap).max(1.0) * 2.0).round() as u32
}

/// Formatting that splits runs.
#[derive(Debug, Clone, PartialEq)]
struct RunProps {
    bold: bool,
    italic: bool,
    half_points: u32,
    color: Color,
    family: String,
}

impl RunProps {
    fn of(item: &TextItem, cap: f32) -> Self {
        Self {
            bold: item.bold,
            italic: item.italic,
            half_points: half_points(item.font_size, cap),
            color: item.color,
            family: item.family().to_string(),
        }
    }

    fn note(italic: bool, color: Color) -> Self {
        Self {
            bold: false,
            italic,
            half_points: NOTE_HALF_POINTS,
            color,
            family: DEFAULT_FAMILY.to_string(),
        }
    }
}

/// A style run. Tab characters in `text` become `w:tab` elements.
#[derive(Debug, Clone)]
struct Run {
    text: String,
    props: RunProps,
}

#[derive(Debug, Default)]
struct ParagraphProps {
    style: Option<String>,
    list_level: Option<u8>,
    tabs: Vec<u32>,
    before: u32,
    indent: u32,
    alignment: Alignment,
}

/// Thin wrapper over the quick-xml event writer.
struct Xml {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl Xml {
    fn new() -> Result<Self> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(Self { writer })
    }

    fn start(name: &str, attrs: &[(&str, &str)]) -> BytesStart<'static> {
        let mut start = BytesStart::new(name.to_string());
        for &attr in attrs {
            start.push_attribute(attr);
        }
        start
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.writer.write_event(Event::Start(Self::start(name, attrs)))?;
        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.writer.write_event(Event::Empty(Self::start(name, attrs)))?;
        Ok(())
    }

    fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.open(name, attrs)?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.close(name)
    }

    fn into_bytes(self) -> Vec<u8> {
        self.writer.into_inner().into_inner()
    }
}

/// Writes a [`DocumentStructure`] as a DOCX package.
#[derive(Debug, Clone)]
pub struct DocxWriter<'a> {
    options: &'a RenderOptions,
    config: &'a LayoutConfig,
    metrics: MetricsEngine,
    fragment_cleanup: CleanupPipeline,
    timestamp: DateTime<Utc>,
}

impl<'a> DocxWriter<'a> {
    /// Create a writer stamped with the current time.
    pub fn new(options: &'a RenderOptions, config: &'a LayoutConfig) -> Self {
        let fragment_cleanup = CleanupPipeline::new(CleanupOptions {
            remove_replacement_char: true,
            remove_pua: true,
            ..CleanupOptions::minimal()
        });
        Self {
            options,
            config,
            metrics: MetricsEngine::new(),
            fragment_cleanup,
            timestamp: Utc::now(),
        }
    }

    /// Use a fixed creation time for `docProps/core.xml`.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Serialize the document into DOCX bytes.
    pub fn write(&self, doc: &DocumentStructure) -> Result<Vec<u8>> {
        let pages: Vec<&PageStructure> = doc
            .pages
            .iter()
            .filter(|p| self.options.page_selection.includes(p.number))
            .collect();
        log::debug!("Writing DOCX package for {} pages", pages.len());

        let parts = [
            ("[Content_Types].xml", content_types_xml()?),
            ("_rels/.rels", package_rels_xml()?),
            ("docProps/core.xml", self.core_xml(doc)?),
            ("docProps/app.xml", app_xml(pages.len())?),
            ("word/_rels/document.xml.rels", document_rels_xml()?),
            ("word/styles.xml", self.styles_xml()?),
            ("word/numbering.xml", numbering_xml()?),
            ("word/document.xml", self.document_xml(&pages)?),
        ];

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let file_options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, bytes) in parts {
            zip.start_file(name, file_options)?;
            zip.write_all(&bytes)?;
        }
        Ok(zip.finish()?.into_inner())
    }

    fn core_xml(&self, doc: &DocumentStructure) -> Result<Vec<u8>> {
        let stamp = self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut xml = Xml::new()?;
        xml.open(
            "cp:coreProperties",
            &[
                (
                    "xmlns:cp",
                    "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
                ),
                ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
                ("xmlns:dcterms", "http://purl.org/dc/terms/"),
                ("xmlns:dcmitype", "http://purl.org/dc/dcmitype/"),
                ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
            ],
        )?;
        for (name, value) in [
            ("dc:title", &doc.title),
            ("dc:subject", &doc.subject),
            ("dc:creator", &doc.author),
            ("cp:keywords", &doc.keywords),
        ] {
            if !value.trim().is_empty() {
                xml.text_element(name, &[], value.trim())?;
            }
        }
        for name in ["dcterms:created", "dcterms:modified"] {
            xml.text_element(name, &[("xsi:type", "dcterms:W3CDTF")], &stamp)?;
        }
        xml.close("cp:coreProperties")?;
        Ok(xml.into_bytes())
    }

    fn styles_xml(&self) -> Result<Vec<u8>> {
        let mut xml = Xml::new()?;
        xml.open("w:styles", &[("xmlns:w", WORD_NS)])?;

        xml.open("w:docDefaults", &[])?;
        xml.open("w:rPrDefault", &[])?;
        xml.open("w:rPr", &[])?;
        xml.empty(
            "w:rFonts",
            &[
                ("w:ascii", DEFAULT_FAMILY),
                ("w:hAnsi", DEFAULT_FAMILY),
                ("w:cs", DEFAULT_FAMILY),
            ],
        )?;
        xml.empty("w:sz", &[("w:val", "22")])?;
        xml.empty("w:szCs", &[("w:val", "22")])?;
        xml.close("w:rPr")?;
        xml.close("w:rPrDefault")?;
        xml.open("w:pPrDefault", &[])?;
        xml.open("w:pPr", &[])?;
        self.spacing(&mut xml, 0)?;
        xml.close("w:pPr")?;
        xml.close("w:pPrDefault")?;
        xml.close("w:docDefaults")?;

        xml.open(
            "w:style",
            &[("w:type", "paragraph"), ("w:default", "1"), ("w:styleId", "Normal")],
        )?;
        xml.empty("w:name", &[("w:val", "Normal")])?;
        xml.empty("w:qFormat", &[])?;
        xml.close("w:style")?;

        for (level, size) in [(1u8, "36"), (2, "32"), (3, "28"), (4, "24")] {
            let id = format!("Heading{}", level);
            let name = format!("heading {}", level);
            let outline = (level - 1).to_string();
            xml.open("w:style", &[("w:type", "paragraph"), ("w:styleId", &id)])?;
            xml.empty("w:name", &[("w:val", &name)])?;
            xml.empty("w:basedOn", &[("w:val", "Normal")])?;
            xml.empty("w:next", &[("w:val", "Normal")])?;
            xml.empty("w:qFormat", &[])?;
            xml.open("w:pPr", &[])?;
            xml.empty("w:keepNext", &[])?;
            xml.empty("w:spacing", &[("w:before", "240"), ("w:after", "120")])?;
            xml.empty("w:outlineLvl", &[("w:val", &outline)])?;
            xml.close("w:pPr")?;
            xml.open("w:rPr", &[])?;
            xml.empty("w:b", &[])?;
            xml.empty("w:sz", &[("w:val", size)])?;
            xml.close("w:rPr")?;
            xml.close("w:style")?;
        }

        xml.open("w:style", &[("w:type", "paragraph"), ("w:styleId", "ListParagraph")])?;
        xml.empty("w:name", &[("w:val", "List Paragraph")])?;
        xml.empty("w:basedOn", &[("w:val", "Normal")])?;
        xml.empty("w:qFormat", &[])?;
        xml.open("w:pPr", &[])?;
        xml.empty("w:ind", &[("w:left", "720")])?;
        xml.empty("w:contextualSpacing", &[])?;
        xml.close("w:pPr")?;
        xml.close("w:style")?;

        xml.open("w:style", &[("w:type", "paragraph"), ("w:styleId", "Caption")])?;
        xml.empty("w:name", &[("w:val", "caption")])?;
        xml.empty("w:basedOn", &[("w:val", "Normal")])?;
        xml.empty("w:qFormat", &[])?;
        xml.open("w:rPr", &[])?;
        xml.empty("w:i", &[])?;
        xml.empty("w:sz", &[("w:val", "18")])?;
        xml.close("w:rPr")?;
        xml.close("w:style")?;

        xml.open("w:style", &[("w:type", "table"), ("w:styleId", "TableGrid")])?;
        xml.empty("w:name", &[("w:val", "Table Grid")])?;
        xml.open("w:tblPr", &[])?;
        xml.open("w:tblBorders", &[])?;
        for edge in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
            xml.empty(
                edge,
                &[("w:val", "single"), ("w:sz", "4"), ("w:space", "0"), ("w:color", "auto")],
            )?;
        }
        xml.close("w:tblBorders")?;
        xml.close("w:tblPr")?;
        xml.close("w:style")?;

        xml.close("w:styles")?;
        Ok(xml.into_bytes())
    }

    fn document_xml(&self, pages: &[&PageStructure]) -> Result<Vec<u8>> {
        let mut xml = Xml::new()?;
        xml.open("w:document", &[("xmlns:w", WORD_NS)])?;
        xml.open("w:body", &[])?;

        let mut image_count = 0usize;
        for (index, page) in pages.iter().enumerate() {
            if index > 0 && self.options.page_breaks {
                xml.open("w:p", &[])?;
                xml.open("w:r", &[])?;
                xml.empty("w:br", &[("w:type", "page")])?;
                xml.close("w:r")?;
                xml.close("w:p")?;
            }
            if self.options.page_markers {
                let marker = format!("--- Page {} ---", page.number);
                self.note(&mut xml, &marker, RunProps::note(false, MARKER_COLOR))?;
            }
            self.page(&mut xml, page, &mut image_count)?;
        }

        let (width, height) = pages
            .first()
            .map(|p| (p.width, p.height))
            .unwrap_or((612.0, 792.0));
        let margin = PAGE_MARGIN_TWIPS.to_string();
        xml.open("w:sectPr", &[])?;
        xml.empty(
            "w:pgSz",
            &[("w:w", &twips(width).to_string()), ("w:h", &twips(height).to_string())],
        )?;
        xml.empty(
            "w:pgMar",
            &[
                ("w:top", &margin),
                ("w:right", &margin),
                ("w:bottom", &margin),
                ("w:left", &margin),
                ("w:header", "720"),
                ("w:footer", "720"),
                ("w:gutter", "0"),
            ],
        )?;
        xml.close("w:sectPr")?;

        xml.close("w:body")?;
        xml.close("w:document")?;
        Ok(xml.into_bytes())
    }

    fn page(&self, xml: &mut Xml, page: &PageStructure, image_count: &mut usize) -> Result<()> {
        let edge = text_edge(page);

        if self.options.include_headers_footers {
            for block in page.headers.iter().filter(|b| !b.is_empty()) {
                self.paragraph(xml, block, edge, None)?;
            }
        }

        let mut prev_bottom = None;
        for element in body_elements(page) {
            match element {
                BodyElement::Block(block) if block.is_empty() => continue,
                BodyElement::Block(block) if block.block_type == BlockType::Table => {
                    let table = TableInferencer::new(self.config).reconstruct(block.items.clone());
                    if table.column_count >= 2 {
                        self.table(xml, &table, page.width)?;
                    } else {
                        self.paragraph(xml, block, edge, prev_bottom)?;
                    }
                }
                BodyElement::Block(block) => self.paragraph(xml, block, edge, prev_bottom)?,
                BodyElement::Table(table) => self.table(xml, table, page.width)?,
                BodyElement::Image(_) => {
                    *image_count += 1;
                    if self.options.image_placeholders {
                        let text = format!("[Image {}]", image_count);
                        self.note(xml, &text, RunProps::note(true, Color::BLACK))?;
                    }
                }
            }
            prev_bottom = Some(element.bottom());
        }

        if self.options.include_headers_footers {
            for block in page.footers.iter().filter(|b| !b.is_empty()) {
                self.paragraph(xml, block, edge, None)?;
            }
        }
        Ok(())
    }

    fn paragraph(
        &self,
        xml: &mut Xml,
        block: &TextBlock,
        edge: f32,
        prev_bottom: Option<f32>,
    ) -> Result<()> {
        let is_heading = block.block_type == BlockType::Heading;
        let relative_indent = block.style.indent - edge;

        let mut props = ParagraphProps {
            alignment: block.style.alignment,
            ..Default::default()
        };

        if let (true, Some(prev)) = (self.options.layout_spacing, prev_bottom) {
            let line = self.metrics.line_height(block.style.font_size, is_heading);
            let extra = (block.bounds.top - prev - line).clamp(0.0, MAX_SPACING_BEFORE_PT);
            props.before = twips(extra);
        }

        let (mut runs, tabs) = self.runs(block, edge);
        if runs.len() == 1 && tabs.is_empty() {
            runs[0].text = block.text.clone();
        } else if self.options.tab_stops {
            props.tabs = tabs;
        }

        match block.block_type {
            BlockType::Heading => {
                props.style = Some(format!("Heading{}", heading_level(block.style.font_size)));
            }
            BlockType::Caption => props.style = Some("Caption".to_string()),
            BlockType::List => {
                props.style = Some("ListParagraph".to_string());
                if strip_leading_bullet(&mut runs) {
                    props.list_level = Some(list_level(relative_indent));
                } else {
                    props.indent = twips(relative_indent);
                }
            }
            _ => {
                let flush = matches!(block.style.alignment, Alignment::Left | Alignment::Justify);
                if flush && relative_indent > MIN_INDENT_PT {
                    props.indent = twips(relative_indent);
                }
            }
        }

        xml.open("w:p", &[])?;
        self.paragraph_props(xml, &props)?;
        for run in &runs {
            write_run(xml, run)?;
        }
        xml.close("w:p")
    }

    /// Style runs of a block, plus tab stop positions in twips.
    fn runs(&self, block: &TextBlock, edge: f32) -> (Vec<Run>, Vec<u32>) {
        let cap = self.options.max_font_size;
        let assembler = TextAssembler::new(self.config);
        let tolerance = self
            .config
            .line_tolerance(average_font_size(&block.items, self.config.default_font_size));
        let lines = group_lines(block.items.iter().collect::<Vec<_>>(), tolerance);

        let mut runs: Vec<Run> = Vec::new();
        let mut tabs: Vec<u32> = Vec::new();

        for (line_index, line) in lines.iter().enumerate() {
            let mut estimated_end = line.first().map(|i| i.x).unwrap_or(edge);

            for (index, &item) in line.iter().enumerate() {
                let text = self.fragment_text(&item.text);
                if text.is_empty() {
                    continue;
                }

                let separator = if index == 0 {
                    match runs.last_mut() {
                        Some(last) if line_index > 0 => {
                            if ends_with_hyphen(&last.text) && text.starts_with(char::is_lowercase) {
                                last.text.pop();
                                String::new()
                            } else {
                                " ".to_string()
                            }
                        }
                        _ => String::new(),
                    }
                } else {
                    let prev = line[index - 1];
                    let wide = assembler.gap_in_spaces(prev, item) > self.config.triple_space_gap;
                    if self.options.tab_stops
                        && wide
                        && item.x > estimated_end + assembler.space_width(item)
                        && item.x > edge
                    {
                        tabs.push(twips(item.x - edge));
                        "\t".to_string()
                    } else {
                        " ".repeat(assembler.spaces_between(prev, item))
                    }
                };

                let family = item.family();
                estimated_end = if separator == "\t" {
                    item.x + self.metrics.text_width(&text, item.font_size, family)
                } else {
                    estimated_end
                        + self
                            .metrics
                            .text_width(&format!("{}{}", separator, text), item.font_size, family)
                };

                if let Some(last) = runs.last_mut() {
                    last.text.push_str(&separator);
                }

                let props = RunProps::of(item, cap);
                match runs.last_mut() {
                    Some(last) if last.props == props => last.text.push_str(&text),
                    _ => runs.push(Run { text, props }),
                }
            }
        }

        tabs.sort_unstable();
        tabs.dedup();
        (runs, tabs)
    }

    /// Item text with character-level cleanup, keeping edge whitespace.
    fn fragment_text(&self, text: &str) -> String {
        let core = self.fragment_cleanup.process(text);
        if core.is_empty() {
            return core;
        }
        let mut out = String::with_capacity(core.len() + 2);
        if text.starts_with(char::is_whitespace) {
            out.push(' ');
        }
        out.push_str(&core);
        if text.ends_with(char::is_whitespace) {
            out.push(' ');
        }
        out
    }

    fn paragraph_props(&self, xml: &mut Xml, props: &ParagraphProps) -> Result<()> {
        xml.open("w:pPr", &[])?;
        if let Some(style) = &props.style {
            xml.empty("w:pStyle", &[("w:val", style)])?;
        }
        if let Some(level) = props.list_level {
            xml.open("w:numPr", &[])?;
            xml.empty("w:ilvl", &[("w:val", &level.to_string())])?;
            xml.empty("w:numId", &[("w:val", BULLET_NUM_ID)])?;
            xml.close("w:numPr")?;
        }
        if !props.tabs.is_empty() {
            xml.open("w:tabs", &[])?;
            for pos in &props.tabs {
                xml.empty("w:tab", &[("w:val", "left"), ("w:pos", &pos.to_string())])?;
            }
            xml.close("w:tabs")?;
        }
        self.spacing(xml, props.before)?;
        if props.indent > 0 {
            xml.empty("w:ind", &[("w:left", &props.indent.to_string())])?;
        }
        xml.empty("w:jc", &[("w:val", justification(props.alignment))])?;
        xml.close("w:pPr")
    }

    fn spacing(&self, xml: &mut Xml, before: u32) -> Result<()> {
        let after = twips(self.options.space_after_pt).to_string();
        let line = ((self.options.line_spacing * 240.0).round() as u32).to_string();
        let before = before.to_string();
        xml.empty(
            "w:spacing",
            &[
                ("w:before", &before),
                ("w:after", &after),
                ("w:line", &line),
                ("w:lineRule", "auto"),
            ],
        )
    }

    /// A centered single-run paragraph for page markers and image placeholders.
    fn note(&self, xml: &mut Xml, text: &str, props: RunProps) -> Result<()> {
        xml.open("w:p", &[])?;
        self.paragraph_props(
            xml,
            &ParagraphProps {
                alignment: Alignment::Center,
                ..Default::default()
            },
        )?;
        write_run(
            xml,
            &Run {
                text: text.to_string(),
                props,
            },
        )?;
        xml.close("w:p")
    }

    fn table(&self, xml: &mut Xml, table: &TableData, page_width: f32) -> Result<()> {
        if table.is_empty() || table.column_count == 0 {
            return Ok(());
        }
        let cap = self.options.max_font_size;
        let content_width = twips(page_width).saturating_sub(2 * PAGE_MARGIN_TWIPS).max(1440);
        let column_width = content_width / table.column_count as u32;
        let column_width_str = column_width.to_string();

        xml.open("w:tbl", &[])?;
        xml.open("w:tblPr", &[])?;
        xml.empty("w:tblStyle", &[("w:val", "TableGrid")])?;
        xml.empty("w:tblW", &[("w:w", "0"), ("w:type", "auto")])?;
        xml.close("w:tblPr")?;

        xml.open("w:tblGrid", &[])?;
        for _ in 0..table.column_count {
            xml.empty("w:gridCol", &[("w:w", &column_width_str)])?;
        }
        xml.close("w:tblGrid")?;

        for row in &table.rows {
            xml.open("w:tr", &[])?;
            let missing = table.column_count.saturating_sub(row.span_width());
            if missing > 0 || row.is_header {
                xml.open("w:trPr", &[])?;
                if missing > 0 {
                    xml.empty("w:gridAfter", &[("w:val", &missing.to_string())])?;
                }
                if row.is_header {
                    xml.empty("w:tblHeader", &[])?;
                }
                xml.close("w:trPr")?;
            }

            for cell in &row.cells {
                let span = cell.column_span.max(1);
                xml.open("w:tc", &[])?;
                xml.open("w:tcPr", &[])?;
                xml.empty(
                    "w:tcW",
                    &[("w:w", &(column_width * span as u32).to_string()), ("w:type", "dxa")],
                )?;
                if span > 1 {
                    xml.empty("w:gridSpan", &[("w:val", &span.to_string())])?;
                }
                xml.close("w:tcPr")?;

                xml.open("w:p", &[])?;
                xml.open("w:pPr", &[])?;
                xml.empty("w:spacing", &[("w:after", "0")])?;
                xml.empty("w:jc", &[("w:val", justification(cell.alignment))])?;
                xml.close("w:pPr")?;
                let text = cell.text.trim();
                if !text.is_empty() {
                    let size = if cell.font_size > 0.0 {
                        cell.font_size
                    } else {
                        self.config.default_font_size
                    };
                    write_run(
                        xml,
                        &Run {
                            text: text.to_string(),
                            props: RunProps {
                                bold: cell.bold || row.is_header,
                                italic: false,
                                half_points: half_points(size, cap),
                                color: Color::BLACK,
                                family: DEFAULT_FAMILY.to_string(),
                            },
                        },
                    )?;
                }
                xml.close("w:p")?;
                xml.close("w:tc")?;
            }
            xml.close("w:tr")?;
        }
        xml.close("w:tbl")
    }
}

/// Leftmost body edge of a page, the origin for indents and tab stops.
fn text_edge(page: &PageStructure) -> f32 {
    let edge = page
        .blocks
        .iter()
        .map(|b| b.bounds.left)
        .chain(page.tables.iter().map(|t| t.bounds.left))
        .fold(f32::INFINITY, f32::min);
    if edge.is_finite() {
        edge
    } else {
        0.0
    }
}

fn justification(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
        Alignment::Justify => "both",
    }
}

fn ends_with_hyphen(text: &str) -> bool {
    let mut chars = text.chars().rev();
    chars.next() == Some('-') && chars.next().map(char::is_alphabetic).unwrap_or(false)
}

/// Drop a leading bullet glyph from the first run. Returns false when the
/// text carries no bullet, e.g. an ordinal marker like `1.`.
fn strip_leading_bullet(runs: &mut Vec<Run>) -> bool {
    let Some(first) = runs.first_mut() else {
        return false;
    };
    let Some(rest) = strip_bullet(&first.text) else {
        return false;
    };
    first.text = rest.to_string();
    if first.text.trim().is_empty() {
        runs.remove(0);
        if let Some(next) = runs.first_mut() {
            next.text = next.text.trim_start().to_string();
        }
    }
    true
}

fn write_run(xml: &mut Xml, run: &Run) -> Result<()> {
    let props = &run.props;
    let size = props.half_points.to_string();

    xml.open("w:r", &[])?;
    xml.open("w:rPr", &[])?;
    xml.empty(
        "w:rFonts",
        &[
            ("w:ascii", &props.family),
            ("w:hAnsi", &props.family),
            ("w:cs", &props.family),
        ],
    )?;
    if props.bold {
        xml.empty("w:b", &[])?;
    }
    if props.italic {
        xml.empty("w:i", &[])?;
    }
    if !props.color.is_black() {
        xml.empty("w:color", &[("w:val", &props.color.hex())])?;
    }
    xml.empty("w:sz", &[("w:val", &size)])?;
    xml.empty("w:szCs", &[("w:val", &size)])?;
    xml.close("w:rPr")?;

    for (index, segment) in run.text.split('\t').enumerate() {
        if index > 0 {
            xml.empty("w:tab", &[])?;
        }
        if segment.is_empty() {
            continue;
        }
        let preserve = segment.starts_with(' ') || segment.ends_with(' ');
        let attrs: &[(&str, &str)] = if preserve {
            &[("xml:space", "preserve")]
        } else {
            &[]
        };
        xml.text_element("w:t", attrs, segment)?;
    }
    xml.close("w:r")
}

fn content_types_xml() -> Result<Vec<u8>> {
    let mut xml = Xml::new()?;
    xml.open("Types", &[("xmlns", CONTENT_TYPES_NS)])?;
    xml.empty(
        "Default",
        &[
            ("Extension", "rels"),
            ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
        ],
    )?;
    xml.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    for (part, content_type) in [
        (
            "/word/document.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
        ),
        (
            "/word/styles.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml",
        ),
        (
            "/word/numbering.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml",
        ),
        (
            "/docProps/core.xml",
            "application/vnd.openxmlformats-package.core-properties+xml",
        ),
        (
            "/docProps/app.xml",
            "application/vnd.openxmlformats-officedocument.extended-properties+xml",
        ),
    ] {
        xml.empty("Override", &[("PartName", part), ("ContentType", content_type)])?;
    }
    xml.close("Types")?;
    Ok(xml.into_bytes())
}

fn relationships_xml(rels: &[(&str, String, &str)]) -> Result<Vec<u8>> {
    let mut xml = Xml::new()?;
    xml.open("Relationships", &[("xmlns", PACKAGE_REL_NS)])?;
    for (id, rel_type, target) in rels {
        xml.empty(
            "Relationship",
            &[("Id", id), ("Type", rel_type), ("Target", target)],
        )?;
    }
    xml.close("Relationships")?;
    Ok(xml.into_bytes())
}

fn package_rels_xml() -> Result<Vec<u8>> {
    relationships_xml(&[
        ("rId1", format!("{}/officeDocument", OFFICE_REL), "word/document.xml"),
        (
            "rId2",
            format!("{}/metadata/core-properties", PACKAGE_REL_NS),
            "docProps/core.xml",
        ),
        ("rId3", format!("{}/extended-properties", OFFICE_REL), "docProps/app.xml"),
    ])
}

fn document_rels_xml() -> Result<Vec<u8>> {
    relationships_xml(&[
        ("rId1", format!("{}/styles", OFFICE_REL), "styles.xml"),
        ("rId2", format!("{}/numbering", OFFICE_REL), "numbering.xml"),
    ])
}

fn app_xml(page_count: usize) -> Result<Vec<u8>> {
    let mut xml = Xml::new()?;
    xml.open(
        "Properties",
        &[
            (
                "xmlns",
                "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties",
            ),
            (
                "xmlns:vt",
                "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes",
            ),
        ],
    )?;
    xml.text_element("Application", &[], env!("CARGO_PKG_NAME"))?;
    xml.text_element("Pages", &[], &page_count.to_string())?;
    xml.close("Properties")?;
    Ok(xml.into_bytes())
}

fn numbering_xml() -> Result<Vec<u8>> {
    let mut xml = Xml::new()?;
    xml.open("w:numbering", &[("xmlns:w", WORD_NS)])?;
    xml.open("w:abstractNum", &[("w:abstractNumId", "0")])?;
    xml.empty("w:multiLevelType", &[("w:val", "hybridMultilevel")])?;
    for (level, bullet) in BULLETS.iter().enumerate() {
        let left = (720 * (level + 1)).to_string();
        xml.open("w:lvl", &[("w:ilvl", &level.to_string())])?;
        xml.empty("w:start", &[("w:val", "1")])?;
        xml.empty("w:numFmt", &[("w:val", "bullet")])?;
        xml.empty("w:lvlText", &[("w:val", bullet)])?;
        xml.empty("w:lvlJc", &[("w:val", "left")])?;
        xml.open("w:pPr", &[])?;
        xml.empty("w:ind", &[("w:left", &left), ("w:hanging", "360")])?;
        xml.close("w:pPr")?;
        xml.close("w:lvl")?;
    }
    xml.close("w:abstractNum")?;
    xml.open("w:num", &[("w:numId", BULLET_NUM_ID)])?;
    xml.empty("w:abstractNumId", &[("w:val", "0")])?;
    xml.close("w:num")?;
    xml.close("w:numbering")?;
    Ok(xml.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockStyle, Bounds, Metadata, TableRow, TableCell};
    use std::io::Read;

    fn item(text: &str, x: f32, y: f32, width: f32, size: f32) -> TextItem {
        let mut item = TextItem::new(text, x, y, size, "Arial").with_width(width);
        item.height = size;
        item.space_width = size * 0.278;
        item
    }

    fn block(items: Vec<TextItem>, block_type: BlockType, text: &str) -> TextBlock {
        let bounds = Bounds::of_items(&items).unwrap_or_default();
        let font_size = items.first().map(|i| i.font_size).unwrap_or(12.0);
        TextBlock {
            style: BlockStyle {
                indent: bounds.left,
                font_size,
                font_family: "Arial".to_string(),
                ..Default::default()
            },
            items,
            bounds,
            block_type,
            text: text.to_string(),
        }
    }

    fn doc_with(blocks: Vec<TextBlock>) -> DocumentStructure {
        let mut page = PageStructure::empty(1, 612.0, 792.0);
        page.blocks = blocks;
        let mut doc = DocumentStructure::with_metadata(Metadata {
            title: "Report".to_string(),
            ..Default::default()
        });
        doc.pages.push(page);
        doc
    }

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    fn document(doc: &DocumentStructure) -> String {
        part(&to_docx(doc, &RenderOptions::default()).unwrap(), "word/document.xml")
    }

    #[test]
    fn test_package_parts() {
        let bytes = to_docx(&doc_with(Vec::new()), &RenderOptions::default()).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(&bytes)).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for expected in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "docProps/app.xml",
            "word/document.xml",
            "word/styles.xml",
            "word/numbering.xml",
            "word/_rels/document.xml.rels",
        ] {
            assert!(names.contains(&expected), "missing {}", expected);
        }

        let core = part(&bytes, "docProps/core.xml");
        assert!(core.contains("<dc:title>Report</dc:title>"));
        assert!(!core.contains("dc:creator"));
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(heading_level(24.0), 1);
        assert_eq!(heading_level(18.0), 1);
        assert_eq!(heading_level(16.5), 2);
        assert_eq!(heading_level(14.0), 3);
        assert_eq!(heading_level(12.0), 4);
    }

    #[test]
    fn test_list_levels() {
        assert_eq!(list_level(0.0), 0);
        assert_eq!(list_level(49.0), 0);
        assert_eq!(list_level(50.0), 1);
        assert_eq!(list_level(500.0), 4);
        assert_eq!(list_level(-10.0), 0);
    }

    #[test]
    fn test_uniform_block_is_one_run() {
        let items = vec![
            item("Hello", 72.0, 100.0, 30.0, 12.0),
            item("world", 105.0, 100.0, 30.0, 12.0),
        ];
        let xml = document(&doc_with(vec![block(items, BlockType::Paragraph, "Hello world")]));
        assert_eq!(xml.matches("<w:r>").count(), 1);
        assert!(xml.contains("<w:t>Hello world</w:t>"));
    }

    #[test]
    fn test_style_change_splits_runs() {
        let items = vec![
            item("Bold", 72.0, 100.0, 30.0, 12.0).with_bold(true),
            item("plain", 105.0, 100.0, 30.0, 12.0),
        ];
        let xml = document(&doc_with(vec![block(items, BlockType::Paragraph, "Bold plain")]));
        assert_eq!(xml.matches("<w:r>").count(), 2);
        assert_eq!(xml.matches("<w:b/>").count(), 1);

        let items = vec![
            item("Plain", 72.0, 100.0, 30.0, 12.0),
            item("slanted", 105.0, 100.0, 40.0, 12.0).with_italic(true),
        ];
        let xml = document(&doc_with(vec![block(items, BlockType::Paragraph, "Plain slanted")]));
        assert_eq!(xml.matches("<w:r>").count(), 2);
        assert_eq!(xml.matches("<w:i/>").count(), 1);
    }

    #[test]
    fn test_heading_style_and_size_cap() {
        let items = vec![item("Title", 200.0, 80.0, 150.0, 48.0)];
        let xml = document(&doc_with(vec![block(items, BlockType::Heading, "Title")]));
        assert!(xml.contains("<w:pStyle w:val=\"Heading1\"/>"));
        assert!(xml.contains("<w:sz w:val=\"72\"/>"));
    }

    #[test]
    fn test_list_bullet_numbering() {
        let items = vec![item("• Item one", 72.0, 100.0, 60.0, 12.0)];
        let xml = document(&doc_with(vec![block(items, BlockType::List, "• Item one")]));
        assert!(xml.contains("<w:numId w:val=\"1\"/>"));
        assert!(xml.contains("<w:ilvl w:val=\"0\"/>"));
        assert!(xml.contains("<w:t>Item one</w:t>"));
        assert!(!xml.contains('•'));
    }

    #[test]
    fn test_wide_gap_becomes_tab_stop() {
        let items = vec![
            item("Name", 72.0, 100.0, 30.0, 12.0),
            item("Value", 300.0, 100.0, 30.0, 12.0).with_bold(true),
        ];
        let xml = document(&doc_with(vec![block(items, BlockType::Paragraph, "Name   Value")]));
        assert!(xml.contains("<w:tab w:val=\"left\" w:pos=\"4560\"/>"));
        assert!(xml.contains("<w:tab/>"));
    }

    #[test]
    fn test_table_grid_and_spans() {
        let mut table = TableData::new();
        let mut header = TableRow::from_strings(["Name", "Age", "City"]);
        header.is_header = true;
        table.add_row(header);
        table.add_row(TableRow::new(vec![TableCell::text("Alice").colspan(2)]));
        table.bounds.top = 200.0;

        let mut doc = doc_with(Vec::new());
        doc.pages[0].tables.push(table);
        let xml = document(&doc);

        assert_eq!(xml.matches("<w:gridCol ").count(), 3);
        assert_eq!(xml.matches("<w:tr>").count(), 2);
        assert!(xml.contains("<w:tblHeader/>"));
        assert!(xml.contains("<w:gridSpan w:val=\"2\"/>"));
        assert!(xml.contains("<w:gridAfter w:val=\"1\"/>"));
    }

    #[test]
    fn test_page_breaks_markers_and_images() {
        let mut doc = doc_with(Vec::new());
        let mut second = PageStructure::empty(2, 612.0, 792.0);
        second.images.push(Default::default());
        doc.pages.push(second);

        let options = RenderOptions::default().with_page_markers(true);
        let bytes = to_docx(&doc, &options).unwrap();
        let xml = part(&bytes, "word/document.xml");
        assert_eq!(xml.matches("w:type=\"page\"").count(), 1);
        assert!(xml.contains("--- Page 2 ---"));
        assert!(xml.contains("<w:color w:val=\"808080\"/>"));
        assert!(xml.contains("[Image 1]"));

        let options = RenderOptions::default()
            .with_page_breaks(false)
            .with_image_placeholders(false);
        let xml = part(&to_docx(&doc, &options).unwrap(), "word/document.xml");
        assert!(!xml.contains("w:type=\"page\""));
        assert!(!xml.contains("[Image"));
    }

    #[test]
    fn test_spacing_before_from_gap() {
        let first = block(vec![item("First", 72.0, 100.0, 30.0, 12.0)], BlockType::Paragraph, "First");
        let second = block(vec![item("Second", 72.0, 160.0, 30.0, 12.0)], BlockType::Paragraph, "Second");
        let xml = document(&doc_with(vec![first, second]));
        // gap 48pt minus a 14.4pt line
        assert!(xml.contains("w:before=\"672\""));
    }

    #[test]
    fn test_escapes_text() {
        let items = vec![item("R&D <draft>", 72.0, 100.0, 60.0, 12.0)];
        let xml = document(&doc_with(vec![block(items, BlockType::Paragraph, "R&D <draft>")]));
        assert!(xml.contains("R&amp;D &lt;draft&gt;"));
    }
}
