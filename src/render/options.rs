//! Rendering options and configuration.

use std::ops::RangeInclusive;

use super::JsonFormat;

/// Options for rendering a reconstructed document.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Start every page after the first on a new DOCX page
    pub page_breaks: bool,

    /// Emit a small centered "--- Page N ---" paragraph before each page
    pub page_markers: bool,

    /// Emit running headers and footers as ordinary paragraphs
    pub include_headers_footers: bool,

    /// Emit an "[Image N]" paragraph for each image placeholder
    pub image_placeholders: bool,

    /// Paragraph spacing after, in points
    pub space_after_pt: f32,

    /// Line spacing multiplier
    pub line_spacing: f32,

    /// Largest run font size written, in points
    pub max_font_size: f32,

    /// Turn wide intra-line gaps into tab stops
    pub tab_stops: bool,

    /// Derive spacing-before from the vertical gap to the previous block
    pub layout_spacing: bool,

    /// Page selection
    pub page_selection: PageSelection,

    /// JSON output style
    pub json_format: JsonFormat,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable page breaks between pages.
    pub fn with_page_breaks(mut self, enabled: bool) -> Self {
        self.page_breaks = enabled;
        self
    }

    /// Enable or disable page marker paragraphs.
    pub fn with_page_markers(mut self, enabled: bool) -> Self {
        self.page_markers = enabled;
        self
    }

    /// Include or drop running headers and footers.
    pub fn with_headers_footers(mut self, include: bool) -> Self {
        self.include_headers_footers = include;
        self
    }

    /// Enable or disable image placeholder paragraphs.
    pub fn with_image_placeholders(mut self, enabled: bool) -> Self {
        self.image_placeholders = enabled;
        self
    }

    /// Set paragraph spacing after, in points.
    pub fn with_space_after(mut self, points: f32) -> Self {
        self.space_after_pt = points.max(0.0);
        self
    }

    /// Set the line spacing multiplier.
    pub fn with_line_spacing(mut self, spacing: f32) -> Self {
        self.line_spacing = spacing.clamp(0.5, 3.0);
        self
    }

    /// Set the font size cap.
    pub fn with_max_font_size(mut self, points: f32) -> Self {
        self.max_font_size = points.max(1.0);
        self
    }

    /// Enable or disable tab stops.
    pub fn with_tab_stops(mut self, enabled: bool) -> Self {
        self.tab_stops = enabled;
        self
    }

    /// Enable or disable spacing derived from layout gaps.
    pub fn with_layout_spacing(mut self, enabled: bool) -> Self {
        self.layout_spacing = enabled;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, selection: PageSelection) -> Self {
        self.page_selection = selection;
        self
    }

    /// Set specific page range.
    pub fn with_page_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.page_selection = PageSelection::Range(range);
        self
    }

    /// Set the JSON output style.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.json_format = format;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page_breaks: true,
            page_markers: false,
            include_headers_footers: true,
            image_placeholders: true,
            space_after_pt: 8.0,
            line_spacing: 1.15,
            max_font_size: 36.0,
            tab_stops: true,
            layout_spacing: true,
            page_selection: PageSelection::All,
            json_format: JsonFormat::Pretty,
        }
    }
}

/// Page selection for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Render all pages
    #[default]
    All,
    /// Render a range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Render specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Parse a page selection string (e.g., "2-4", "1,3,6-8").
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        if !s.contains(',') {
            if let Some((start, end)) = s.split_once('-') {
                let (start, end) = (parse_page(start)?, parse_page(end)?);
                if start > end {
                    return Err(format!("Empty page range: {}", s));
                }
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            match part.split_once('-') {
                Some((start, end)) => pages.extend(parse_page(start)?..=parse_page(end)?),
                None => pages.push(parse_page(part)?),
            }
        }
        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}

fn parse_page(s: &str) -> Result<u32, String> {
    s.trim()
        .parse()
        .map_err(|_| format!("Invalid page number: {:?}", s.trim()))
}
