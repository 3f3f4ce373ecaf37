//! Positioned text items and their resolved font styles.

use serde::{Deserialize, Serialize};

/// An RGB text color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Color {
    /// Black, the default text color.
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    /// Create a color from its channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create a color from a packed `0xRRGGBB` integer.
    pub fn from_packed(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        }
    }

    /// Hex representation without `#` (e.g., "FF0000").
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Check if this is pure black.
    pub fn is_black(&self) -> bool {
        *self == Self::BLACK
    }
}

/// Font style of a resolved font.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    /// Upright glyphs
    #[default]
    Normal,
    /// Italic or oblique glyphs
    Italic,
}

/// Target-system font chosen for a source font descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedStyle {
    /// Target font family (e.g., "Times New Roman")
    pub family: String,
    /// CSS-like numeric weight, 100-900
    pub weight: u16,
    /// Upright or italic
    pub style: FontStyle,
}

impl ResolvedStyle {
    /// Check if the weight reads as bold (semibold and heavier).
    pub fn is_bold(&self) -> bool {
        self.weight >= 600
    }

    /// Check if the style is italic.
    pub fn is_italic(&self) -> bool {
        self.style == FontStyle::Italic
    }
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            family: "Arial".to_string(),
            weight: 400,
            style: FontStyle::Normal,
        }
    }
}

fn default_page() -> u32 {
    1
}

/// One positioned run of text on a page.
///
/// Coordinates are page space with the origin at the top-left corner; `y`
/// is the top edge of the run and grows downward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextItem {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (top edge)
    pub y: f32,
    /// Width of the run (0 when the extractor did not report it)
    #[serde(default)]
    pub width: f32,
    /// Height of the run (0 when the extractor did not report it)
    #[serde(default)]
    pub height: f32,
    /// Effective font size in points, taken from the glyph transform scale
    pub font_size: f32,
    /// Source font descriptor (e.g., "ABCDEF+TimesNewRomanPS-BoldMT")
    #[serde(default, rename = "sourceFontName", alias = "fontName")]
    pub font_name: String,
    /// Whether the run is bold
    #[serde(default)]
    pub bold: bool,
    /// Whether the run is italic
    #[serde(default)]
    pub italic: bool,
    /// Fill color
    #[serde(default)]
    pub color: Color,
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: u32,
    /// Width of a space in this run's font (0 when unknown)
    #[serde(default)]
    pub space_width: f32,
    /// Extra spacing between letters
    #[serde(default)]
    pub letter_spacing: f32,
    /// Extra spacing between characters (PDF `Tc`)
    #[serde(default)]
    pub char_spacing: f32,
    /// Resolved target font, attached during normalization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<ResolvedStyle>,
}

impl TextItem {
    /// Create a new text item.
    ///
    /// Bold and italic flags are guessed from the font name; extractors that
    /// know better can override them.
    pub fn new(
        text: impl Into<String>,
        x: f32,
        y: f32,
        font_size: f32,
        font_name: impl Into<String>,
    ) -> Self {
        let font_name = font_name.into();
        let lower = font_name.to_lowercase();
        let bold = lower.contains("bold") || lower.contains("black") || lower.contains("heavy");
        let italic = lower.contains("italic") || lower.contains("oblique");

        Self {
            text: text.into(),
            x,
            y,
            width: 0.0,
            height: 0.0,
            font_size,
            font_name,
            bold,
            italic,
            color: Color::BLACK,
            page: 1,
            space_width: 0.0,
            letter_spacing: 0.0,
            char_spacing: 0.0,
            resolved: None,
        }
    }

    /// Set width and return self.
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    /// Set bold flag and return self.
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Set italic flag and return self.
    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    /// Set color and return self.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set page number and return self.
    pub fn on_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Horizontal center.
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Target family, or the default when the item was never resolved.
    pub fn family(&self) -> &str {
        self.resolved
            .as_ref()
            .map(|r| r.family.as_str())
            .unwrap_or("Arial")
    }

    /// Number of characters in the text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Check if all letters are uppercase (and there is at least one).
    pub fn is_all_caps(&self) -> bool {
        is_all_caps(&self.text)
    }

    /// Check that every coordinate is a finite number.
    pub fn has_finite_geometry(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.font_size.is_finite()
    }
}

/// Check if all letters in `text` are uppercase (and there is at least one).
pub(crate) fn is_all_caps(text: &str) -> bool {
    let mut letters = text.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(|c| c.is_uppercase())
}
