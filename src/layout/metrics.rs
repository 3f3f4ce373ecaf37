//! Text width and line height estimation.
//!
//! Source documents rarely carry usable glyph widths for every run, and the
//! target fonts differ from the source fonts anyway. Widths are estimated
//! from per-family average character ratios with a coarse glyph class
//! adjustment and a small kerning table.

/// Line height multiplier for body text.
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Line height multiplier for headings.
pub const HEADING_LINE_HEIGHT_FACTOR: f32 = 1.4;

/// Width facts for one target family, as fractions of the font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FamilyMetrics {
    /// Average character width
    pub char_width: f32,
    /// Width of a space
    pub space_width: f32,
    /// Every glyph has the same advance
    pub monospace: bool,
    /// Scale applied to the kerning table
    pub kerning_scale: f32,
}

impl FamilyMetrics {
    /// Metrics for a target family name.
    pub fn for_family(family: &str) -> Self {
        let lower = family.to_lowercase();
        let (char_width, space_width, monospace, kerning_scale) = match lower.as_str() {
            f if f.contains("courier") || f.contains("consolas") => (0.60, 0.60, true, 0.0),
            f if f.contains("times") => (0.55, 0.25, false, 1.0),
            f if f.contains("calibri") => (0.56, 0.226, false, 0.9),
            f if f.contains("verdana") => (0.62, 0.35, false, 0.8),
            f if f.contains("arial") || f.contains("helvetica") => (0.58, 0.278, false, 0.9),
            f if f.contains("georgia") || f.contains("cambria") || f.contains("garamond") => {
                (0.56, 0.25, false, 1.0)
            }
            _ => (0.58, 0.27, false, 0.9),
        };

        Self {
            char_width,
            space_width,
            monospace,
            kerning_scale,
        }
    }
}

/// Ordered pairs that kern, with their reduction as a fraction of font size.
const KERNING_PAIRS: &[(char, char, f32)] = &[
    ('A', 'V', 0.08),
    ('A', 'W', 0.07),
    ('V', 'A', 0.08),
    ('W', 'A', 0.07),
    ('T', 'a', 0.07),
    ('T', 'o', 0.07),
    ('T', 'e', 0.06),
    ('W', 'e', 0.05),
    ('Y', 'o', 0.08),
    ('L', 'T', 0.10),
    ('P', 'A', 0.05),
];

/// Width factor for a glyph class relative to the family average.
fn glyph_factor(c: char) -> f32 {
    match c {
        'i' | 'l' | 'j' | 't' | 'f' | 'r' | 'I' | '.' | ',' | ';' | ':' | '\'' | '!' | '|' => 0.5,
        '(' | ')' | '[' | ']' | '-' => 0.6,
        'm' | 'w' | 'M' | 'W' | '@' | '%' => 1.45,
        c if c.is_uppercase() => 1.15,
        c if is_wide_script_char(c) => 1.7,
        _ => 1.0,
    }
}

/// Full-width scripts render close to a square em box.
fn is_wide_script_char(c: char) -> bool {
    let code = c as u32;
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3040..=0x30FF).contains(&code)
        || (0xAC00..=0xD7AF).contains(&code)
        || (0x3000..=0x303F).contains(&code)
}

/// Kerning reduction for an ordered pair, as a fraction of font size.
fn kerning(prev: char, current: char) -> f32 {
    KERNING_PAIRS
        .iter()
        .find(|(a, b, _)| *a == prev && *b == current)
        .map(|(_, _, k)| *k)
        .unwrap_or(0.0)
}

/// Deterministic width and height estimates.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsEngine;

impl MetricsEngine {
    /// Create a metrics engine.
    pub fn new() -> Self {
        Self
    }

    /// Estimated advance width of `text` in points.
    pub fn text_width(&self, text: &str, font_size: f32, family: &str) -> f32 {
        let metrics = FamilyMetrics::for_family(family);
        let mut width = 0.0;
        let mut prev: Option<char> = None;

        for c in text.chars() {
            let advance = if c == ' ' {
                metrics.space_width
            } else if metrics.monospace {
                metrics.char_width
            } else {
                metrics.char_width * glyph_factor(c)
            };
            width += advance * font_size;

            if let Some(p) = prev {
                width -= kerning(p, c) * metrics.kerning_scale * font_size;
            }
            prev = Some(c);
        }

        width.max(0.0)
    }

    /// Line height for a font size.
    pub fn line_height(&self, font_size: f32, is_heading: bool) -> f32 {
        if is_heading {
            font_size * HEADING_LINE_HEIGHT_FACTOR
        } else {
            font_size * LINE_HEIGHT_FACTOR
        }
    }

    /// Width of a space in points.
    pub fn space_width(&self, font_size: f32, family: &str) -> f32 {
        FamilyMetrics::for_family(family).space_width * font_size
    }
}
