//! Font descriptor resolution.
//!
//! Source documents name fonts with descriptors such as
//! `ABCDEF+TimesNewRomanPS-BoldItalicMT`. The target document can only
//! reference fonts the reader is likely to have, so each descriptor is
//! reduced to a bare family token, classified for weight and style, and
//! mapped through a substitution table.

use std::collections::HashMap;

use crate::model::{FontStyle, ResolvedStyle};

/// Family used when nothing else matches.
pub const DEFAULT_FAMILY: &str = "Arial";

/// Substitutions checked in order against the bare family token (spaces removed).
const FAMILY_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("timesnewroman", "Times New Roman"),
    ("times", "Times New Roman"),
    ("helvetica", "Arial"),
    ("arial", "Arial"),
    ("couriernew", "Courier New"),
    ("courier", "Courier New"),
    ("calibri", "Calibri"),
    ("cambria", "Cambria"),
    ("garamond", "Garamond"),
    ("georgia", "Georgia"),
    ("verdana", "Verdana"),
    ("tahoma", "Tahoma"),
    ("trebuchet", "Trebuchet MS"),
    ("palatino", "Palatino Linotype"),
    ("bookantiqua", "Book Antiqua"),
    ("centurygothic", "Century Gothic"),
    ("consolas", "Consolas"),
    ("segoe", "Segoe UI"),
    ("symbol", "Symbol"),
    ("liberationserif", "Times New Roman"),
    ("liberationsans", "Arial"),
    ("liberationmono", "Courier New"),
];

/// Generic family hints, checked after the substitution table.
const GENERIC_HINTS: &[(&str, &str)] = &[
    ("mono", "Courier New"),
    ("sans", "Arial"),
    ("serif", "Times New Roman"),
];

/// Weight and style words removed from descriptors, longest first.
const STYLE_TOKENS: &[&str] = &[
    "extrabold",
    "ultrabold",
    "semibold",
    "demibold",
    "extralight",
    "ultralight",
    "oblique",
    "italic",
    "regular",
    "medium",
    "black",
    "heavy",
    "light",
    "bold",
    "demi",
    "thin",
];

/// Vendor suffixes stripped from the end of a token.
const VENDOR_SUFFIXES: &[&str] = &["psmt", "mt", "ps", "std", "pro"];

/// Resolve a font descriptor to a target family, weight and style.
///
/// Never fails: unknown descriptors resolve to Arial, 400, normal.
pub fn resolve_font(descriptor: &str) -> ResolvedStyle {
    let lower = strip_subset_tag(descriptor).to_lowercase();

    let resolved = ResolvedStyle {
        family: substitute_family(&bare_family(&lower)).to_string(),
        weight: classify_weight(&lower),
        style: classify_style(&lower),
    };

    log::trace!(
        "Resolved font {:?} -> {} {} {:?}",
        descriptor,
        resolved.family,
        resolved.weight,
        resolved.style
    );
    resolved
}

/// Classify weight by substring (input must be lowercase).
pub fn classify_weight(lower: &str) -> u16 {
    if lower.contains("black") || lower.contains("heavy") {
        900
    } else if lower.contains("extrabold") || lower.contains("ultrabold") {
        800
    } else if lower.contains("semibold") || lower.contains("demi") {
        600
    } else if lower.contains("bold") {
        700
    } else if lower.contains("medium") {
        500
    } else if lower.contains("light") || lower.contains("thin") {
        300
    } else {
        400
    }
}

/// Classify style by substring (input must be lowercase).
pub fn classify_style(lower: &str) -> FontStyle {
    if lower.contains("italic") || lower.contains("oblique") {
        FontStyle::Italic
    } else {
        FontStyle::Normal
    }
}

/// Remove a PDF subset tag (`ABCDEF+`) if present.
fn strip_subset_tag(descriptor: &str) -> &str {
    match descriptor.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.chars().all(|c| c.is_ascii_uppercase()) => rest,
        _ => descriptor,
    }
}

/// Reduce a lowercase descriptor to its bare family token.
fn bare_family(lower: &str) -> String {
    let mut tokens: Vec<String> = Vec::new();

    for token in lower.split(|c: char| c == '-' || c == '_' || c == ',' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }

        let mut token = token.to_string();
        for suffix in VENDOR_SUFFIXES {
            if token.len() > suffix.len() + 2 && token.ends_with(suffix) {
                token.truncate(token.len() - suffix.len());
                break;
            }
        }
        if VENDOR_SUFFIXES.contains(&token.as_str()) {
            continue;
        }

        for style in STYLE_TOKENS {
            token = token.replace(style, "");
        }
        if !token.is_empty() {
            tokens.push(token);
        }
    }

    tokens.concat()
}

/// Map a bare family token to a target family.
fn substitute_family(bare: &str) -> &'static str {
    FAMILY_SUBSTITUTIONS
        .iter()
        .chain(GENERIC_HINTS)
        .find(|(needle, _)| bare.contains(needle))
        .map(|(_, family)| *family)
        .unwrap_or(DEFAULT_FAMILY)
}

/// Per-conversion cache of resolved font descriptors.
///
/// Owned by one conversion and dropped with it; never shared between
/// unrelated documents.
#[derive(Debug, Clone, Default)]
pub struct StyleCache {
    entries: HashMap<String, ResolvedStyle>,
}

impl StyleCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a descriptor, caching the result.
    pub fn resolve(&mut self, descriptor: &str) -> &ResolvedStyle {
        if !self.entries.contains_key(descriptor) {
            self.entries
                .insert(descriptor.to_string(), resolve_font(descriptor));
        }
        &self.entries[descriptor]
    }

    /// Get a cached resolution.
    pub fn get(&self, descriptor: &str) -> Option<&ResolvedStyle> {
        self.entries.get(descriptor)
    }

    /// Cached resolution, or a fresh one when the descriptor was never seen.
    pub fn lookup(&self, descriptor: &str) -> ResolvedStyle {
        self.get(descriptor)
            .cloned()
            .unwrap_or_else(|| resolve_font(descriptor))
    }

    /// Number of cached descriptors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
