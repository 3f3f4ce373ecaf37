//! Text cleanup for reconstructed block text.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static HYPHENATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-zA-Z])-[ \t]*\n\s*([a-z])").unwrap());
static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r" {4,}").unwrap());
static SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r" +([,.;:!?])").unwrap());
static MISSING_SPACE_AFTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"([,;])(\p{L})").unwrap());
static CAMEL_CASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z]{2,})([A-Z][a-z]+)").unwrap());

const LIGATURES: &[(char, &str)] = &[
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

/// Options for text cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Normalize Unicode to NFC form
    pub normalize_unicode: bool,

    /// Expand ligatures (fi, fl, etc.)
    pub fix_ligatures: bool,

    /// Remove Unicode replacement character (U+FFFD)
    pub remove_replacement_char: bool,

    /// Remove Private Use Area characters
    pub remove_pua: bool,

    /// Join words hyphenated at line breaks
    pub fix_hyphenation: bool,

    /// Map tabs, newlines and NBSP to spaces and cap space runs at three
    pub normalize_whitespace: bool,

    /// Remove spaces before punctuation and add one after `,` and `;`
    pub fix_punctuation: bool,

    /// Split glued words such as "endOf" into "end Of"
    pub split_camel_case: bool,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            fix_ligatures: true,
            remove_replacement_char: true,
            remove_pua: true,
            fix_hyphenation: true,
            normalize_whitespace: true,
            fix_punctuation: true,
            split_camel_case: true,
        }
    }
}

impl CleanupOptions {
    /// Only Unicode normalization and ligature expansion.
    pub fn minimal() -> Self {
        Self {
            normalize_unicode: true,
            fix_ligatures: true,
            remove_replacement_char: false,
            remove_pua: false,
            fix_hyphenation: false,
            normalize_whitespace: false,
            fix_punctuation: false,
            split_camel_case: false,
        }
    }
}

/// Text cleanup pipeline.
#[derive(Debug, Clone, Default)]
pub struct CleanupPipeline {
    options: CleanupOptions,
}

impl CleanupPipeline {
    /// Create a new cleanup pipeline with the given options.
    pub fn new(options: CleanupOptions) -> Self {
        Self { options }
    }

    /// Get the options.
    pub fn options(&self) -> &CleanupOptions {
        &self.options
    }

    /// Process text through the cleanup pipeline.
    pub fn process(&self, text: &str) -> String {
        let mut result: String = if self.options.normalize_unicode {
            text.nfc().collect()
        } else {
            text.to_string()
        };

        if self.options.fix_ligatures {
            result = expand_ligatures(&result);
        }

        if self.options.remove_replacement_char {
            result = result.replace('\u{FFFD}', "");
        }

        if self.options.remove_pua {
            result.retain(|c| !is_private_use(c));
        }

        // Must run while newlines are still present.
        if self.options.fix_hyphenation {
            result = HYPHENATION.replace_all(&result, "$1$2").into_owned();
        }

        if self.options.normalize_whitespace {
            result = self.normalize_whitespace(&result);
        }

        if self.options.fix_punctuation {
            result = SPACE_BEFORE_PUNCT.replace_all(&result, "$1").into_owned();
            result = MISSING_SPACE_AFTER
                .replace_all(&result, "$1 $2")
                .into_owned();
        }

        if self.options.split_camel_case {
            result = CAMEL_CASE.replace_all(&result, "$1 $2").into_owned();
        }

        result.trim().to_string()
    }

    fn normalize_whitespace(&self, text: &str) -> String {
        let mapped: String = text
            .chars()
            .map(|c| match c {
                '\t' | '\n' | '\r' | '\u{00A0}' | '\u{2007}' | '\u{202F}' => ' ',
                c => c,
            })
            .collect();

        SPACE_RUN.replace_all(&mapped, "   ").into_owned()
    }
}

fn expand_ligatures(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match LIGATURES.iter().find(|(lig, _)| *lig == c) {
            Some((_, expansion)) => out.push_str(expansion),
            None => out.push(c),
        }
    }
    out
}

fn is_private_use(c: char) -> bool {
    let code = c as u32;
    (0xE000..=0xF8FF).contains(&code)
        || (0xF0000..=0xFFFFD).contains(&code)
        || (0x100000..=0x10FFFD).contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(text: &str) -> String {
        CleanupPipeline::default().process(text)
    }

    #[test]
    fn test_ligature_fix() {
        assert_eq!(clean("ﬁnding ﬂowers"), "finding flowers");
    }

    #[test]
    fn test_unicode_normalization() {
        let decomposed = "cafe\u{0301}";
        assert_eq!(clean(decomposed), "caf\u{00E9}");
    }

    #[test]
    fn test_remove_replacement_char() {
        assert_eq!(clean("Hello\u{FFFD} world"), "Hello world");
    }

    #[test]
    fn test_hyphenation_fix() {
        assert_eq!(clean("infor-\nmation"), "information");
        assert_eq!(clean("well-known"), "well-known");
    }

    #[test]
    fn test_space_runs_capped() {
        assert_eq!(clean("a\t\tb"), "a  b");
        assert_eq!(clean("a      b"), "a   b");
        assert_eq!(clean("a\u{00A0}b"), "a b");
    }

    #[test]
    fn test_punctuation_spacing() {
        assert_eq!(clean("Hello , world !"), "Hello, world!");
        assert_eq!(clean("red,green;blue"), "red, green; blue");
        assert_eq!(clean("1,000 units"), "1,000 units");
    }

    #[test]
    fn test_camel_case_split() {
        assert_eq!(clean("the endOf line"), "the end Of line");
        assert_eq!(clean("iPhone"), "iPhone");
    }

    #[test]
    fn test_minimal_keeps_spacing() {
        let pipeline = CleanupPipeline::new(CleanupOptions::minimal());
        assert_eq!(pipeline.process("a , b"), "a , b");
    }
}
