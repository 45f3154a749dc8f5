//! NameNormalizer - cleans raw NER person strings
//!
//! Upstream NER emits OCR artifacts, headlines and price tags next to real
//! names. The normalizer trims the string, rejects obvious non-names and
//! title-cases whatever survives:
//!
//! - `"  anna hansen,\n"` → `"Anna Hansen"`
//! - `"iPhone 15 Pro 1299 kr."` → rejected (digit run, currency marker)
//! - `"ANNA"` → rejected (no capitalized word)

use regex::Regex;
use std::sync::OnceLock;

use crate::config::ResolutionConfig;

// =============================================================================
// Patterns
// =============================================================================

/// Leading/trailing non-word characters (underscore counts as junk)
fn edge_junk() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\W_]+|[\W_]+$").expect("edge pattern is valid"))
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Product codes, prices and dates all carry three or more digits in a row
fn digit_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{3,}").expect("digit pattern is valid"))
}

/// A plausible name token: an uppercase letter followed by lowercase letters.
/// Unicode classes cover extended alphabets (Æ/Ø/Å, accents, ...).
fn name_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\p{Lu}\p{Ll}+").expect("name token pattern is valid"))
}

// =============================================================================
// NameNormalizer
// =============================================================================

/// Pure, deterministic name cleaner
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    currency_markers: Vec<String>,
    max_words: usize,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(&ResolutionConfig::default())
    }
}

impl NameNormalizer {
    pub fn new(config: &ResolutionConfig) -> Self {
        Self {
            currency_markers: config
                .currency_markers
                .iter()
                .filter(|m| !m.is_empty())
                .map(|m| m.to_lowercase())
                .collect(),
            max_words: config.max_name_words,
        }
    }

    /// Clean one raw name, or `None` if it does not look like a person name
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim().replace('\n', " ");
        let stripped = edge_junk().replace_all(&trimmed, "");
        let name = whitespace_run().replace_all(&stripped, " ");

        if digit_run().is_match(&name) {
            return None;
        }
        let lowered = name.to_lowercase();
        if self.currency_markers.iter().any(|m| lowered.contains(m.as_str())) {
            return None;
        }
        if name.split_whitespace().count() > self.max_words {
            return None;
        }
        if !name_token().is_match(&name) {
            return None;
        }

        Some(title_case(&name))
    }

    /// Normalize a list, silently dropping rejected names
    pub fn normalize_all<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        names
            .iter()
            .filter_map(|name| self.normalize(name.as_ref()))
            .collect()
    }
}

/// Title-case: a letter is uppercased when the preceding character is not a
/// cased letter, lowercased otherwise. `"o'neil-JENSEN"` → `"O'Neil-Jensen"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;

    for c in s.chars() {
        if prev_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_cased = c.is_uppercase() || c.is_lowercase();
    }

    out
}

// =============================================================================
// Tests
// =============================================================================
