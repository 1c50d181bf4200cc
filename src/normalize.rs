//! Shared text normalization for queries and keywords.
//!
//! Both sides of a keyword lookup go through `normalize_text`, so a keyword
//! matches whenever its normalized form is a substring of the normalized query.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse runs of whitespace (including newlines) into a single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize free text for keyword search.
/// NFC-composes (decomposed Hangul jamo → syllables), lower-cases, collapses whitespace.
pub fn normalize_text(text: &str) -> String {
    let composed: String = text.nfc().collect();
    let lowered = composed.to_lowercase();
    MULTI_SPACE.replace_all(lowered.trim(), " ").to_string()
}

/// True when the text carries no characters once whitespace is removed.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_basic() {
        assert_eq!(normalize_text("  Hello   World \n"), "hello world");
        assert_eq!(normalize_text("오늘  너무\t행복해"), "오늘 너무 행복해");
    }

    #[test]
    fn test_normalize_composes_hangul() {
        // "행복" spelled as conjoining jamo
        let decomposed = "\u{1112}\u{1162}\u{11BC}\u{1107}\u{1169}\u{11A8}";
        assert_ne!(decomposed, "행복");
        assert_eq!(normalize_text(decomposed), "행복");
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank(" \t\n "));
        assert!(!is_blank(" a "));
    }
}
