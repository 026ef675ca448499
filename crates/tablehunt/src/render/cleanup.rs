use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Tidy text pulled out of a table cell.
///
/// NFC-normalises, expands typographic ligatures, drops replacement
/// characters and collapses every whitespace run (line breaks included) to a
/// single space.
pub fn cleanup_text(text: &str) -> String {
    let mut result: String = text.nfc().collect();

    let ligatures = [
        ("\u{FB00}", "ff"),
        ("\u{FB01}", "fi"),
        ("\u{FB02}", "fl"),
        ("\u{FB03}", "ffi"),
        ("\u{FB04}", "ffl"),
    ];
    for (lig, replacement) in &ligatures {
        result = result.replace(lig, replacement);
    }

    result = result.replace('\u{FFFD}', "");

    static RE_SPACES: OnceLock<Regex> = OnceLock::new();
    let re_spaces = RE_SPACES.get_or_init(|| Regex::new(r"\s+").unwrap());
    result = re_spaces.replace_all(&result, " ").to_string();

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough() {
        assert_eq!(cleanup_text("Net income"), "Net income");
    }

    #[test]
    fn test_ligature_fix() {
        assert_eq!(cleanup_text("pro\u{FB01}t"), "profit");
        assert_eq!(cleanup_text("a\u{FB04}e"), "affle");
    }

    #[test]
    fn test_whitespace_collapses() {
        assert_eq!(cleanup_text("  12\n 345\t  6 "), "12 345 6");
    }

    #[test]
    fn test_replacement_char_removed() {
        assert_eq!(cleanup_text("Q\u{FFFD}3"), "Q3");
    }

    #[test]
    fn test_nfc_normalization() {
        assert_eq!(cleanup_text("caf\u{0065}\u{0301}"), "caf\u{00E9}");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(cleanup_text(""), "");
    }
}
