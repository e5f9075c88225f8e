//! Lexical paragraph classification.
//!
//! Purely syntactic checks, no model calls. A paragraph is a colon lead-in
//! when its last non-whitespace character is a half-width `:` or full-width
//! `：`, and a list item when it opens with a bullet glyph or a `<digits>.`
//! ordinal.

use once_cell::sync::Lazy;
use regex::Regex;

/// Glyphs recognised as list bullets.
pub const BULLET_GLYPHS: &[char] = &['•', '●', '▪', '◦'];

static RE_ORDINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)\.").unwrap());

/// Whether the trimmed text ends in a sentence-final colon.
///
/// `"Conclusion: the results are positive."` is not a lead-in; the colon must
/// be the last character.
pub fn is_colon_lead_in(text: &str) -> bool {
    let trimmed = text.trim_end();
    trimmed.ends_with(':') || trimmed.ends_with('：')
}

/// Whether the trimmed text starts with a bullet glyph.
pub fn is_bulleted(text: &str) -> bool {
    text.trim_start().starts_with(BULLET_GLYPHS)
}

/// The bullet glyph the trimmed text opens with, if any.
pub fn leading_bullet(text: &str) -> Option<char> {
    text.trim_start()
        .chars()
        .next()
        .filter(|c| BULLET_GLYPHS.contains(c))
}

/// Whether `item` continues a bullet list already present in `merged`.
///
/// The item's glyph must already occur in `merged`: a `▪` item does not
/// extend a `•` list.
pub fn continues_bullet_list(merged: &str, item: &str) -> bool {
    leading_bullet(item).is_some_and(|glyph| merged.contains(glyph))
}

/// The leading `<digits>.` ordinal of a numbered item, if any.
///
/// Ordinals too large for `u64` are treated as absent.
pub fn list_ordinal(text: &str) -> Option<u64> {
    RE_ORDINAL
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Whether the paragraph is a bullet or numbered list item.
pub fn is_list_item(text: &str) -> bool {
    let trimmed = text.trim();
    is_bulleted(trimmed) || RE_ORDINAL.is_match(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colon_lead_in_half_and_full_width() {
        assert!(is_colon_lead_in("Steps are:"));
        assert!(is_colon_lead_in("步驟如下："));
        assert!(is_colon_lead_in("See below:   \n"));
    }

    #[test]
    fn inner_colon_is_not_a_lead_in() {
        assert!(!is_colon_lead_in("Conclusion: the results are positive."));
        assert!(!is_colon_lead_in(""));
    }

    #[test]
    fn list_items() {
        assert!(is_list_item("• first"));
        assert!(is_list_item("   ● indented bullet"));
        assert!(is_list_item("1. Mix."));
        assert!(is_list_item("  12. Twelfth"));
        assert!(!is_list_item("- dash is prose"));
        assert!(!is_list_item("Unrelated prose."));
        assert!(!is_list_item("1) parenthesised"));
    }

    #[test]
    fn ordinals() {
        assert_eq!(list_ordinal("3. Serve."), Some(3));
        assert_eq!(list_ordinal("  10. Ten"), Some(10));
        assert_eq!(list_ordinal("• bullet"), None);
        assert_eq!(list_ordinal("99999999999999999999999. huge"), None);
    }

    #[test]
    fn bullet_detection() {
        assert!(is_bulleted("  • x"));
        assert!(!is_bulleted("x • y"));
        assert_eq!(leading_bullet("  ▪ x"), Some('▪'));
        assert_eq!(leading_bullet("1. x"), None);
    }

    #[test]
    fn bullet_lists_continue_only_with_the_same_glyph() {
        assert!(continues_bullet_list("Lead:\n• x", "• y"));
        assert!(continues_bullet_list("Lead:\n▪ x", "  ▪ y"));
        assert!(!continues_bullet_list("Lead:\n• x", "▪ y"));
        assert!(!continues_bullet_list("Lead:\n1. x", "• y"));
        assert!(!continues_bullet_list("Lead:\n• x", "plain"));
    }
}
