//! Split a model reply into paragraphs and filter out fragments.
//!
//! The extraction prompt asks for `[[PARAGRAPH N]]` before each paragraph.
//! The CJK form `[[段落N]]` and its sentinel are accepted as well so that
//! replies to a custom Chinese-language prompt segment the same way.

use crate::prompts::{NO_CONTENT_SENTINEL, PARAGRAPH_MARKER};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

static RE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\[\[\s*(?:{PARAGRAPH_MARKER}|段落)\s*\d+\s*\]\]"
    ))
    .unwrap()
});

const CJK_NO_CONTENT_SENTINEL: &str = "[[無符合條件的內容]]";

/// A paragraph dropped by [`filter_short`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredParagraph {
    /// 1-based position in the reply.
    pub index: usize,
    /// Trimmed length in characters.
    pub len: usize,
    pub text: String,
}

/// Whether the reply says the page has no qualifying content.
pub fn is_no_content(reply: &str) -> bool {
    reply.contains(NO_CONTENT_SENTINEL) || reply.contains(CJK_NO_CONTENT_SENTINEL)
}

/// Split a reply on paragraph markers.
///
/// Text before the first marker is kept if non-empty (models sometimes drop
/// the first marker). Segments are trimmed; empty segments are discarded.
pub fn split_paragraphs(reply: &str) -> Vec<String> {
    if is_no_content(reply) {
        return Vec::new();
    }
    RE_MARKER
        .split(reply)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keep paragraphs whose trimmed length is at least `min_len` characters.
///
/// The threshold is inclusive. Length counts Unicode scalar values, so a
/// CJK paragraph is measured in characters, not bytes.
pub fn filter_short(
    paragraphs: Vec<String>,
    min_len: usize,
) -> (Vec<String>, Vec<FilteredParagraph>) {
    let mut kept = Vec::with_capacity(paragraphs.len());
    let mut filtered = Vec::new();

    for (i, paragraph) in paragraphs.into_iter().enumerate() {
        let trimmed = paragraph.trim();
        let len = trimmed.chars().count();
        if len >= min_len {
            kept.push(paragraph);
        } else {
            info!("Filtered paragraph {} (length {}): {:?}", i + 1, len, trimmed);
            filtered.push(FilteredParagraph {
                index: i + 1,
                len,
                text: trimmed.to_string(),
            });
        }
    }

    (kept, filtered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_markers() {
        let reply = "[[PARAGRAPH 1]]\nFirst paragraph.\n\n[[PARAGRAPH 2]] Second one.\n";
        assert_eq!(
            split_paragraphs(reply),
            vec!["First paragraph.", "Second one."]
        );
    }

    #[test]
    fn cjk_markers_and_case_insensitivity() {
        let reply = "[[段落1]]第一段。[[paragraph 2]]Second.";
        assert_eq!(split_paragraphs(reply), vec!["第一段。", "Second."]);
    }

    #[test]
    fn sentinel_means_no_paragraphs() {
        assert!(split_paragraphs("[[NO QUALIFYING CONTENT]]").is_empty());
        assert!(split_paragraphs("[[無符合條件的內容]]").is_empty());
    }

    #[test]
    fn empty_segments_are_dropped() {
        assert_eq!(
            split_paragraphs("[[PARAGRAPH 1]]   [[PARAGRAPH 2]]Only this."),
            vec!["Only this."]
        );
        assert!(split_paragraphs("").is_empty());
    }

    #[test]
    fn filter_threshold_is_inclusive() {
        let nine = "123456789".to_string();
        let ten = "  1234567890  ".to_string();
        let (kept, filtered) = filter_short(vec![nine, ten.clone()], 10);
        assert_eq!(kept, vec![ten]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].index, 1);
        assert_eq!(filtered[0].len, 9);
    }

    #[test]
    fn filter_counts_characters_not_bytes() {
        let cjk = "這是十個字的中文段落".to_string();
        assert_eq!(cjk.chars().count(), 10);
        let (kept, _) = filter_short(vec![cjk], 10);
        assert_eq!(kept.len(), 1);
    }
}
