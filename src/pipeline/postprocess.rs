//! Deterministic cleanup of the raw model reply before segmentation.
//!
//! Even with "reply with markers only" in the prompt, models wrap output in
//! code fences, answer with CRLF line endings, or sprinkle zero-width
//! characters copied from the PDF's text layer. Those would end up inside the
//! paragraph files and confuse the colon and bullet checks in
//! [`crate::stitch::classify`], so they are removed here first.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every cleanup rule, in order.
///
/// 1. Strip an outer code fence (```` ``` ```` / ```` ```text ````)
/// 2. Normalise line endings to LF
/// 3. Trim trailing whitespace per line
/// 4. Remove invisible Unicode (zero-width spaces, BOM, soft hyphens)
pub fn clean_reply(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    remove_invisible_chars(&s)
}

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*\r?\n(.*)\r?\n```\s*$").unwrap());

fn strip_outer_fence(input: &str) -> String {
    match RE_OUTER_FENCE.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        ['\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}'],
        "",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_plain_and_tagged_fences() {
        assert_eq!(strip_outer_fence("```\n[[PARAGRAPH 1]] a\n```"), "[[PARAGRAPH 1]] a");
        assert_eq!(strip_outer_fence("```text\nbody\n```\n"), "body");
    }

    #[test]
    fn unfenced_passes_through() {
        assert_eq!(strip_outer_fence("[[PARAGRAPH 1]] a"), "[[PARAGRAPH 1]] a");
    }

    #[test]
    fn full_cleanup() {
        let raw = "```\r\n[[PARAGRAPH 1]] Lead:   \r\n\u{200B}• item\r\n```";
        assert_eq!(clean_reply(raw), "[[PARAGRAPH 1]] Lead:\n• item");
    }
}
