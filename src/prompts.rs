//! Prompts and response markers.
//!
//! The extraction prompt and the paragraph markers it asks for must agree
//! with [`crate::pipeline::segment`], and the continuity prompt must agree
//! with [`crate::oracle::parse_verdict`]. Keeping all of them here makes that
//! pairing visible in one place.

/// Marker prefix the extraction prompt asks the model to emit, e.g. `[[PARAGRAPH 3]]`.
pub const PARAGRAPH_MARKER: &str = "PARAGRAPH";

/// Reply the model gives when a page has no qualifying prose.
pub const NO_CONTENT_SENTINEL: &str = "[[NO QUALIFYING CONTENT]]";

/// Word the continuity prompt asks for on a positive verdict.
pub const AFFIRMATIVE_TOKEN: &str = "yes";

/// Default system prompt for extracting explanatory paragraphs from a page.
///
/// Used when `ExtractionConfig::system_prompt` is `None`.
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"Analyse this PDF page and extract only its explanatory prose.

Selection rules:
1. Keep only continuous, complete explanatory paragraphs: background,
   method descriptions, analysis and discussion, and itemised explanations.
2. Ignore all of the following:
   - mathematical formulas and derivations
   - tables of contents, indexes and reference lists
   - table contents and table captions
   - figure labels and figure captions
   - code listings
   - author information and bare headings

For every qualifying paragraph:
1. Start it with the marker "[[PARAGRAPH N]]", where N counts from 1.
2. Keep the whole of one paragraph under a single marker.
3. If a short inline formula sits inside a paragraph that is mostly prose,
   keep the paragraph, formula included.
4. Reproduce the text in its original language; do not translate or summarise.

If nothing on the page qualifies, reply with exactly "[[NO QUALIFYING CONTENT]]"."#;

/// Build the continuity question for two passages.
///
/// The model is asked for a bare "yes"/"no" so a ten-token budget suffices.
pub fn continuity_prompt(first: &str, second: &str) -> String {
    format!(
        r#"Decide whether the two passages below are one continuous piece of text that should be merged into a single paragraph.

Passage 1:
{first}

Passage 2:
{second}

Criteria:
1. Passage 1 ends unfinished and passage 2 continues it.
2. Both passages discuss the same topic and are tightly connected.
3. Joined together they read more fluently and more completely.

Answer with only "yes" or "no". Do not explain."#
    )
}
