//! Result types returned by the extraction entry points.
//!
//! The paragraph text itself lives in the on-disk store; these types carry
//! what happened to it, and all serialise for `pdf2para --json`.

use crate::pipeline::segment::FilteredParagraph;
use crate::stitch::StitchReport;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of [`crate::extract`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Root of the paragraph store.
    pub output_dir: PathBuf,
    pub metadata: DocumentMetadata,
    /// One entry per processed page, in page order.
    pub pages: Vec<PageExtraction>,
    /// `None` when stitching was disabled.
    pub stitch: Option<StitchReport>,
    pub stats: ExtractionStats,
}

/// What extraction produced for one page, before stitching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageExtraction {
    /// 1-indexed.
    pub page_num: usize,
    /// Paragraphs found in the model reply.
    pub raw_paragraphs: usize,
    /// Paragraphs written to the store after the length filter.
    pub kept_paragraphs: usize,
    pub filtered: Vec<FilteredParagraph>,
    pub duration_ms: u64,
}

/// Run-level counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages in the document.
    pub total_pages: usize,
    /// Pages sent to the model.
    pub processed_pages: usize,
    /// Paragraph records in the store for the processed pages after stitching.
    pub stored_paragraphs: usize,
    pub filtered_paragraphs: usize,
    pub extraction_duration_ms: u64,
    pub stitch_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Document information read from the PDF's info dictionary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}
