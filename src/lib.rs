//! # edgequake-pdf2para
//!
//! Extract the explanatory paragraphs of a PDF with a vision language model
//! and store them as one text file per paragraph.
//!
//! The model reads one page at a time, so its output is segmented by page:
//! a paragraph running over a page break comes back as two fragments, and a
//! lead-in like "The method has three steps:" is often split from its list.
//! After extraction, two stitching passes repair this on disk.
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    resolve local file or download from URL
//!  ├─ 2. Render   rasterise one page via pdfium (or read its text layer)
//!  ├─ 3. Extract  one VLM call per page, markers → paragraphs
//!  ├─ 4. Filter   drop fragments shorter than min_paragraph_len
//!  ├─ 5. Store    <output_dir>/<page>/paragraph_<n>.txt
//!  └─ 6. Stitch   cross-page merge (oracle-gated), colon-list reconcile
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2para::{extract, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .output_dir("paragraphs")
//!         .build()?;
//!     let output = extract("paper.pdf", &config).await?;
//!     eprintln!(
//!         "{} paragraphs over {} pages",
//!         output.stats.stored_paragraphs, output.stats.processed_pages
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Stitching only
//!
//! [`stitch_pages`] works on any [`ParagraphStore`] with any
//! [`ContinuityOracle`], so an existing output tree can be repaired without
//! re-extracting, and tests can script the oracle's verdicts.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2para` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod oracle;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod stitch;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, InputMode, PageSelection, StitchOptions};
pub use error::Pdf2ParaError;
pub use extract::{extract, extract_sync, inspect, stitch_directory};
pub use oracle::{ContinuityOracle, LlmContinuityOracle};
pub use output::{DocumentMetadata, ExtractionOutput, ExtractionStats, PageExtraction};
pub use pipeline::segment::FilteredParagraph;
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stitch::{stitch_pages, StitchEvent, StitchReport, Stitcher};
pub use store::ParagraphStore;
