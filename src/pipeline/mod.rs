//! Per-page extraction stages.
//!
//! ```text
//! input ─► render ─► encode ─► llm ─► postprocess ─► segment ─► store
//!            └── page_text ──────┘
//! ```
//!
//! Pages move through the stages strictly one at a time. The provider's
//! rate limit, not pdfium, is the bottleneck, so there is no fan-out.

pub mod encode;
pub mod input;
pub mod llm;
pub mod postprocess;
pub mod render;
pub mod segment;
