//! Progress-callback trait for extraction and stitching events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to observe a
//! run as it happens: pages starting and finishing, and every merge or
//! deletion the stitching passes perform.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2para::{ExtractionConfig, ExtractionProgressCallback, StitchEvent};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct MergeCounter {
//!     merges: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for MergeCounter {
//!     fn on_stitch_event(&self, event: &StitchEvent) {
//!         if let StitchEvent::CrossPageMerged { .. } = event {
//!             self.merges.fetch_add(1, Ordering::SeqCst);
//!         }
//!     }
//! }
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(Arc::new(MergeCounter { merges: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::stitch::StitchEvent;
use std::sync::Arc;

/// Called by the pipeline as it processes pages and stitches paragraphs.
///
/// All methods default to no-ops. The pipeline is sequential, so calls never
/// overlap, but the trait is `Send + Sync` so implementations can be shared
/// with other tasks (e.g. a UI thread).
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once, before the first page, with the number of selected pages.
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is rendered and sent to the model.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page's paragraphs have been written to the store.
    ///
    /// # Arguments
    /// * `kept_paragraphs`: paragraphs left after the length filter
    fn on_page_complete(&self, page_num: usize, total_pages: usize, kept_paragraphs: usize) {
        let _ = (page_num, total_pages, kept_paragraphs);
    }

    /// Called for every structural change made while stitching.
    fn on_stitch_event(&self, event: &StitchEvent) {
        let _ = event;
    }

    /// Called once after extraction and stitching have finished.
    fn on_extraction_complete(&self, total_pages: usize, total_paragraphs: usize) {
        let _ = (total_pages, total_paragraphs);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ExtractionProgressCallback for Recorder {
        fn on_page_complete(&self, page_num: usize, _total: usize, kept: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("page {page_num}: {kept}"));
        }

        fn on_stitch_event(&self, event: &StitchEvent) {
            self.events.lock().unwrap().push(event.to_string());
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start(3);
        cb.on_page_start(1, 3);
        cb.on_page_complete(1, 3, 4);
        cb.on_stitch_event(&StitchEvent::CrossPageMerged {
            page: 1,
            next_page: 2,
        });
        cb.on_extraction_complete(3, 10);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_extraction_start(10);
        cb.on_page_complete(1, 10, 2);
    }

    #[test]
    fn recorder_sees_events_in_order() {
        let rec = Recorder::default();
        rec.on_page_complete(1, 2, 3);
        rec.on_stitch_event(&StitchEvent::DanglingLeadInDropped {
            page: 2,
            position: 1,
        });
        let events = rec.events.lock().unwrap();
        assert_eq!(events[0], "page 1: 3");
        assert!(events[1].contains("page 2"));
    }
}
