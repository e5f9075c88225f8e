//! Cross-page merge pass.
//!
//! Walks the page sequence once, left to right. For each adjacent pair the
//! oracle decides whether the earlier page's last paragraph runs on into the
//! later page's first paragraph. A merge is never revisited: if page 2's only
//! paragraph is merged into page 1, the pair (2, 3) is skipped because page 2
//! is now empty, and nothing cascades from page 3 back into page 1.

use super::{StitchEvent, Stitcher};
use crate::error::Pdf2ParaError;
use crate::oracle::ContinuityOracle;
use tracing::{debug, warn};

impl Stitcher<'_> {
    /// Merge paragraphs split by page breaks, one left-to-right pass.
    pub async fn merge_across_pages(
        &mut self,
        pages: &[usize],
        oracle: &dyn ContinuityOracle,
    ) -> Result<(), Pdf2ParaError> {
        for pair in pages.windows(2) {
            let (page, next_page) = (pair[0], pair[1]);

            let Some((last, first)) = self.boundary(page, next_page)? else {
                debug!("Pages {page}/{next_page}: nothing to compare");
                continue;
            };
            let (Some(tail), Some(head)) = (
                self.store.read(page, last)?,
                self.store.read(next_page, first)?,
            ) else {
                debug!("Pages {page}/{next_page}: boundary paragraph vanished");
                continue;
            };

            if !oracle.judge(&tail, &head).await? {
                debug!("Pages {page}/{next_page}: not a continuation");
                continue;
            }

            // The oracle call can take seconds; resolve the boundary again
            // rather than trusting the identifiers read before it.
            if self.boundary(page, next_page)? != Some((last, first)) {
                warn!("Pages {page}/{next_page}: boundary changed during continuity check, skipping merge");
                continue;
            }

            let merged = format!("{} {}", tail.trim(), head.trim());
            self.store.write(page, last, &merged)?;
            self.store.remove(next_page, first)?;
            self.store.renumber(next_page)?;

            self.emit(StitchEvent::CrossPageMerged { page, next_page });
        }
        Ok(())
    }

    /// Ordinals of the last paragraph of `page` and the first of `next_page`.
    ///
    /// `None` when either page is missing or empty.
    fn boundary(&self, page: usize, next_page: usize) -> Result<Option<(u32, u32)>, Pdf2ParaError> {
        let last = self.store.list(page)?.last().copied();
        let first = self.store.list(next_page)?.first().copied();
        Ok(last.zip(first))
    }
}
