//! Paragraph stitching: repair segmentation artefacts across page breaks.
//!
//! The model sees one page at a time, so a paragraph that runs over a page
//! break comes back as two fragments, and a lead-in such as "The method has
//! three steps:" often ends up separated from the list it introduces. Two
//! passes fix this on the persisted [`ParagraphStore`]:
//!
//! 1. [`Stitcher::merge_across_pages`] asks the [`ContinuityOracle`], for
//!    each adjacent page pair, whether the last paragraph of the earlier page
//!    continues into the first paragraph of the later one, and merges if so.
//! 2. [`Stitcher::reconcile_colon_lists`] reunites colon-terminated lead-ins
//!    with the list items that follow them, and drops lead-ins whose list
//!    never made it into the store.
//!
//! Both passes re-list the store after every mutation and renumber the page
//! they changed, so no pass ever acts on a stale position.

pub mod classify;
pub mod colon_list;
pub mod cross_page;

use crate::config::StitchOptions;
use crate::error::Pdf2ParaError;
use crate::oracle::ContinuityOracle;
use crate::progress::ProgressCallback;
use crate::store::ParagraphStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// A structural change made while stitching.
///
/// Positions are 1-based and refer to the page as it was when the change
/// was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StitchEvent {
    /// The last paragraph of `page` absorbed the first paragraph of `next_page`.
    CrossPageMerged { page: usize, next_page: usize },
    /// A colon lead-in absorbed the list item that followed it.
    LeadInMerged {
        page: usize,
        position: usize,
        item_page: usize,
    },
    /// A further consecutive list item was folded into a merged lead-in.
    ListItemAbsorbed { page: usize, position: usize },
    /// A colon lead-in had nothing after it anywhere and was deleted.
    DanglingLeadInDropped { page: usize, position: usize },
    /// A colon lead-in was followed by prose rather than a list and was deleted.
    UnsupportedLeadInDropped { page: usize, position: usize },
}

impl fmt::Display for StitchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StitchEvent::CrossPageMerged { page, next_page } => write!(
                f,
                "merged last paragraph of page {page} with first paragraph of page {next_page}"
            ),
            StitchEvent::LeadInMerged {
                page,
                position,
                item_page,
            } if item_page != page => write!(
                f,
                "page {page} paragraph {position}: colon lead-in joined with list item from page {item_page}"
            ),
            StitchEvent::LeadInMerged { page, position, .. } => write!(
                f,
                "page {page} paragraph {position}: colon lead-in joined with following list item"
            ),
            StitchEvent::ListItemAbsorbed { page, position } => write!(
                f,
                "page {page} paragraph {position}: absorbed consecutive list item"
            ),
            StitchEvent::DanglingLeadInDropped { page, position } => write!(
                f,
                "page {page} paragraph {position}: deleted colon lead-in with no continuation"
            ),
            StitchEvent::UnsupportedLeadInDropped { page, position } => write!(
                f,
                "page {page} paragraph {position}: deleted colon lead-in not followed by a list item"
            ),
        }
    }
}

/// Counters for the changes made by one stitching run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StitchReport {
    pub cross_page_merges: usize,
    pub lead_in_merges: usize,
    pub list_items_absorbed: usize,
    pub dangling_lead_ins_dropped: usize,
    pub unsupported_lead_ins_dropped: usize,
}

impl StitchReport {
    fn record(&mut self, event: &StitchEvent) {
        match event {
            StitchEvent::CrossPageMerged { .. } => self.cross_page_merges += 1,
            StitchEvent::LeadInMerged { .. } => self.lead_in_merges += 1,
            StitchEvent::ListItemAbsorbed { .. } => self.list_items_absorbed += 1,
            StitchEvent::DanglingLeadInDropped { .. } => self.dangling_lead_ins_dropped += 1,
            StitchEvent::UnsupportedLeadInDropped { .. } => {
                self.unsupported_lead_ins_dropped += 1
            }
        }
    }

    /// Total number of structural changes.
    pub fn total_changes(&self) -> usize {
        self.cross_page_merges
            + self.lead_in_merges
            + self.list_items_absorbed
            + self.dangling_lead_ins_dropped
            + self.unsupported_lead_ins_dropped
    }
}

/// Runs the stitching passes against a paragraph store.
pub struct Stitcher<'a> {
    store: &'a ParagraphStore,
    progress: Option<ProgressCallback>,
    report: StitchReport,
}

impl<'a> Stitcher<'a> {
    pub fn new(store: &'a ParagraphStore) -> Self {
        Self {
            store,
            progress: None,
            report: StitchReport::default(),
        }
    }

    /// Forward every [`StitchEvent`] to `callback` as it happens.
    pub fn with_progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    pub fn report(&self) -> &StitchReport {
        &self.report
    }

    pub fn into_report(self) -> StitchReport {
        self.report
    }

    fn emit(&mut self, event: StitchEvent) {
        info!("{event}");
        self.report.record(&event);
        if let Some(ref cb) = self.progress {
            cb.on_stitch_event(&event);
        }
    }
}

/// Run the enabled stitching passes over `pages`, in the given order.
///
/// The cross-page pass runs first so that the colon-list pass sees
/// paragraphs that were already joined across page breaks.
pub async fn stitch_pages(
    store: &ParagraphStore,
    pages: &[usize],
    oracle: &dyn ContinuityOracle,
    options: StitchOptions,
    progress: Option<ProgressCallback>,
) -> Result<StitchReport, Pdf2ParaError> {
    info!("Stitching {} pages in {}", pages.len(), store.base_dir().display());
    let mut stitcher = Stitcher::new(store).with_progress(progress);

    if options.cross_page {
        stitcher.merge_across_pages(pages, oracle).await?;
    }
    if options.colon_lists {
        stitcher.reconcile_colon_lists(pages)?;
    }

    let report = stitcher.into_report();
    info!("Stitching complete: {} changes", report.total_changes());
    Ok(report)
}
