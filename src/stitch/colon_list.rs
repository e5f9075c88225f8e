//! Colon-list reconciliation pass.
//!
//! A paragraph ending in a colon almost always introduces a list. When
//! per-page segmentation separated the lead-in from its items, this pass
//! joins them back together, purely lexically:
//!
//! - lead-in followed by a list item → merge (`lead-in + "\n" + item`), then
//!   keep absorbing consecutive items on the same page;
//! - lead-in followed by prose → the lead-in is incomplete; delete it;
//! - lead-in followed by nothing, on this page or the next → delete it.
//!
//! When the lead-in is the last paragraph of its page, the first paragraph
//! of the following page in the sequence stands in as its successor. A
//! cross-page merge takes that single item only.
//!
//! The page is re-listed at the top of every step. After a deletion the scan
//! resumes at the earliest colon-terminated paragraph at or before the
//! deleted slot, or at the slot itself when there is none. Restarting from
//! the top would step over the same non-colon paragraphs without touching
//! them, so this yields the same result. A lead-in merged earlier can still
//! end in a colon when its last item does (`"• Advantages:"`), and it is
//! picked up again this way.

use super::classify::{continues_bullet_list, is_colon_lead_in, is_list_item, list_ordinal};
use super::{StitchEvent, Stitcher};
use crate::error::Pdf2ParaError;
use tracing::debug;

/// The paragraph that follows a colon lead-in.
struct Successor {
    page: usize,
    ordinal: u32,
    text: String,
}

/// What to do with the lead-in at the cursor.
enum Step {
    /// Nothing to change; move on.
    Advance,
    /// The listing went stale under us; start the page over.
    Rescan,
    /// The lead-in was deleted; recompute where to resume.
    Deleted,
}

impl Stitcher<'_> {
    /// Reconcile colon lead-ins with list items on every page of `pages`.
    pub fn reconcile_colon_lists(&mut self, pages: &[usize]) -> Result<(), Pdf2ParaError> {
        for (idx, &page) in pages.iter().enumerate() {
            if !self.store.has_page(page) {
                continue;
            }
            self.reconcile_page(page, pages.get(idx + 1).copied())?;
        }
        Ok(())
    }

    fn reconcile_page(&mut self, page: usize, next_page: Option<usize>) -> Result<(), Pdf2ParaError> {
        let mut cursor = 0;
        loop {
            let ordinals = self.store.list(page)?;
            if cursor >= ordinals.len() {
                return Ok(());
            }

            match self.reconcile_at(page, next_page, &ordinals, cursor)? {
                Step::Advance => cursor += 1,
                Step::Rescan => cursor = 0,
                Step::Deleted => cursor = self.resume_point(page, cursor)?,
            }
        }
    }

    fn reconcile_at(
        &mut self,
        page: usize,
        next_page: Option<usize>,
        ordinals: &[u32],
        cursor: usize,
    ) -> Result<Step, Pdf2ParaError> {
        let Some(current) = self.store.read(page, ordinals[cursor])? else {
            debug!("Page {page}: paragraph {} vanished, rescanning", cursor + 1);
            return Ok(Step::Rescan);
        };
        let current = current.trim();
        if !is_colon_lead_in(current) {
            return Ok(Step::Advance);
        }

        let successor = match ordinals.get(cursor + 1) {
            Some(&ordinal) => match self.store.read(page, ordinal)? {
                Some(text) => Some(Successor { page, ordinal, text }),
                None => return Ok(Step::Rescan),
            },
            None => match next_page {
                Some(next) => self.first_paragraph(next)?,
                None => None,
            },
        };

        let position = cursor + 1;
        let Some(successor) = successor else {
            self.drop_lead_in(page, ordinals[cursor])?;
            self.emit(StitchEvent::DanglingLeadInDropped { page, position });
            return Ok(Step::Deleted);
        };

        let item = successor.text.trim();
        if !is_list_item(item) {
            self.drop_lead_in(page, ordinals[cursor])?;
            self.emit(StitchEvent::UnsupportedLeadInDropped { page, position });
            return Ok(Step::Deleted);
        }

        let merged = format!("{current}\n{item}");
        self.store.write(page, ordinals[cursor], &merged)?;
        self.store.remove(successor.page, successor.ordinal)?;
        self.store.renumber(successor.page)?;
        self.emit(StitchEvent::LeadInMerged {
            page,
            position,
            item_page: successor.page,
        });

        if successor.page == page {
            self.absorb_list_items(page, cursor, merged, list_ordinal(item))?;
        }
        Ok(Step::Advance)
    }

    /// Fold the consecutive list items after position `cursor` into it.
    ///
    /// A successor is absorbed when it is bulleted and the merged text
    /// already holds a bullet, or when its ordinal is exactly one more than
    /// the previously absorbed ordinal. The first successor failing both
    /// ends the run. A bullet resets the ordinal chain.
    fn absorb_list_items(
        &mut self,
        page: usize,
        cursor: usize,
        mut merged: String,
        mut previous: Option<u64>,
    ) -> Result<(), Pdf2ParaError> {
        loop {
            let ordinals = self.store.list(page)?;
            let (Some(&target), Some(&next)) = (ordinals.get(cursor), ordinals.get(cursor + 1))
            else {
                return Ok(());
            };
            let Some(text) = self.store.read(page, next)? else {
                return Ok(());
            };
            let item = text.trim();

            let ordinal = list_ordinal(item);
            let continues_bullets = continues_bullet_list(&merged, item);
            let continues_numbering = matches!(
                (previous, ordinal),
                (Some(prev), Some(n)) if prev.checked_add(1) == Some(n)
            );
            if !(continues_bullets || continues_numbering) {
                return Ok(());
            }

            merged.push('\n');
            merged.push_str(item);
            self.store.write(page, target, &merged)?;
            self.store.remove(page, next)?;
            self.store.renumber(page)?;
            previous = ordinal;

            self.emit(StitchEvent::ListItemAbsorbed {
                page,
                position: cursor + 1,
            });
        }
    }

    /// Where to continue after the paragraph at `deleted` was removed.
    ///
    /// The first colon-terminated paragraph before `deleted`, else `deleted`
    /// itself. A paragraph that vanished meanwhile sends the scan back to 0.
    fn resume_point(&self, page: usize, deleted: usize) -> Result<usize, Pdf2ParaError> {
        let ordinals = self.store.list(page)?;
        for (position, &ordinal) in ordinals.iter().enumerate().take(deleted) {
            match self.store.read(page, ordinal)? {
                Some(text) if is_colon_lead_in(&text) => return Ok(position),
                Some(_) => {}
                None => return Ok(0),
            }
        }
        Ok(deleted)
    }

    /// First paragraph of `page`, if the page exists and is non-empty.
    fn first_paragraph(&self, page: usize) -> Result<Option<Successor>, Pdf2ParaError> {
        let Some(&ordinal) = self.store.list(page)?.first() else {
            return Ok(None);
        };
        Ok(self
            .store
            .read(page, ordinal)?
            .map(|text| Successor { page, ordinal, text }))
    }

    fn drop_lead_in(&self, page: usize, ordinal: u32) -> Result<(), Pdf2ParaError> {
        self.store.remove(page, ordinal)?;
        self.store.renumber(page)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::stitch::Stitcher;
    use crate::store::ParagraphStore;
    use tempfile::TempDir;

    fn store_with(pages: &[(usize, &[&str])]) -> (TempDir, ParagraphStore) {
        let tmp = TempDir::new().unwrap();
        let store = ParagraphStore::new(tmp.path());
        for (page, paragraphs) in pages {
            let owned: Vec<String> = paragraphs.iter().map(|s| s.to_string()).collect();
            store.save_page(*page, &owned).unwrap();
        }
        (tmp, store)
    }

    #[test]
    fn numbered_items_absorbed_up_to_prose() {
        let (_tmp, store) = store_with(&[(
            1,
            &["Steps are:", "1. Mix.", "2. Bake.", "3. Serve.", "Unrelated prose."],
        )]);
        let mut stitcher = Stitcher::new(&store);
        stitcher.reconcile_colon_lists(&[1]).unwrap();

        assert_eq!(
            store.load_page(1).unwrap(),
            vec!["Steps are:\n1. Mix.\n2. Bake.\n3. Serve.", "Unrelated prose."]
        );
        assert_eq!(store.list(1).unwrap(), vec![1, 2]);
        let report = stitcher.report();
        assert_eq!(report.lead_in_merges, 1);
        assert_eq!(report.list_items_absorbed, 2);
    }

    #[test]
    fn dangling_lead_in_on_last_page_is_deleted() {
        let (_tmp, store) = store_with(&[(1, &["See below:"])]);
        let mut stitcher = Stitcher::new(&store);
        stitcher.reconcile_colon_lists(&[1]).unwrap();

        assert_eq!(store.count(1).unwrap(), 0);
        assert_eq!(stitcher.report().dangling_lead_ins_dropped, 1);
    }

    #[test]
    fn lead_in_before_prose_is_deleted_and_rest_renumbered() {
        let (_tmp, store) = store_with(&[(
            1,
            &["Intro text.", "The causes are:", "Prices rose sharply.", "Ending."],
        )]);
        let mut stitcher = Stitcher::new(&store);
        stitcher.reconcile_colon_lists(&[1]).unwrap();

        assert_eq!(
            store.load_page(1).unwrap(),
            vec!["Intro text.", "Prices rose sharply.", "Ending."]
        );
        assert_eq!(store.list(1).unwrap(), vec![1, 2, 3]);
        assert_eq!(stitcher.report().unsupported_lead_ins_dropped, 1);
    }

    #[test]
    fn inner_colon_is_left_alone() {
        let (_tmp, store) = store_with(&[(1, &["Conclusion: the results are positive."])]);
        let mut stitcher = Stitcher::new(&store);
        stitcher.reconcile_colon_lists(&[1]).unwrap();

        assert_eq!(
            store.load_page(1).unwrap(),
            vec!["Conclusion: the results are positive."]
        );
        assert_eq!(stitcher.report().total_changes(), 0);
    }

    #[test]
    fn full_width_colon_with_bullets() {
        let (_tmp, store) = store_with(&[(1, &["主要貢獻如下：", "• 第一", "• 第二", "結論。"])]);
        Stitcher::new(&store).reconcile_colon_lists(&[1]).unwrap();

        assert_eq!(
            store.load_page(1).unwrap(),
            vec!["主要貢獻如下：\n• 第一\n• 第二", "結論。"]
        );
    }

    #[test]
    fn merged_lead_in_ending_in_colon_is_revisited_after_deletion() {
        let (_tmp, store) = store_with(&[(
            1,
            &["Lead:", "• Advantages:", "Other:", "Plain prose here."],
        )]);
        let mut stitcher = Stitcher::new(&store);
        stitcher.reconcile_colon_lists(&[1]).unwrap();

        assert_eq!(store.load_page(1).unwrap(), vec!["Plain prose here."]);
        let report = stitcher.report();
        assert_eq!(report.lead_in_merges, 1);
        assert_eq!(report.unsupported_lead_ins_dropped, 2);

        let mut again = Stitcher::new(&store);
        again.reconcile_colon_lists(&[1]).unwrap();
        assert_eq!(again.report().total_changes(), 0);
        assert_eq!(store.load_page(1).unwrap(), vec!["Plain prose here."]);
    }

    #[test]
    fn deletion_resumes_past_untouched_prose() {
        let (_tmp, store) = store_with(&[(
            1,
            &["Opening prose.", "Steps:", "1. a", "Dangling:", "Closing prose."],
        )]);
        let mut stitcher = Stitcher::new(&store);
        stitcher.reconcile_colon_lists(&[1]).unwrap();

        assert_eq!(
            store.load_page(1).unwrap(),
            vec!["Opening prose.", "Steps:\n1. a", "Closing prose."]
        );
        assert_eq!(stitcher.report().unsupported_lead_ins_dropped, 1);
    }

    #[test]
    fn bullet_list_does_not_absorb_a_different_glyph() {
        let (_tmp, store) = store_with(&[(1, &["Features:", "• fast", "▪ small", "• safe"])]);
        Stitcher::new(&store).reconcile_colon_lists(&[1]).unwrap();

        assert_eq!(
            store.load_page(1).unwrap(),
            vec!["Features:\n• fast", "▪ small", "• safe"]
        );
    }

    #[test]
    fn numbering_restart_stops_absorption() {
        let (_tmp, store) = store_with(&[(1, &["Two lists:", "1. a", "2. b", "1. c", "2. d"])]);
        Stitcher::new(&store).reconcile_colon_lists(&[1]).unwrap();

        assert_eq!(
            store.load_page(1).unwrap(),
            vec!["Two lists:\n1. a\n2. b", "1. c", "2. d"]
        );
    }

    #[test]
    fn numbering_gap_stops_absorption() {
        let (_tmp, store) = store_with(&[(1, &["Items:", "1. a", "3. c"])]);
        Stitcher::new(&store).reconcile_colon_lists(&[1]).unwrap();

        assert_eq!(store.load_page(1).unwrap(), vec!["Items:\n1. a", "3. c"]);
    }

    #[test]
    fn numbered_item_after_bullets_is_not_absorbed() {
        let (_tmp, store) = store_with(&[(1, &["Mixed:", "• a", "• b", "2. c"])]);
        Stitcher::new(&store).reconcile_colon_lists(&[1]).unwrap();

        assert_eq!(store.load_page(1).unwrap(), vec!["Mixed:\n• a\n• b", "2. c"]);
    }

    #[test]
    fn bullet_after_numbered_item_needs_an_existing_bullet() {
        let (_tmp, store) = store_with(&[(1, &["Mixed:", "1. a", "• b"])]);
        Stitcher::new(&store).reconcile_colon_lists(&[1]).unwrap();

        assert_eq!(store.load_page(1).unwrap(), vec!["Mixed:\n1. a", "• b"]);
    }

    #[test]
    fn cross_page_lead_in_takes_one_item_only() {
        let (_tmp, store) = store_with(&[
            (1, &["Prose.", "We propose:"]),
            (2, &["1. A model.", "2. A dataset.", "Closing prose."]),
        ]);
        let mut stitcher = Stitcher::new(&store);
        stitcher.reconcile_colon_lists(&[1, 2]).unwrap();

        assert_eq!(
            store.load_page(1).unwrap(),
            vec!["Prose.", "We propose:\n1. A model."]
        );
        assert_eq!(
            store.load_page(2).unwrap(),
            vec!["2. A dataset.", "Closing prose."]
        );
        assert_eq!(store.list(2).unwrap(), vec![1, 2]);
    }

    #[test]
    fn cross_page_lead_in_before_prose_is_deleted() {
        let (_tmp, store) = store_with(&[(1, &["Prose.", "As follows:"]), (2, &["Plain text."])]);
        Stitcher::new(&store).reconcile_colon_lists(&[1, 2]).unwrap();

        assert_eq!(store.load_page(1).unwrap(), vec!["Prose."]);
        assert_eq!(store.load_page(2).unwrap(), vec!["Plain text."]);
    }

    #[test]
    fn lead_in_before_empty_next_page_is_deleted() {
        let (_tmp, store) = store_with(&[(1, &["As follows:"]), (2, &[]), (3, &["• item"])]);
        Stitcher::new(&store).reconcile_colon_lists(&[1, 2, 3]).unwrap();

        assert_eq!(store.count(1).unwrap(), 0);
        assert_eq!(store.load_page(3).unwrap(), vec!["• item"]);
    }

    #[test]
    fn consecutive_lead_ins_collapse_to_the_last() {
        // The first lead-in is followed by prose (another lead-in) and goes;
        // the second then sits at the cursor and takes the list.
        let (_tmp, store) = store_with(&[(1, &["First:", "Second:", "• x", "• y"])]);
        Stitcher::new(&store).reconcile_colon_lists(&[1]).unwrap();

        assert_eq!(store.load_page(1).unwrap(), vec!["Second:\n• x\n• y"]);
    }

    #[test]
    fn second_run_changes_nothing() {
        let (_tmp, store) = store_with(&[
            (1, &["Steps are:", "1. Mix.", "2. Bake.", "Prose.", "Lead:"]),
            (2, &["• item", "Tail prose.", "Dangling:"]),
        ]);
        Stitcher::new(&store).reconcile_colon_lists(&[1, 2]).unwrap();
        let first_one = store.load_page(1).unwrap();
        let first_two = store.load_page(2).unwrap();

        let mut again = Stitcher::new(&store);
        again.reconcile_colon_lists(&[1, 2]).unwrap();

        assert_eq!(again.report().total_changes(), 0);
        assert_eq!(store.load_page(1).unwrap(), first_one);
        assert_eq!(store.load_page(2).unwrap(), first_two);
        assert_eq!(
            first_one,
            vec!["Steps are:\n1. Mix.\n2. Bake.", "Prose.", "Lead:\n• item"]
        );
        assert_eq!(first_two, vec!["Tail prose."]);
    }

    #[test]
    fn missing_page_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let store = ParagraphStore::new(tmp.path());
        Stitcher::new(&store).reconcile_colon_lists(&[1, 2]).unwrap();
    }
}
