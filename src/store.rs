//! File-system backed paragraph store.
//!
//! ## Layout
//!
//! ```text
//! <base_dir>/
//!   1/
//!     paragraph_1.txt
//!     paragraph_2.txt
//!   2/
//!     paragraph_1.txt
//! ```
//!
//! One directory per page, one UTF-8 file per paragraph, no header. The
//! numeric suffix is the paragraph's 1-based position on its page. After every
//! structural change the owning page is renumbered so positions stay dense
//! (`1..=count`) and keep their relative order.
//!
//! Every call goes straight to disk; nothing is cached. The stitching passes
//! rely on that: they re-list a page after each mutation instead of holding
//! identifiers that a deletion may have invalidated.

use crate::error::Pdf2ParaError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-name prefix of every paragraph record.
pub const PARAGRAPH_PREFIX: &str = "paragraph_";

/// File extension of every paragraph record.
pub const PARAGRAPH_EXT: &str = ".txt";

/// Prefix used while renumbering. Does not parse as a paragraph ordinal, so a
/// listing never mistakes a staged file for a live record.
const STAGING_PREFIX: &str = "paragraph_staging_";

/// Build the file name for the paragraph at `ordinal`.
pub fn paragraph_file_name(ordinal: u32) -> String {
    format!("{PARAGRAPH_PREFIX}{ordinal}{PARAGRAPH_EXT}")
}

/// Parse the ordinal out of a paragraph file name, if it is one.
///
/// Only the canonical spelling counts: ASCII digits, no sign, no leading
/// zero. `paragraph_01.txt` would otherwise collide with `paragraph_1.txt`.
pub fn parse_ordinal(file_name: &str) -> Option<u32> {
    let digits = file_name
        .strip_prefix(PARAGRAPH_PREFIX)?
        .strip_suffix(PARAGRAPH_EXT)?;
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Handle to a paragraph store rooted at a base directory.
#[derive(Debug, Clone)]
pub struct ParagraphStore {
    base_dir: PathBuf,
}

impl ParagraphStore {
    /// Open a store rooted at `base_dir`. The directory need not exist yet.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory holding the paragraphs of `page`.
    pub fn page_dir(&self, page: usize) -> PathBuf {
        self.base_dir.join(page.to_string())
    }

    /// Path of the paragraph record `ordinal` on `page`.
    pub fn paragraph_path(&self, page: usize, ordinal: u32) -> PathBuf {
        self.page_dir(page).join(paragraph_file_name(ordinal))
    }

    /// Whether a directory exists for `page`.
    pub fn has_page(&self, page: usize) -> bool {
        self.page_dir(page).is_dir()
    }

    /// Every page number with a directory under the base dir, ascending.
    ///
    /// Entries whose name is not a page number are ignored. A missing base
    /// directory yields an empty list.
    pub fn pages(&self) -> Result<Vec<usize>, Pdf2ParaError> {
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Pdf2ParaError::store(&self.base_dir, e)),
        };

        let mut pages = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Pdf2ParaError::store(&self.base_dir, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(page) = entry.file_name().to_str().and_then(|s| s.parse().ok()) {
                pages.push(page);
            }
        }
        pages.sort_unstable();
        Ok(pages)
    }

    /// Ordinals of the paragraph records on `page`, ascending.
    ///
    /// A missing page directory is an empty page, not an error.
    pub fn list(&self, page: usize) -> Result<Vec<u32>, Pdf2ParaError> {
        let dir = self.page_dir(page);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Pdf2ParaError::store(&dir, e)),
        };

        let mut ordinals = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Pdf2ParaError::store(&dir, e))?;
            if let Some(ordinal) = entry.file_name().to_str().and_then(parse_ordinal) {
                ordinals.push(ordinal);
            }
        }
        ordinals.sort_unstable();
        Ok(ordinals)
    }

    /// Number of paragraph records on `page`.
    pub fn count(&self, page: usize) -> Result<usize, Pdf2ParaError> {
        Ok(self.list(page)?.len())
    }

    /// Read one paragraph. `Ok(None)` when the record has disappeared.
    pub fn read(&self, page: usize, ordinal: u32) -> Result<Option<String>, Pdf2ParaError> {
        let path = self.paragraph_path(page, ordinal);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Pdf2ParaError::store(path, e)),
        }
    }

    /// Overwrite (or create) one paragraph record.
    pub fn write(&self, page: usize, ordinal: u32, text: &str) -> Result<(), Pdf2ParaError> {
        let path = self.paragraph_path(page, ordinal);
        fs::write(&path, text).map_err(|e| Pdf2ParaError::store(path, e))
    }

    /// Delete one paragraph record. Does not renumber.
    pub fn remove(&self, page: usize, ordinal: u32) -> Result<(), Pdf2ParaError> {
        let path = self.paragraph_path(page, ordinal);
        fs::remove_file(&path).map_err(|e| Pdf2ParaError::store(path, e))
    }

    /// All paragraphs of `page`, in order.
    pub fn load_page(&self, page: usize) -> Result<Vec<String>, Pdf2ParaError> {
        let mut paragraphs = Vec::new();
        for ordinal in self.list(page)? {
            if let Some(text) = self.read(page, ordinal)? {
                paragraphs.push(text);
            }
        }
        Ok(paragraphs)
    }

    /// Replace the contents of `page` with `paragraphs`, numbered from 1.
    ///
    /// Records left over from a previous run are removed first, so a page
    /// that shrank does not keep stale high-numbered paragraphs.
    pub fn save_page(&self, page: usize, paragraphs: &[String]) -> Result<(), Pdf2ParaError> {
        let dir = self.page_dir(page);
        fs::create_dir_all(&dir).map_err(|e| Pdf2ParaError::store(&dir, e))?;

        for ordinal in self.list(page)? {
            self.remove(page, ordinal)?;
        }
        for (i, text) in paragraphs.iter().enumerate() {
            self.write(page, i as u32 + 1, text)?;
        }
        debug!("Saved {} paragraphs to {}", paragraphs.len(), dir.display());
        Ok(())
    }

    /// Restore dense `1..=count` numbering on `page`, keeping relative order.
    ///
    /// Renaming in place can collide (`3 → 2` while `2` still exists), so
    /// every record is first moved into the staging namespace and only then
    /// committed to its final name. Returns the new file names in order.
    pub fn renumber(&self, page: usize) -> Result<Vec<String>, Pdf2ParaError> {
        let ordinals = self.list(page)?;
        let final_names: Vec<String> = (1..=ordinals.len() as u32)
            .map(paragraph_file_name)
            .collect();

        let already_dense = ordinals
            .iter()
            .enumerate()
            .all(|(i, &ordinal)| ordinal == i as u32 + 1);
        if already_dense {
            return Ok(final_names);
        }

        let dir = self.page_dir(page);
        let mut staged = Vec::with_capacity(ordinals.len());
        for (i, &ordinal) in ordinals.iter().enumerate() {
            let from = dir.join(paragraph_file_name(ordinal));
            let to = dir.join(format!("{STAGING_PREFIX}{}{PARAGRAPH_EXT}", i + 1));
            fs::rename(&from, &to).map_err(|e| Pdf2ParaError::store(&from, e))?;
            staged.push(to);
        }
        for (staged_path, name) in staged.iter().zip(&final_names) {
            let to = dir.join(name);
            fs::rename(staged_path, &to).map_err(|e| Pdf2ParaError::store(staged_path, e))?;
        }

        debug!("Renumbered page {}: {} paragraphs", page, final_names.len());
        Ok(final_names)
    }
}
