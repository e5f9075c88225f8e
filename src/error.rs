//! Error types for the edgequake-pdf2para library.
//!
//! Extraction is strictly sequential and every stage feeds the next, so there
//! is a single fatal error type, [`Pdf2ParaError`]. A failed model call on
//! page 7 aborts the run: stitching half-extracted pages would produce merges
//! against a page that never got its paragraphs.
//!
//! Recoverable conditions never surface here. A paragraph file that vanished
//! between listing and reading, or a page directory that does not exist, are
//! handled where they happen (see [`crate::stitch`]).

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2para library.
#[derive(Debug, Error)]
pub enum Pdf2ParaError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// A requested page lies outside the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium failed to rasterise a page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// pdfium failed to extract the text layer of a page.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error.
    #[error("LLM API error ({context}): {message}")]
    LlmApiError { context: String, message: String },

    /// A model call did not answer within the configured timeout.
    #[error("LLM call timed out after {secs}s ({context})")]
    ApiTimeout { context: String, secs: u64 },

    // ── Paragraph store errors ────────────────────────────────────────────
    /// Reading, writing, renaming or deleting a paragraph record failed.
    #[error("Paragraph store I/O failed at '{path}': {source}")]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install pdfium for your platform, or point PDFIUM_LIB_PATH at the directory\n\
that contains libpdfium (pdfium.dll on Windows).\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2ParaError {
    /// Wrap an I/O error raised while touching `path` in the paragraph store.
    pub(crate) fn store(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Pdf2ParaError::StoreIo {
            path: path.into(),
            source,
        }
    }
}
