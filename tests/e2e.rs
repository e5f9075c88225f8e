//! End-to-end tests against real PDFs and a live model.
//!
//! PDFs are read from `./test_cases/`; every test is skipped unless
//! `E2E_ENABLED` is set, because they need pdfium and an API key.
//!
//! Run with:
//!   E2E_ENABLED=1 DYLD_LIBRARY_PATH=. cargo test --test e2e -- --nocapture

use edgequake_pdf2para::{
    extract, inspect, ExtractionConfig, ExtractionProgressCallback, InputMode, PageSelection,
    ParagraphStore, StitchEvent, StitchOptions,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip this test if E2E_ENABLED is not set or the PDF at `path` is missing.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP: test file not found: {}", p.display());
            return;
        }
        p
    }};
}

/// Every page directory holds paragraph_1..N with no gaps and no staging files.
fn assert_dense(store: &ParagraphStore, pages: &[usize]) {
    for &page in pages {
        let ordinals = store.list(page).expect("list page");
        let expected: Vec<u32> = (1..=ordinals.len() as u32).collect();
        assert_eq!(ordinals, expected, "page {page} is not densely numbered");

        for entry in std::fs::read_dir(store.page_dir(page)).expect("read page dir") {
            let name = entry.expect("dir entry").file_name();
            let name = name.to_string_lossy();
            assert!(
                !name.contains("staging"),
                "page {page} has leftover staging file {name}"
            );
        }
    }
}

#[derive(Default)]
struct Counter {
    pages: AtomicUsize,
    stitch_events: AtomicUsize,
}

impl ExtractionProgressCallback for Counter {
    fn on_page_complete(&self, _page: usize, _total: usize, _kept: usize) {
        self.pages.fetch_add(1, Ordering::SeqCst);
    }

    fn on_stitch_event(&self, _event: &StitchEvent) {
        self.stitch_events.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Inspect (pdfium only) ────────────────────────────────────────────────────

#[tokio::test]
async fn test_inspect_arxiv_paper() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));

    let meta = inspect(path.to_str().unwrap(), None)
        .await
        .expect("inspect() should succeed");

    assert_eq!(meta.page_count, 15, "Attention paper should have 15 pages");
    assert!(!meta.pdf_version.is_empty());
}

// ── Extraction (needs an API key) ────────────────────────────────────────────

#[tokio::test]
async fn test_extract_first_pages_and_stitch() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));
    let out = TempDir::new().unwrap();
    let counter = Arc::new(Counter::default());

    let config = ExtractionConfig::builder()
        .pages(PageSelection::Range(1, 3))
        .output_dir(out.path())
        .throttle_ms(500)
        .max_retries(2)
        .progress_callback(counter.clone())
        .build()
        .expect("valid config");

    let output = extract(path.to_str().unwrap(), &config)
        .await
        .expect("extraction should succeed");

    assert_eq!(output.stats.processed_pages, 3);
    assert_eq!(counter.pages.load(Ordering::SeqCst), 3);
    assert!(output.stats.stored_paragraphs > 0, "expected some paragraphs");

    let report = output.stitch.expect("stitching enabled by default");
    assert_eq!(
        counter.stitch_events.load(Ordering::SeqCst),
        report.total_changes()
    );

    let store = ParagraphStore::new(out.path());
    assert_dense(&store, &[1, 2, 3]);
    for page in 1..=3 {
        for text in store.load_page(page).unwrap() {
            assert!(!text.contains("[[PARAGRAPH"), "marker leaked into {text:?}");
        }
    }
}

#[tokio::test]
async fn test_extract_text_mode_without_stitching() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));
    let out = TempDir::new().unwrap();

    let config = ExtractionConfig::builder()
        .pages(PageSelection::Single(2))
        .input_mode(InputMode::Text)
        .stitch(StitchOptions::disabled())
        .min_paragraph_len(50)
        .output_dir(out.path())
        .build()
        .expect("valid config");

    let output = extract(path.to_str().unwrap(), &config)
        .await
        .expect("extraction should succeed");

    assert!(output.stitch.is_none());
    let page = &output.pages[0];
    assert_eq!(page.page_num, 2);
    assert_eq!(
        page.raw_paragraphs,
        page.kept_paragraphs + page.filtered.len()
    );

    let store = ParagraphStore::new(out.path());
    for text in store.load_page(2).unwrap() {
        assert!(text.trim().chars().count() >= 50);
    }
}

#[tokio::test]
async fn test_page_beyond_document_is_rejected() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));
    let out = TempDir::new().unwrap();

    let config = ExtractionConfig::builder()
        .pages(PageSelection::Single(999))
        .output_dir(out.path())
        .build()
        .expect("valid config");

    let err = extract(path.to_str().unwrap(), &config)
        .await
        .expect_err("page 999 does not exist");
    assert!(err.to_string().contains("999"));
}
