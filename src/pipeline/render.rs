//! Page access via pdfium: rasterise a page, read its text layer, or read
//! document metadata.
//!
//! pdfium is a blocking C++ library with thread-local state, so every entry
//! point here hops onto `spawn_blocking`. Pages are opened one at a time as
//! the sequential pipeline reaches them; nothing is pre-rendered.

use crate::config::ExtractionConfig;
use crate::error::Pdf2ParaError;
use crate::output::DocumentMetadata;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bind to the pdfium shared library.
///
/// `PDFIUM_LIB_PATH` may name the library file itself or the directory that
/// holds it; otherwise the system library search path is used.
pub fn bind_pdfium() -> Result<Pdfium, Pdf2ParaError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => {
            let path = PathBuf::from(path);
            let library = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            Pdfium::bind_to_library(library)
        }
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| Pdf2ParaError::PdfiumBindingFailed(format!("{e:?}")))?;

    Ok(Pdfium::new(bindings))
}

fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, Pdf2ParaError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.to_lowercase().contains("password") {
            if password.is_some() {
                Pdf2ParaError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                Pdf2ParaError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            Pdf2ParaError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// Look up a 1-indexed page, failing with `PageOutOfRange` outside the document.
fn page_at<'a>(
    document: &PdfDocument<'a>,
    page_num: usize,
) -> Result<PdfPage<'a>, Pdf2ParaError> {
    let total = document.pages().len() as usize;
    if page_num == 0 || page_num > total {
        return Err(Pdf2ParaError::PageOutOfRange {
            page: page_num,
            total,
        });
    }
    document
        .pages()
        .get((page_num - 1) as u16)
        .map_err(|e| Pdf2ParaError::RasterisationFailed {
            page: page_num,
            detail: format!("{:?}", e),
        })
}

/// Rasterise one page (1-indexed) at the configured DPI, capped to
/// `max_rendered_pixels` on either edge.
pub async fn render_page(
    pdf_path: &Path,
    page_num: usize,
    config: &ExtractionConfig,
) -> Result<DynamicImage, Pdf2ParaError> {
    let path = pdf_path.to_path_buf();
    let scale = config.dpi as f32 / 72.0;
    let max_pixels = config.max_rendered_pixels as i32;
    let password = config.password.clone();

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let document = open_document(&pdfium, &path, password.as_deref())?;
        let page = page_at(&document, page_num)?;

        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(scale)
            .set_maximum_width(max_pixels)
            .set_maximum_height(max_pixels);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| Pdf2ParaError::RasterisationFailed {
                page: page_num,
                detail: format!("{:?}", e),
            })?;
        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page_num,
            image.width(),
            image.height()
        );
        Ok(image)
    })
    .await
    .map_err(|e| Pdf2ParaError::Internal(format!("Render task panicked: {}", e)))?
}

/// Read the text layer of one page (1-indexed).
pub async fn page_text(
    pdf_path: &Path,
    page_num: usize,
    password: Option<&str>,
) -> Result<String, Pdf2ParaError> {
    let path = pdf_path.to_path_buf();
    let password = password.map(str::to_string);

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let document = open_document(&pdfium, &path, password.as_deref())?;
        let page = page_at(&document, page_num)?;

        let text = page
            .text()
            .map_err(|e| Pdf2ParaError::TextExtractionFailed {
                page: page_num,
                detail: format!("{:?}", e),
            })?
            .all();
        debug!("Page {}: {} chars of text", page_num, text.chars().count());
        Ok(text)
    })
    .await
    .map_err(|e| Pdf2ParaError::Internal(format!("Text task panicked: {}", e)))?
}

/// Extract document metadata without rendering pages.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2ParaError> {
    let path = pdf_path.to_path_buf();
    let password = password.map(str::to_string);

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let document = open_document(&pdfium, &path, password.as_deref())?;
        let metadata = document.metadata();

        let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
            metadata
                .get(tag)
                .map(|t| t.value().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(DocumentMetadata {
            title: get_meta(PdfDocumentMetadataTagType::Title),
            author: get_meta(PdfDocumentMetadataTagType::Author),
            subject: get_meta(PdfDocumentMetadataTagType::Subject),
            creator: get_meta(PdfDocumentMetadataTagType::Creator),
            producer: get_meta(PdfDocumentMetadataTagType::Producer),
            page_count: document.pages().len() as usize,
            pdf_version: format!("{:?}", document.version()),
        })
    })
    .await
    .map_err(|e| Pdf2ParaError::Internal(format!("Metadata task panicked: {}", e)))?
}
