//! Turn the user's `input` argument into a local PDF path.
//!
//! pdfium opens files by path, so a URL is fetched into a `TempDir` that lives
//! as long as the [`PdfSource`]. Both branches check the `%PDF` header before
//! handing the path on; a misnamed HTML error page fails here with `NotAPdf`
//! instead of deep inside pdfium.

use crate::error::Pdf2ParaError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";
const FALLBACK_FILE_NAME: &str = "input.pdf";

/// A PDF on local disk, possibly backed by a temporary download.
#[derive(Debug)]
pub enum PdfSource {
    Local(PathBuf),
    Downloaded {
        path: PathBuf,
        /// Held so the download is removed only when the source is dropped.
        _dir: TempDir,
    },
}

impl PdfSource {
    pub fn path(&self) -> &Path {
        match self {
            PdfSource::Local(path) => path,
            PdfSource::Downloaded { path, .. } => path,
        }
    }

    /// Whether the PDF was fetched from a URL.
    pub fn is_download(&self) -> bool {
        matches!(self, PdfSource::Downloaded { .. })
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` (path or http(s) URL) to a readable PDF file.
pub async fn resolve_input(input: &str, download_timeout_secs: u64) -> Result<PdfSource, Pdf2ParaError> {
    if is_url(input) {
        download(input, download_timeout_secs).await
    } else {
        open_local(Path::new(input))
    }
}

fn check_magic(path: &Path, head: &[u8]) -> Result<(), Pdf2ParaError> {
    if head.len() < PDF_MAGIC.len() || &head[..PDF_MAGIC.len()] != PDF_MAGIC {
        let mut magic = [0u8; 4];
        let n = head.len().min(4);
        magic[..n].copy_from_slice(&head[..n]);
        return Err(Pdf2ParaError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

fn open_local(path: &Path) -> Result<PdfSource, Pdf2ParaError> {
    let mut file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Pdf2ParaError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Pdf2ParaError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    if file.metadata().map(|m| m.is_dir()).unwrap_or(false) {
        return Err(Pdf2ParaError::InvalidInput {
            input: path.display().to_string(),
        });
    }

    let mut head = Vec::with_capacity(PDF_MAGIC.len());
    file.by_ref()
        .take(PDF_MAGIC.len() as u64)
        .read_to_end(&mut head)
        .map_err(|e| Pdf2ParaError::store(path, e))?;
    check_magic(path, &head)?;

    debug!("Using local PDF {}", path.display());
    Ok(PdfSource::Local(path.to_path_buf()))
}

async fn download(url: &str, timeout_secs: u64) -> Result<PdfSource, Pdf2ParaError> {
    info!("Downloading {}", url);

    let failed = |reason: String| Pdf2ParaError::DownloadFailed {
        url: url.to_string(),
        reason,
    };
    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            Pdf2ParaError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Pdf2ParaError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(classify)?;
    let status = response.status();
    if !status.is_success() {
        return Err(failed(format!("HTTP {status}")));
    }
    let bytes = response.bytes().await.map_err(classify)?;

    let dir = TempDir::new().map_err(|e| Pdf2ParaError::Internal(format!("temp dir: {e}")))?;
    let path = dir.path().join(file_name_from_url(url));
    check_magic(&path, &bytes)?;

    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| Pdf2ParaError::store(&path, e))?;

    info!("Downloaded {} bytes to {}", bytes.len(), path.display());
    Ok(PdfSource::Downloaded { path, _dir: dir })
}

/// Last path segment of `url` if it looks like a file name, else a fallback.
fn file_name_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty() && name.contains('.'))
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}
