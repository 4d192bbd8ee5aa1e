//! Input resolution: turn a user-supplied page reference into an attachment
//! source string (`data:` URI or remote URL).
//!
//! | Input | Resolution |
//! |-------|------------|
//! | `data:…` | passed through |
//! | `http(s)://…` image | passed through; the provider fetches it |
//! | local image file | read and wrapped in a data URI |
//! | PDF (local or URL) + page number | rasterised via pdfium, PNG data URI |
//!
//! ## Why download PDFs to a temp dir?
//!
//! pdfium requires a file-system path. Downloading to a `TempDir` gives us a
//! path pdfium can open while ensuring cleanup happens when
//! `ResolvedInput` is dropped, even on early return.

use crate::config::ServiceConfig;
use crate::error::Page2MdError;
use crate::pipeline::{encode, render};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// A PDF available on the local file system.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; the PDF was downloaded to a temp directory that lives
    /// as long as this value.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Get the path to the PDF file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// `true` if the input names a PDF by extension (path or URL path).
pub fn looks_like_pdf(input: &str) -> bool {
    let path = input.split(['?', '#']).next().unwrap_or(input);
    path.to_ascii_lowercase().ends_with(".pdf")
}

/// Resolve a page reference to an attachment source.
///
/// `pdf_page` (1-indexed) forces PDF handling; a `.pdf` input without it
/// defaults to page 1.
pub async fn resolve_page_source(
    input: &str,
    pdf_page: Option<usize>,
    config: &ServiceConfig,
) -> Result<String, Page2MdError> {
    if encode::is_data_uri(input) {
        return Ok(input.to_string());
    }

    if pdf_page.is_some() || looks_like_pdf(input) {
        let page = pdf_page.unwrap_or(1);
        let resolved = resolve_pdf(input, config.download_timeout_secs).await?;
        let image = render::render_page(resolved.path(), page, config.max_rendered_pixels).await?;
        return encode::encode_page(&image).map_err(|e| Page2MdError::RasterisationFailed {
            page,
            detail: format!("Image encoding failed: {}", e),
        });
    }

    if is_url(input) {
        debug!("Forwarding remote page image: {}", input);
        return Ok(input.to_string());
    }

    let path = PathBuf::from(input);
    if !path.is_file() {
        return Err(Page2MdError::InvalidInput {
            input: input.to_string(),
        });
    }
    let bytes = tokio::fs::read(&path).await?;
    debug!("Read page image {} ({} bytes)", path.display(), bytes.len());
    encode::image_bytes_to_data_uri(&bytes)
}

/// Resolve a PDF path or URL to a local file.
pub async fn resolve_pdf(input: &str, timeout_secs: u64) -> Result<ResolvedInput, Page2MdError> {
    if is_url(input) {
        return download_url(input, timeout_secs).await;
    }
    let path = PathBuf::from(input);
    if !path.exists() {
        return Err(Page2MdError::FileNotFound { path });
    }
    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, Page2MdError> {
    info!("Downloading PDF from: {}", url);
    let failed = |reason: String| Page2MdError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            failed(format!("timed out after {timeout_secs}s"))
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

    let temp_dir = TempDir::new()?;
    let file_path = temp_dir.path().join("downloaded.pdf");
    tokio::fs::write(&file_path, &bytes).await?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}
