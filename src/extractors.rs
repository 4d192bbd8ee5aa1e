//! Concrete [`TextExtractor`]s.
//!
//! All three are blocking and stateless. pdfium is bound per call, like the
//! page renderer.

use crate::dispatch::TextExtractor;
use crate::error::Page2MdError;
use crate::pipeline::render::bind_pdfium;
use std::path::Path;
use tracing::debug;

/// Paginated documents: the text layer of every page, separated by a blank line.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumTextExtractor;

impl TextExtractor for PdfiumTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, Page2MdError> {
        let pdfium = bind_pdfium()?;
        let failed = |detail: String| Page2MdError::ExtractionFailed {
            path: path.to_path_buf(),
            detail,
        };

        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| failed(format!("{:?}", e)))?;

        let mut pages_text = Vec::new();
        for (index, page) in document.pages().iter().enumerate() {
            let text = page
                .text()
                .map_err(|e| failed(format!("page {}: {:?}", index + 1, e)))?;
            pages_text.push(text.all());
        }

        debug!("Extracted text layer of {} pages", pages_text.len());
        Ok(pages_text.join("\n\n"))
    }
}

/// Word-processor documents via `docx-lite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxTextExtractor;

impl TextExtractor for DocxTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, Page2MdError> {
        docx_lite::extract_text(path).map_err(|e| Page2MdError::ExtractionFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}

/// Plain text and source code: bytes decoded as UTF-8, invalid sequences
/// replaced.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughExtractor;

impl TextExtractor for PassthroughExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, Page2MdError> {
        let bytes = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
