//! Error types for the page2md library.
//!
//! There is exactly one fatal error type, [`Page2MdError`]. What is *not* in
//! here matters as much as what is: a model reply that is not valid JSON, or
//! that lacks the expected keys, never becomes an error. The response
//! extractor turns it into a degraded [`crate::output::ConversionResult`]
//! instead (see [`crate::pipeline::extract`]).
//!
//! Errors fall into two buckets, exposed through
//! [`Page2MdError::is_client_error`]:
//!
//! * **Validation**: the caller sent something we refuse to process
//!   (missing `imageUrl`, disallowed file type, oversize upload). Safe to
//!   echo back verbatim.
//! * **Dependency faults**: the model gateway, an extraction library or the
//!   filesystem failed. Logged with full detail; callers only see a generic
//!   message.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the page2md library.
#[derive(Debug, Error)]
pub enum Page2MdError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// A required request field was absent.
    #[error("Missing required field '{field}'")]
    MissingField { field: &'static str },

    /// The uploaded file's extension is not on the allow-list.
    #[error("Unsupported file type '{extension}'. Allowed types: {allowed}")]
    UnsupportedFileType { extension: String, allowed: String },

    /// The uploaded file exceeds the configured ceiling.
    #[error("File is too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    /// The request body could not be understood.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The input string is not a file path, data URI or HTTP/HTTPS URL.
    #[error("Invalid input '{input}': not a file path, data URI or HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API kept failing after every retry.
    #[error("LLM API error after {retries} retries: {message}")]
    LlmApiError { retries: u32, message: String },

    /// Every attempt of the LLM call timed out.
    #[error("LLM call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// A text extraction library failed on the given document.
    #[error("Text extraction failed for '{path}': {detail}")]
    ExtractionFailed { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    /// pdfium could not load or rasterise the requested page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// A remote page source could not be downloaded.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Temp-file or local file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Page2MdError {
    /// `true` when the caller is at fault and the message is safe to show.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Page2MdError::MissingField { .. }
                | Page2MdError::UnsupportedFileType { .. }
                | Page2MdError::FileTooLarge { .. }
                | Page2MdError::InvalidRequest(_)
                | Page2MdError::InvalidInput { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_display() {
        let e = Page2MdError::MissingField { field: "imageUrl" };
        assert_eq!(e.to_string(), "Missing required field 'imageUrl'");
        assert!(e.is_client_error());
    }

    #[test]
    fn unsupported_type_lists_allowed() {
        let e = Page2MdError::UnsupportedFileType {
            extension: ".exe".into(),
            allowed: ".pdf, .docx".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains(".exe"), "got: {msg}");
        assert!(msg.contains(".pdf, .docx"), "got: {msg}");
        assert!(e.is_client_error());
    }

    #[test]
    fn dependency_faults_are_not_client_errors() {
        let e = Page2MdError::LlmApiError {
            retries: 3,
            message: "503".into(),
        };
        assert!(!e.is_client_error());
        assert!(e.to_string().contains("3 retries"));

        let e = Page2MdError::ExtractionFailed {
            path: PathBuf::from("/tmp/x.pdf"),
            detail: "bad xref".into(),
        };
        assert!(!e.is_client_error());
    }

    #[test]
    fn api_timeout_display() {
        let e = Page2MdError::ApiTimeout { secs: 60 };
        assert!(e.to_string().contains("60s"));
    }
}
