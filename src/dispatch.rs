//! File dispatch: declared extension → extraction strategy.
//!
//! The extension is resolved once into a closed [`DocumentKind`]; unknown or
//! disallowed extensions are rejected by [`resolve_kind`] before any file is
//! opened. The extracted text is returned unmodified, no Markdown conversion
//! happens on this path.

use crate::config::{normalise_extension, ServiceConfig};
use crate::error::Page2MdError;
use crate::extractors::{DocxTextExtractor, PassthroughExtractor, PdfiumTextExtractor};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Extensions whose bytes are returned as text verbatim.
pub const PASSTHROUGH_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "csv", "tsv", "json", "xml", "html", "htm", "yaml", "yml", "toml",
    "ini", "cfg", "log", "js", "mjs", "ts", "jsx", "tsx", "py", "rs", "go", "java", "kt", "swift",
    "c", "h", "cpp", "hpp", "cs", "rb", "php", "sh", "sql", "css", "scss",
];

/// The three extraction strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// Paginated document (PDF).
    Paginated,
    /// Word-processor document (DOCX).
    WordProcessor,
    /// Plain text and source code.
    Passthrough,
}

impl DocumentKind {
    /// Map an extension (with or without the leading dot, any case) to a kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = normalise_extension(ext);
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Paginated),
            "docx" => Some(DocumentKind::WordProcessor),
            e if PASSTHROUGH_EXTENSIONS.contains(&e) => Some(DocumentKind::Passthrough),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::Paginated => "paginated",
            DocumentKind::WordProcessor => "word-processor",
            DocumentKind::Passthrough => "passthrough",
        };
        f.write_str(name)
    }
}

/// Capability that turns a file on disk into plain text.
///
/// Implementations are blocking; [`extract`] moves them off the async runtime.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String, Page2MdError>;
}

/// One extractor per [`DocumentKind`].
#[derive(Clone)]
pub struct Extractors {
    pub paginated: Arc<dyn TextExtractor>,
    pub word_processor: Arc<dyn TextExtractor>,
    pub passthrough: Arc<dyn TextExtractor>,
}

impl Default for Extractors {
    fn default() -> Self {
        Self {
            paginated: Arc::new(PdfiumTextExtractor),
            word_processor: Arc::new(DocxTextExtractor),
            passthrough: Arc::new(PassthroughExtractor),
        }
    }
}

impl fmt::Debug for Extractors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractors").finish_non_exhaustive()
    }
}

impl Extractors {
    pub fn for_kind(&self, kind: DocumentKind) -> Arc<dyn TextExtractor> {
        match kind {
            DocumentKind::Paginated => Arc::clone(&self.paginated),
            DocumentKind::WordProcessor => Arc::clone(&self.word_processor),
            DocumentKind::Passthrough => Arc::clone(&self.passthrough),
        }
    }
}

/// Validate an extension against the allow-list and resolve its kind.
pub fn resolve_kind(ext: &str, config: &ServiceConfig) -> Result<DocumentKind, Page2MdError> {
    let unsupported = || Page2MdError::UnsupportedFileType {
        extension: format!(".{}", normalise_extension(ext)),
        allowed: config.allowed_extensions_display(),
    };

    if !config.is_allowed_extension(ext) {
        return Err(unsupported());
    }
    DocumentKind::from_extension(ext).ok_or_else(unsupported)
}

/// Run the extractor for `kind` on a blocking thread.
pub async fn extract(
    extractors: &Extractors,
    kind: DocumentKind,
    path: &Path,
) -> Result<String, Page2MdError> {
    let extractor = extractors.for_kind(kind);
    let path: PathBuf = path.to_path_buf();
    debug!("Extracting {} as {}", path.display(), kind);

    tokio::task::spawn_blocking(move || extractor.extract_text(&path))
        .await
        .map_err(|e| Page2MdError::Internal(format!("Extraction task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_from_extension() {
        assert_eq!(DocumentKind::from_extension("pdf"), Some(DocumentKind::Paginated));
        assert_eq!(DocumentKind::from_extension(".PDF"), Some(DocumentKind::Paginated));
        assert_eq!(
            DocumentKind::from_extension("docx"),
            Some(DocumentKind::WordProcessor)
        );
        assert_eq!(DocumentKind::from_extension("rs"), Some(DocumentKind::Passthrough));
        assert_eq!(DocumentKind::from_extension("exe"), None);
        assert_eq!(DocumentKind::from_extension(""), None);
    }

    #[test]
    fn every_default_extension_has_a_kind() {
        for ext in crate::config::DEFAULT_ALLOWED_EXTENSIONS {
            assert!(DocumentKind::from_extension(ext).is_some(), "{ext}");
        }
    }

    #[test]
    fn resolve_rejects_disallowed() {
        let config = ServiceConfig::default();
        let err = resolve_kind(".exe", &config).unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains(".exe"));
    }

    #[test]
    fn resolve_respects_narrowed_allow_list() {
        let config = ServiceConfig::builder()
            .allowed_extensions(["pdf"])
            .build()
            .unwrap();
        assert_eq!(resolve_kind("pdf", &config).unwrap(), DocumentKind::Paginated);
        // Known kind, but not on this deployment's list.
        assert!(matches!(
            resolve_kind("txt", &config),
            Err(Page2MdError::UnsupportedFileType { .. })
        ));
    }

    #[tokio::test]
    async fn passthrough_extraction_runs_off_thread() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello\nworld").unwrap();

        let text = extract(&Extractors::default(), DocumentKind::Passthrough, &path)
            .await
            .unwrap();
        assert_eq!(text, "hello\nworld");
    }
}
