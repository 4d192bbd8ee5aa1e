//! Entry points for the two operations.
//!
//! * [`transcribe_page`] / [`transcribe_image`]: compose a transcript, hand
//!   it to a [`TranscriptGateway`], extract a [`ConversionResult`] from the
//!   continuation. The gateway call is the only suspension point.
//! * [`convert_file`] / [`convert_upload`]: the file dispatch path. It never
//!   touches a transcript.
//!
//! ## Temp-file lifecycle
//!
//! Extractors need a path, so uploads are written to a `NamedTempFile` that
//! keeps the original suffix. The file is closed explicitly after extraction
//! whatever the outcome; a failed delete is logged and otherwise ignored
//! because the response is already decided.

use crate::config::{normalise_extension, ServiceConfig};
use crate::dispatch::{self, DocumentKind, Extractors};
use crate::error::Page2MdError;
use crate::output::{ConversionResult, FileConversionOutput};
use crate::pipeline::compose::compose_transcript;
use crate::pipeline::extract::extract_result;
use crate::pipeline::llm::TranscriptGateway;
use crate::redact::{redact_str, redact_value};
use crate::request::{ConversionRequest, TranscribeImageInput};
use std::path::Path;
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Transcribe one page whose image is at `page_source` (data URI or URL).
///
/// Gateway failures propagate unchanged. A reply the model got wrong is not a
/// failure: see [`crate::pipeline::extract`].
pub async fn transcribe_page(
    gateway: &dyn TranscriptGateway,
    config: &ServiceConfig,
    request: &ConversionRequest,
    page_source: &str,
) -> Result<ConversionResult, Page2MdError> {
    let start = Instant::now();
    let model = config.model_for(request.model_name.as_deref());
    let transcript = compose_transcript(request, page_source);
    debug!(
        "Composed {} messages for model {}",
        transcript.len(),
        model
    );

    let continuation = gateway.extend_transcript(model, &transcript).await?;
    let result = extract_result(&continuation, request.describe);

    info!(
        "Transcribed page with {} in {:?} ({} chars, first page: {})",
        model,
        start.elapsed(),
        result.markdown.len(),
        result.is_first_page
    );
    Ok(result)
}

/// The transcribe-image operation: validate the wire body, then
/// [`transcribe_page`].
pub async fn transcribe_image(
    gateway: &dyn TranscriptGateway,
    config: &ServiceConfig,
    input: TranscribeImageInput,
) -> Result<ConversionResult, Page2MdError> {
    let (request, image_url) = input.into_parts()?;

    if let Ok(view) = serde_json::to_value(&request) {
        info!(
            "transcribe-image: imageUrl={} request={}",
            redact_str(&image_url),
            redact_value(&view)
        );
    }

    transcribe_page(gateway, config, &request, &image_url).await
}

/// The convert-file operation on a file already on disk.
pub async fn convert_file(
    path: &Path,
    extractors: &Extractors,
    config: &ServiceConfig,
) -> Result<FileConversionOutput, Page2MdError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let kind = dispatch::resolve_kind(ext, config)?;
    if !path.is_file() {
        return Err(Page2MdError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let markdown_content = dispatch::extract(extractors, kind, path).await?;
    info!(
        "Converted {} ({}): {} chars",
        path.display(),
        kind,
        markdown_content.len()
    );
    Ok(FileConversionOutput { markdown_content })
}

/// The convert-file operation on uploaded bytes.
///
/// Size and extension are checked before anything touches the file system.
pub async fn convert_upload(
    bytes: &[u8],
    filename: &str,
    extractors: &Extractors,
    config: &ServiceConfig,
) -> Result<FileConversionOutput, Page2MdError> {
    info!("convert-file: name={:?} size={} bytes", filename, bytes.len());

    let size = bytes.len() as u64;
    if size > config.max_upload_bytes {
        return Err(Page2MdError::FileTooLarge {
            size,
            limit: config.max_upload_bytes,
        });
    }

    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(normalise_extension)
        .unwrap_or_default();
    let kind = dispatch::resolve_kind(&ext, config)?;

    let temp = tempfile::Builder::new()
        .prefix("page2md-")
        .suffix(&format!(".{ext}"))
        .tempfile()?;

    let outcome = write_and_extract(&temp, bytes, kind, extractors).await;

    let temp_path = temp.path().to_path_buf();
    if let Err(e) = temp.close() {
        warn!("Failed to delete temp file {}: {}", temp_path.display(), e);
    }

    let markdown_content = outcome?;
    info!("Converted upload {:?} ({}): {} chars", filename, kind, markdown_content.len());
    Ok(FileConversionOutput { markdown_content })
}

async fn write_and_extract(
    temp: &NamedTempFile,
    bytes: &[u8],
    kind: DocumentKind,
    extractors: &Extractors,
) -> Result<String, Page2MdError> {
    tokio::fs::write(temp.path(), bytes).await?;
    dispatch::extract(extractors, kind, temp.path()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::TextExtractor;
    use crate::transcript::{Message, Transcript};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    struct Echo(&'static str);

    #[async_trait]
    impl TranscriptGateway for Echo {
        async fn extend_transcript(
            &self,
            _model: &str,
            _transcript: &Transcript,
        ) -> Result<Transcript, Page2MdError> {
            Ok(Transcript::empty().append(Message::assistant(self.0)))
        }
    }

    /// Records the path it was handed so tests can check cleanup.
    #[derive(Default)]
    struct SeenPath(Mutex<Option<PathBuf>>);

    impl TextExtractor for SeenPath {
        fn extract_text(&self, path: &Path) -> Result<String, Page2MdError> {
            *self.0.lock().unwrap() = Some(path.to_path_buf());
            Err(Page2MdError::ExtractionFailed {
                path: path.to_path_buf(),
                detail: "boom".into(),
            })
        }
    }

    #[tokio::test]
    async fn transcribe_page_runs_the_pipeline() {
        let config = ServiceConfig::default();
        let request = ConversionRequest::default().with_describe(false);
        let result = transcribe_page(
            &Echo(r##"{"markdown":"# Hi","isFirstPage":true}"##),
            &config,
            &request,
            "data:image/png;base64,AA",
        )
        .await
        .unwrap();
        assert_eq!(result.markdown, "# Hi");
        assert!(result.is_first_page);
        assert_eq!(result.description, None);
    }

    #[tokio::test]
    async fn transcribe_image_requires_image_url() {
        let config = ServiceConfig::default();
        let err = transcribe_image(&Echo("{}"), &config, TranscribeImageInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Page2MdError::MissingField { .. }));
    }

    #[tokio::test]
    async fn upload_too_large_is_rejected() {
        let config = ServiceConfig::builder().max_upload_bytes(4).build().unwrap();
        let err = convert_upload(b"12345", "a.txt", &Extractors::default(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, Page2MdError::FileTooLarge { size: 5, limit: 4 }));
    }

    #[tokio::test]
    async fn upload_passthrough_keeps_text() {
        let config = ServiceConfig::default();
        let out = convert_upload(b"a,b\n1,2\n", "table.CSV", &Extractors::default(), &config)
            .await
            .unwrap();
        assert_eq!(out.markdown_content, "a,b\n1,2\n");
    }

    #[tokio::test]
    async fn temp_file_removed_when_extraction_fails() {
        let seen = Arc::new(SeenPath::default());
        let extractors = Extractors {
            passthrough: seen.clone(),
            ..Extractors::default()
        };
        let config = ServiceConfig::default();

        let err = convert_upload(b"x", "notes.txt", &extractors, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, Page2MdError::ExtractionFailed { .. }));

        let path = seen.0.lock().unwrap().clone().expect("extractor was called");
        assert!(path.to_string_lossy().ends_with(".txt"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn convert_file_rejects_before_opening() {
        let config = ServiceConfig::default();
        let err = convert_file(Path::new("/no/such/tool.exe"), &Extractors::default(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, Page2MdError::UnsupportedFileType { .. }));
    }
}
