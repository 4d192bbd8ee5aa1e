//! Result types returned to callers.

use serde::{Deserialize, Serialize};

/// Normalised transcription of one page.
///
/// `markdown` and `is_first_page` are always present. `description` is
/// present exactly when the request asked for one; `tags` only when the model
/// returned an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub markdown: String,
    pub is_first_page: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl ConversionResult {
    /// A result carrying only Markdown, with `is_first_page = false`.
    pub fn markdown_only(markdown: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
            is_first_page: false,
            description: None,
            tags: None,
        }
    }
}

/// Output of the convert-file operation: the extracted text, unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConversionOutput {
    pub markdown_content: String,
}
