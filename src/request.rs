//! Per-call request types.
//!
//! [`ConversionRequest`] holds everything a caller can say about one page.
//! Field *presence* is what matters downstream: `Some("")` is still rendered
//! into the prompt, only `None` suppresses a section.
//!
//! [`TranscribeImageInput`] is the loosely-typed wire shape of the
//! transcribe-image operation; [`TranscribeImageInput::into_parts`] turns it
//! into a validated request plus the page's image source.

use crate::error::Page2MdError;
use crate::tags::{parse_tag_field, TagDefinitions};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_describe() -> bool {
    true
}

/// Caller intent for a single page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    /// High-level description of the whole document.
    #[serde(default)]
    pub description: Option<String>,
    /// What the transcription will be used for.
    #[serde(default)]
    pub intent: Option<String>,
    /// How charts, figures and images should be handled.
    #[serde(default)]
    pub graphic_instructions: Option<String>,
    /// Markdown produced for the preceding page.
    #[serde(default)]
    pub preceding_markdown: Option<String>,
    /// Free-form context about the preceding page.
    #[serde(default)]
    pub preceding_context: Option<String>,
    /// Data URI or URL of the preceding page's image.
    #[serde(default, alias = "precedingImageUrl")]
    pub preceding_image_source: Option<String>,
    /// Model override; the service default applies when absent.
    #[serde(default, alias = "model")]
    pub model_name: Option<String>,
    /// Ask for a short `description` of the page. Default: true.
    #[serde(default = "default_describe")]
    pub describe: bool,
    /// Tag name → natural-language definition.
    #[serde(default)]
    pub tag_definitions: Option<TagDefinitions>,
}

impl Default for ConversionRequest {
    fn default() -> Self {
        Self {
            description: None,
            intent: None,
            graphic_instructions: None,
            preceding_markdown: None,
            preceding_context: None,
            preceding_image_source: None,
            model_name: None,
            describe: true,
            tag_definitions: None,
        }
    }
}

impl ConversionRequest {
    pub fn with_description(mut self, v: impl Into<String>) -> Self {
        self.description = Some(v.into());
        self
    }

    pub fn with_intent(mut self, v: impl Into<String>) -> Self {
        self.intent = Some(v.into());
        self
    }

    pub fn with_graphic_instructions(mut self, v: impl Into<String>) -> Self {
        self.graphic_instructions = Some(v.into());
        self
    }

    pub fn with_preceding_markdown(mut self, v: impl Into<String>) -> Self {
        self.preceding_markdown = Some(v.into());
        self
    }

    pub fn with_preceding_context(mut self, v: impl Into<String>) -> Self {
        self.preceding_context = Some(v.into());
        self
    }

    pub fn with_preceding_image(mut self, source: impl Into<String>) -> Self {
        self.preceding_image_source = Some(source.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_name = Some(model.into());
        self
    }

    pub fn with_describe(mut self, describe: bool) -> Self {
        self.describe = describe;
        self
    }

    pub fn with_tag_definitions(mut self, defs: TagDefinitions) -> Self {
        self.tag_definitions = Some(defs);
        self
    }
}

/// Wire body of the transcribe-image operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeImageInput {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub graphic_instructions: Option<String>,
    #[serde(default)]
    pub preceding_markdown: Option<String>,
    #[serde(default)]
    pub preceding_context: Option<String>,
    #[serde(default, alias = "precedingImageSource")]
    pub preceding_image_url: Option<String>,
    #[serde(default, alias = "model")]
    pub model_name: Option<String>,
    #[serde(default)]
    pub describe: Option<bool>,
    /// Either a JSON object or a string holding one.
    #[serde(default)]
    pub tags: Option<Value>,
}

impl TranscribeImageInput {
    /// Validate the body and split it into a request and the page image source.
    ///
    /// Only a missing `imageUrl` is an error. An undecodable `tags` field is
    /// logged and dropped.
    pub fn into_parts(self) -> Result<(ConversionRequest, String), Page2MdError> {
        let image_url = self
            .image_url
            .ok_or(Page2MdError::MissingField { field: "imageUrl" })?;

        let request = ConversionRequest {
            description: self.description,
            intent: self.intent,
            graphic_instructions: self.graphic_instructions,
            preceding_markdown: self.preceding_markdown,
            preceding_context: self.preceding_context,
            preceding_image_source: self.preceding_image_url,
            model_name: self.model_name,
            describe: self.describe.unwrap_or(true),
            tag_definitions: self.tags.as_ref().and_then(parse_tag_field),
        };
        Ok((request, image_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn describe_defaults_to_true() {
        assert!(ConversionRequest::default().describe);
        let r: ConversionRequest = serde_json::from_value(json!({})).unwrap();
        assert!(r.describe);
        assert_eq!(r.description, None);
    }

    #[test]
    fn empty_string_is_present() {
        let r: ConversionRequest = serde_json::from_value(json!({"intent": ""})).unwrap();
        assert_eq!(r.intent.as_deref(), Some(""));
    }

    #[test]
    fn into_parts_requires_image_url() {
        let err = TranscribeImageInput::default().into_parts().unwrap_err();
        assert!(matches!(err, Page2MdError::MissingField { field: "imageUrl" }));
        assert!(err.is_client_error());
    }

    #[test]
    fn into_parts_maps_every_field() {
        let input: TranscribeImageInput = serde_json::from_value(json!({
            "imageUrl": "https://example.org/p2.png",
            "description": "lab report",
            "intent": "indexing",
            "graphicInstructions": "describe charts",
            "precedingMarkdown": "# Page 1",
            "precedingContext": "cover page",
            "precedingImageUrl": "https://example.org/p1.png",
            "modelName": "gpt-4.1",
            "describe": false,
            "tags": "{\"diagnosis\": \"a diagnosis is stated\"}"
        }))
        .unwrap();

        let (request, image) = input.into_parts().unwrap();
        assert_eq!(image, "https://example.org/p2.png");
        assert_eq!(request.description.as_deref(), Some("lab report"));
        assert_eq!(request.intent.as_deref(), Some("indexing"));
        assert_eq!(request.graphic_instructions.as_deref(), Some("describe charts"));
        assert_eq!(request.preceding_markdown.as_deref(), Some("# Page 1"));
        assert_eq!(request.preceding_context.as_deref(), Some("cover page"));
        assert_eq!(
            request.preceding_image_source.as_deref(),
            Some("https://example.org/p1.png")
        );
        assert_eq!(request.model_name.as_deref(), Some("gpt-4.1"));
        assert!(!request.describe);
        assert_eq!(
            request.tag_definitions.unwrap()["diagnosis"],
            "a diagnosis is stated"
        );
    }

    #[test]
    fn bad_tag_string_is_not_an_error() {
        let input: TranscribeImageInput = serde_json::from_value(json!({
            "imageUrl": "data:image/png;base64,AAAA",
            "tags": "{oops"
        }))
        .unwrap();
        let (request, _) = input.into_parts().unwrap();
        assert_eq!(request.tag_definitions, None);
        assert!(request.describe);
    }
}
