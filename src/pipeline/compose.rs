//! Prompt composition: [`ConversionRequest`] + page image → [`Transcript`].
//!
//! ## Message Layout
//!
//! The transcript contains exactly two messages:
//! 1. **System message**: [`SYSTEM_PROMPT`], the fixed transcription and
//!    reply-format contract
//! 2. **User message**: the instruction text, then the preceding-page image
//!    (if any), then the current page image, always last
//!
//! ## Instruction Text
//!
//! The user text is built from [`USER_SECTIONS`], an ordered table of
//! renderers. Each renderer returns `None` when its request field is absent,
//! so the table order *is* the prompt order and each entry can be tested on
//! its own. The closing describe/no-describe instruction is always present.

use crate::prompts::{
    quoted_block, DESCRIBE_INSTRUCTION, DESCRIPTION_HEADER, GRAPHIC_INSTRUCTIONS_HEADER,
    INTENT_HEADER, NO_DESCRIPTION_INSTRUCTION, PRECEDING_CONTEXT_HEADER, PRECEDING_IMAGE_NOTE,
    PRECEDING_MARKDOWN_HEADER, SYSTEM_PROMPT,
};
use crate::request::ConversionRequest;
use crate::tags::render_tag_block;
use crate::transcript::{ContentPart, Message, Transcript};

/// Renders one optional section of the user instruction text.
type SectionRenderer = fn(&ConversionRequest) -> Option<String>;

/// Sections of the user instruction text, in prompt order.
pub const USER_SECTIONS: &[(&str, SectionRenderer)] = &[
    ("description", render_description),
    ("intent", render_intent),
    ("graphic_instructions", render_graphic_instructions),
    ("preceding_markdown", render_preceding_markdown),
    ("preceding_context", render_preceding_context),
    ("preceding_image", render_preceding_image_note),
    ("tag_definitions", render_tag_definitions),
    ("closing", render_closing),
];

/// Build the two-message transcript for one page.
pub fn compose_transcript(request: &ConversionRequest, page_source: &str) -> Transcript {
    Transcript::empty()
        .append(Message::system(SYSTEM_PROMPT))
        .append(compose_user_message(request, page_source))
}

/// The user message: instruction text, then attachments.
pub fn compose_user_message(request: &ConversionRequest, page_source: &str) -> Message {
    let mut parts = vec![ContentPart::text(compose_user_text(request))];
    if let Some(ref preceding) = request.preceding_image_source {
        parts.push(ContentPart::image(preceding.as_str()));
    }
    parts.push(ContentPart::image(page_source));
    Message::user(parts)
}

/// Concatenate every section whose field is present, separated by blank lines.
pub fn compose_user_text(request: &ConversionRequest) -> String {
    USER_SECTIONS
        .iter()
        .filter_map(|(_, render)| render(request))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Names of the sections that render for `request`, in order.
pub fn active_sections(request: &ConversionRequest) -> Vec<&'static str> {
    USER_SECTIONS
        .iter()
        .filter(|(_, render)| render(request).is_some())
        .map(|(name, _)| *name)
        .collect()
}

fn headed(header: &str, body: &str) -> String {
    format!("{header}\n{body}")
}

fn render_description(r: &ConversionRequest) -> Option<String> {
    r.description.as_deref().map(|d| headed(DESCRIPTION_HEADER, d))
}

fn render_intent(r: &ConversionRequest) -> Option<String> {
    r.intent.as_deref().map(|i| headed(INTENT_HEADER, i))
}

fn render_graphic_instructions(r: &ConversionRequest) -> Option<String> {
    r.graphic_instructions
        .as_deref()
        .map(|g| headed(GRAPHIC_INSTRUCTIONS_HEADER, g))
}

fn render_preceding_markdown(r: &ConversionRequest) -> Option<String> {
    r.preceding_markdown
        .as_deref()
        .map(|m| headed(PRECEDING_MARKDOWN_HEADER, &quoted_block(m)))
}

fn render_preceding_context(r: &ConversionRequest) -> Option<String> {
    r.preceding_context
        .as_deref()
        .map(|c| headed(PRECEDING_CONTEXT_HEADER, c))
}

fn render_preceding_image_note(r: &ConversionRequest) -> Option<String> {
    r.preceding_image_source
        .as_ref()
        .map(|_| PRECEDING_IMAGE_NOTE.to_string())
}

fn render_tag_definitions(r: &ConversionRequest) -> Option<String> {
    r.tag_definitions.as_ref().map(render_tag_block)
}

fn render_closing(r: &ConversionRequest) -> Option<String> {
    Some(if r.describe {
        DESCRIBE_INSTRUCTION.to_string()
    } else {
        NO_DESCRIPTION_INSTRUCTION.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TagDefinitions;
    use crate::transcript::{Content, Role};

    const PAGE: &str = "data:image/png;base64,CURRENT";

    fn user_parts(t: &Transcript) -> Vec<ContentPart> {
        match &t.messages()[1].content {
            Content::Parts(parts) => parts.clone(),
            Content::Text(_) => panic!("user message must be multi-part"),
        }
    }

    #[test]
    fn minimal_request_has_system_then_user() {
        let t = compose_transcript(&ConversionRequest::default(), PAGE);
        assert_eq!(t.len(), 2);
        assert_eq!(t.messages()[0], Message::system(SYSTEM_PROMPT));
        assert_eq!(t.messages()[1].role, Role::User);

        let parts = user_parts(&t);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], ContentPart::text(DESCRIBE_INSTRUCTION));
        assert_eq!(parts[1], ContentPart::image(PAGE));
    }

    #[test]
    fn preceding_image_precedes_current_page() {
        let request = ConversionRequest::default().with_preceding_image("https://x/p1.png");
        let parts = user_parts(&compose_transcript(&request, PAGE));
        assert_eq!(parts.len(), 3);
        assert!(parts[0].as_text().unwrap().contains(PRECEDING_IMAGE_NOTE));
        assert_eq!(parts[1], ContentPart::image("https://x/p1.png"));
        assert_eq!(parts[2], ContentPart::image(PAGE));
    }

    #[test]
    fn sections_follow_fixed_order() {
        let mut defs = TagDefinitions::new();
        defs.insert("diagnosis".into(), "a diagnosis is stated".into());
        let request = ConversionRequest::default()
            .with_tag_definitions(defs)
            .with_preceding_image("https://x/p1.png")
            .with_preceding_context("ctx")
            .with_preceding_markdown("# Prev")
            .with_graphic_instructions("gfx")
            .with_intent("intent")
            .with_description("desc");

        assert_eq!(
            active_sections(&request),
            vec![
                "description",
                "intent",
                "graphic_instructions",
                "preceding_markdown",
                "preceding_context",
                "preceding_image",
                "tag_definitions",
                "closing",
            ]
        );

        let text = compose_user_text(&request);
        let positions: Vec<usize> = [
            DESCRIPTION_HEADER,
            INTENT_HEADER,
            GRAPHIC_INSTRUCTIONS_HEADER,
            PRECEDING_MARKDOWN_HEADER,
            PRECEDING_CONTEXT_HEADER,
            PRECEDING_IMAGE_NOTE,
            "- diagnosis: a diagnosis is stated",
            DESCRIBE_INSTRUCTION,
        ]
        .iter()
        .map(|needle| text.find(needle).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    }

    #[test]
    fn empty_string_still_renders() {
        let request = ConversionRequest::default().with_intent("");
        assert_eq!(active_sections(&request), vec!["intent", "closing"]);
        assert!(compose_user_text(&request).starts_with(&format!("{INTENT_HEADER}\n")));
    }

    #[test]
    fn closing_depends_on_describe() {
        let with = compose_user_text(&ConversionRequest::default());
        assert!(with.contains(DESCRIBE_INSTRUCTION));
        assert!(!with.contains(NO_DESCRIPTION_INSTRUCTION));

        let without = compose_user_text(&ConversionRequest::default().with_describe(false));
        assert!(without.contains(NO_DESCRIPTION_INSTRUCTION));
        assert!(!without.contains(DESCRIBE_INSTRUCTION));
    }

    #[test]
    fn preceding_markdown_is_quoted() {
        let text = compose_user_text(&ConversionRequest::default().with_preceding_markdown("# A"));
        assert!(text.contains("\"\"\"\n# A\n\"\"\""));
    }

    #[test]
    fn no_tags_means_no_tag_block() {
        let text = compose_user_text(&ConversionRequest::default());
        assert!(!text.contains(crate::prompts::TAG_BLOCK_HEADER));
    }
}
