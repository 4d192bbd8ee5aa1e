//! Prompt text for VLM-based page transcription.
//!
//! The system prompt fixes the JSON reply contract; the remaining constants
//! are the headers and closing lines of the optional user-message sections.
//! How the pieces are assembled into a transcript lives in
//! [`crate::pipeline::compose`].

/// System prompt sent with every page.
///
/// The reply contract (raw JSON, `markdown` + `isFirstPage`) is what
/// [`crate::pipeline::extract`] parses; keep the two in step.
pub const SYSTEM_PROMPT: &str = r#"You are an expert document transcriber. You receive the image of a single document page and transcribe it into clean, well-structured Markdown.

Follow these rules precisely:

1. TEXT PRESERVATION
   - Transcribe ALL text on the page verbatim, in the order a human would read it
   - Do not summarise, paraphrase, translate or correct the content

2. STRUCTURE
   - Use # / ## / ### headings to mirror the visual hierarchy
   - Use - for unordered lists and 1. 2. 3. for ordered lists, preserving nesting
   - Convert tables to GFM pipe tables
   - Use **bold** and *italic* to match visual emphasis

3. FIRST-PAGE JUDGEMENT
   - Decide whether this page is the first page of a new document (a title page,
     a cover letter, a new form, a page restarting at "Page 1", …) rather than a
     continuation of a preceding document

4. OUTPUT FORMAT
   - Reply with raw JSON only. Do NOT wrap the reply in ``` fences and do NOT
     add commentary before or after it
   - The JSON object MUST contain:
       "markdown": string, the Markdown transcription of the page
       "isFirstPage": boolean, your first-page judgement
   - The JSON object MAY contain, only when asked below:
       "description": string
       "tags": array of strings"#;

pub const DESCRIPTION_HEADER: &str = "High-level description of the document:";

pub const INTENT_HEADER: &str = "Intended use of the transcription:";

pub const GRAPHIC_INSTRUCTIONS_HEADER: &str =
    "Instructions for handling graphics, charts and images:";

pub const PRECEDING_MARKDOWN_HEADER: &str =
    "Markdown transcribed from the preceding page. Keep heading levels, list numbering and running text consistent with it, but do not repeat it:";

pub const PRECEDING_CONTEXT_HEADER: &str = "Additional context about the preceding page:";

pub const PRECEDING_IMAGE_NOTE: &str =
    "The image of the preceding page is attached first, for reference only. Transcribe only the last attached image.";

pub const TAG_BLOCK_HEADER: &str = "Tag definitions (name: definition):";

pub const TAG_BLOCK_INSTRUCTION: &str = "Your reply may include a \"tags\" array containing only names from the list above. Include a tag when the meaning of the page content satisfies its definition; judge by meaning, not by whether the tag name or definition words literally appear on the page. Omit \"tags\" or leave it empty when no definition applies.";

pub const DESCRIBE_INSTRUCTION: &str = "Also include a \"description\" field: a 1-3 sentence summary of what this page contains.";

pub const NO_DESCRIPTION_INSTRUCTION: &str =
    "No description is needed; do not include a \"description\" field.";

/// Wrap caller-supplied Markdown so the model can tell where it ends.
pub fn quoted_block(body: &str) -> String {
    format!("\"\"\"\n{body}\n\"\"\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_states_reply_contract() {
        assert!(SYSTEM_PROMPT.contains("\"markdown\": string"));
        assert!(SYSTEM_PROMPT.contains("\"isFirstPage\": boolean"));
        assert!(SYSTEM_PROMPT.contains("raw JSON only"));
        assert!(SYSTEM_PROMPT.contains("\"description\""));
        assert!(SYSTEM_PROMPT.contains("\"tags\""));
    }

    #[test]
    fn quoted_block_delimits_body() {
        assert_eq!(quoted_block("# A"), "\"\"\"\n# A\n\"\"\"");
    }
}
