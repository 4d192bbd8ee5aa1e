//! Response extraction: untrusted model continuation → [`ConversionResult`].
//!
//! The model is asked for raw JSON but is under no obligation to comply.
//! Every field is therefore validated and coerced explicitly, and any reply
//! that cannot be parsed falls back to a *degraded* result rather than an
//! error:
//!
//! | Reply | Result |
//! |-------|--------|
//! | no assistant message | `{ markdown: "(No assistant output returned.)", isFirstPage: false }` |
//! | invalid JSON | `{ markdown: <reply text>, isFirstPage: false }` |
//! | JSON object | coerced fields, see [`parse_reply`] |
//! | other JSON value | coerced as `{}` |
//!
//! Degraded results never carry `description` or `tags`.

use crate::output::ConversionResult;
use crate::tags::validate_tags;
use crate::transcript::{Role, Transcript};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Markdown used when the continuation holds no assistant message.
pub const NO_ASSISTANT_OUTPUT: &str = "(No assistant output returned.)";

/// Fields recovered from a reply that parsed as a JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub markdown: String,
    pub is_first_page: bool,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Outcome of parsing the reply text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    Parsed(ParsedReply),
    /// The text could not be read as a JSON object; it becomes the Markdown.
    Degraded(String),
}

/// Turn a gateway continuation into the caller-facing result.
///
/// `describe` is the request's flag: when true the result always carries a
/// `description` (empty if the model supplied none); when false it never does.
pub fn extract_result(continuation: &Transcript, describe: bool) -> ConversionResult {
    let Some(message) = continuation.first_with_role(Role::Assistant) else {
        warn!("Continuation contained no assistant message");
        return ConversionResult::markdown_only(NO_ASSISTANT_OUTPUT);
    };

    let raw = message.content.flatten_text();
    let text = strip_json_fences(&raw);

    match parse_reply(&text) {
        ReplyOutcome::Parsed(reply) => ConversionResult {
            markdown: reply.markdown,
            is_first_page: reply.is_first_page,
            description: describe.then(|| reply.description.unwrap_or_default()),
            tags: reply.tags,
        },
        ReplyOutcome::Degraded(text) => ConversionResult::markdown_only(text),
    }
}

// ── Fence stripping ──────────────────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A```(?:json)?\s*(.*?)\s*```\z").unwrap());

/// Remove one pair of ``` fences (optionally tagged `json`) wrapping the whole
/// reply, then trim. Not iterative: nested fences are left alone.
pub fn strip_json_fences(input: &str) -> String {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed) {
        Some(caps) => caps[1].trim().to_string(),
        None => trimmed.to_string(),
    }
}

// ── Parsing and coercion ─────────────────────────────────────────────────────

/// Parse fence-free reply text.
///
/// On a JSON object:
/// - `markdown`: strings pass through, `null`/absent become `""`, numbers and
///   booleans are stringified, arrays and objects become their JSON text
/// - `isFirstPage`: `true` only for a JSON `true`
/// - `description`: kept only if it is a string
/// - `tags`: kept only if it is an array of strings
///
/// Valid JSON that is not an object (a scalar or an array) still parsed, so it
/// is coerced as an object with no fields. Only invalid JSON is
/// [`ReplyOutcome::Degraded`].
pub fn parse_reply(text: &str) -> ReplyOutcome {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(fields)) => ReplyOutcome::Parsed(coerce_fields(&fields)),
        Ok(other) => {
            debug!("Reply parsed as JSON but is not an object: {}", other);
            ReplyOutcome::Parsed(coerce_fields(&Map::new()))
        }
        Err(e) => {
            debug!("Reply is not valid JSON ({}); using raw text as markdown", e);
            ReplyOutcome::Degraded(text.to_string())
        }
    }
}

fn coerce_fields(fields: &Map<String, Value>) -> ParsedReply {
    ParsedReply {
        markdown: coerce_markdown(fields.get("markdown")),
        is_first_page: matches!(fields.get("isFirstPage"), Some(Value::Bool(true))),
        description: fields
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        tags: validate_tags(fields.get("tags")),
    }
}

fn coerce_markdown(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
