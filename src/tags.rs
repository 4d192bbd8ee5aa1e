//! Tag classification adapter.
//!
//! Classification itself happens inside the model: the caller supplies
//! `name → definition` pairs, we format them into the prompt, and on the way
//! back we relay whatever tag list the model returned once it has been
//! checked to be an array of strings. There is no local matching logic.

use crate::prompts::{TAG_BLOCK_HEADER, TAG_BLOCK_INSTRUCTION};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Caller-supplied tag definitions, ordered by tag name.
pub type TagDefinitions = BTreeMap<String, String>;

/// Render the tag block of the user prompt: one `- name: definition` line per
/// tag followed by the classification instruction.
pub fn render_tag_block(definitions: &TagDefinitions) -> String {
    let mut block = String::from(TAG_BLOCK_HEADER);
    for (name, definition) in definitions {
        block.push_str(&format!("\n- {name}: {definition}"));
    }
    block.push_str("\n\n");
    block.push_str(TAG_BLOCK_INSTRUCTION);
    block
}

/// Decode the `tags` request field, which may arrive as a JSON object or as a
/// string holding a JSON-encoded object.
///
/// Anything undecodable is logged and treated as "no tags"; it never fails the
/// request. Non-string definition values are kept as their JSON text.
pub fn parse_tag_field(value: &Value) -> Option<TagDefinitions> {
    match value {
        Value::Null => None,
        Value::Object(map) => Some(
            map.iter()
                .map(|(name, def)| {
                    let def = match def {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (name.clone(), def)
                })
                .collect(),
        ),
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(decoded @ Value::Object(_)) => parse_tag_field(&decoded),
            Ok(other) => {
                warn!("Ignoring tags: decoded JSON is not an object ({})", json_kind(&other));
                None
            }
            Err(e) => {
                warn!("Ignoring tags: failed to decode JSON string: {}", e);
                None
            }
        },
        other => {
            warn!("Ignoring tags: expected object or JSON string, got {}", json_kind(other));
            None
        }
    }
}

/// Relay a model-supplied `tags` value only if it is an array of strings.
pub fn validate_tags(value: Option<&Value>) -> Option<Vec<String>> {
    value?
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
