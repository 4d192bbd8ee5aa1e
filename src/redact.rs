//! Log redaction of embedded image payloads.
//!
//! Page images arrive as base64 data URIs that can run to megabytes. Before a
//! request is logged, every string starting with `data:image` is replaced by a
//! short placeholder carrying only its length. The processing path never sees
//! the redacted value.

use crate::pipeline::encode::DATA_IMAGE_PREFIX;
use serde_json::Value;

/// Placeholder for a redacted data URI of `len` bytes.
pub fn placeholder(len: usize) -> String {
    format!("[{DATA_IMAGE_PREFIX} redacted, {len} chars]")
}

/// Redact a single string if it is an embedded image.
pub fn redact_str(s: &str) -> String {
    if s.starts_with(DATA_IMAGE_PREFIX) {
        placeholder(s.len())
    } else {
        s.to_string()
    }
}

/// Deep copy of `value` with every embedded image string replaced.
pub fn redact_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(redact_str(s)),
        Value::Array(items) => Value::Array(items.iter().map(redact_value).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), redact_value(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}
