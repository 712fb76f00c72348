//! Tag extraction from document metadata
//!
//! Tags are read from the top-level `tags` field and from a nested
//! `metadata.tags` field. Either may be a list or a comma-separated string;
//! a leading `#` is dropped.

use serde_json::Value;

use crate::document::Metadata;

/// Top-level field holding tags
pub const TAGS_FIELD: &str = "tags";

/// Nested map that may carry a second `tags` list
pub const NESTED_METADATA_FIELD: &str = "metadata";

/// Collect the tags referenced by a metadata map, in order of first
/// appearance and without duplicates (original spelling kept).
pub fn extract_tags(metadata: &Metadata) -> Vec<String> {
    let mut tags = Vec::new();

    if let Some(value) = metadata.get(TAGS_FIELD) {
        collect(value, &mut tags);
    }

    if let Some(value) = metadata
        .get(NESTED_METADATA_FIELD)
        .and_then(Value::as_object)
        .and_then(|nested| nested.get(TAGS_FIELD))
    {
        collect(value, &mut tags);
    }

    tags
}

/// Strip the `#` prefix and surrounding whitespace from a tag reference
pub fn clean_tag(raw: &str) -> Option<String> {
    let cleaned = raw.trim().trim_start_matches('#').trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

fn collect(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(s) => push(s, out),
                    Value::Number(n) => push(&n.to_string(), out),
                    _ => {}
                }
            }
        }
        Value::String(s) => {
            for part in s.split(',') {
                push(part, out);
            }
        }
        _ => {}
    }
}

fn push(raw: &str, out: &mut Vec<String>) {
    if let Some(tag) = clean_tag(raw) {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
}
