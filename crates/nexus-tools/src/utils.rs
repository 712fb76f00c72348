//! Helpers shared by the built-in bundles

use std::future::Future;

use nexus_plugins::{Operation, ToolOutput};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::vault::Vault;

/// Build an [`Operation`] whose handler gets its own handle on the vault
pub(crate) fn vault_operation<A, F, Fut>(
    vault: &Vault,
    name: &str,
    description: &str,
    handler: F,
) -> Operation
where
    A: DeserializeOwned + JsonSchema + Send + 'static,
    F: Fn(Vault, A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<ToolOutput>> + Send + 'static,
{
    let vault = vault.clone();
    Operation::new(name, description, move |args: A| handler(vault.clone(), args))
}

/// Lowercase, dash-separated file name stem for `title`
///
/// Falls back to `untitled` when nothing usable is left.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}

/// JSON status object returned by write operations
pub(crate) fn status(path: &str, status: &str) -> anyhow::Result<ToolOutput> {
    ToolOutput::json(&json!({ "path": path, "status": status }))
}

/// Markdown bullet list, or `fallback` when `items` is empty
pub(crate) fn bullets(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        return fallback.to_string();
    }
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Bullet list of `[[wiki links]]`
pub(crate) fn links(items: &[String], fallback: &str) -> String {
    let wrapped: Vec<String> = items
        .iter()
        .map(|item| format!("[[{}]]", item.trim_start_matches("[[").trim_end_matches("]]")))
        .collect();
    bullets(&wrapped, fallback)
}

/// Metadata list value
pub(crate) fn string_list(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}
