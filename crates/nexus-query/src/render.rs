//! Text rendering of query results

use nexus_config::OutputFormat;
use nexus_core::Document;
use serde_json::Value;

use crate::ast::Projection;
use crate::eval::{field_value, text};

/// Shown instead of an empty table or list
pub const EMPTY_RESULT: &str = "No matching documents.";

/// Render documents as a markdown table or bullet list.
///
/// An empty `fields` slice projects just `path`.
pub fn render(documents: &[Document], format: OutputFormat, fields: &[Projection]) -> String {
    if documents.is_empty() {
        return EMPTY_RESULT.to_string();
    }

    let default_fields = [Projection::field("path")];
    let fields = if fields.is_empty() {
        &default_fields[..]
    } else {
        fields
    };

    match format {
        OutputFormat::Table => render_table(documents, fields),
        OutputFormat::List => render_list(documents, fields),
    }
}

fn render_table(documents: &[Document], fields: &[Projection]) -> String {
    let header = fields
        .iter()
        .map(|f| escape_cell(f.label()))
        .collect::<Vec<_>>()
        .join(" | ");
    let divider = vec!["---"; fields.len()].join(" | ");

    let mut lines = vec![format!("| {header} |"), format!("| {divider} |")];
    for document in documents {
        let row = fields
            .iter()
            .map(|f| escape_cell(&cell(document, &f.field)))
            .collect::<Vec<_>>()
            .join(" | ");
        lines.push(format!("| {row} |"));
    }

    lines.join("\n")
}

fn render_list(documents: &[Document], fields: &[Projection]) -> String {
    documents
        .iter()
        .map(|document| {
            let pairs = fields
                .iter()
                .map(|f| format!("{}: {}", f.label(), cell(document, &f.field)))
                .collect::<Vec<_>>()
                .join("; ");
            format!("- {pairs}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Display text for a field; lists are joined with `, `, missing is empty
fn cell(document: &Document, field: &str) -> String {
    match field_value(document, field) {
        Some(Value::Array(items)) => items.iter().map(text).collect::<Vec<_>>().join(", "),
        Some(value) => text(&value),
        None => String::new(),
    }
}

fn escape_cell(raw: &str) -> String {
    raw.replace('|', "\\|").replace('\n', " ")
}
