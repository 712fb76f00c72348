//! Condition evaluation and sorting over documents

use std::cmp::Ordering;

use nexus_core::Document;
use serde_json::Value;

use crate::ast::{Condition, Filter, Operator, Sort, SortDirection};

/// Resolve a field on a document.
///
/// `path`, `file` and `folder` are derived from the document path; anything
/// else is looked up in the metadata, following `.` into nested maps.
pub fn field_value(document: &Document, field: &str) -> Option<Value> {
    match field {
        "path" => Some(Value::String(document.path.clone())),
        "file" => Some(Value::String(document.file_stem().to_string())),
        "folder" => Some(Value::String(document.folder().to_string())),
        _ => document.field(field).cloned(),
    }
}

/// Whether a document passes the filter (any group with all conditions true)
pub fn matches(document: &Document, filter: &Filter) -> bool {
    filter.groups.iter().any(|group| {
        group
            .iter()
            .all(|condition| evaluate(document, condition))
    })
}

/// Evaluate one condition
pub fn evaluate(document: &Document, condition: &Condition) -> bool {
    let actual = field_value(document, &condition.field);
    compare(condition.op, actual.as_ref(), &condition.value)
}

/// Apply `op` between a field value and a literal. A missing field only
/// satisfies `!=`.
pub fn compare(op: Operator, actual: Option<&Value>, literal: &Value) -> bool {
    let Some(actual) = actual else {
        return op == Operator::Ne;
    };

    match op {
        Operator::Contains => actual
            .as_array()
            .is_some_and(|items| items.iter().any(|item| values_equal(item, literal))),
        Operator::Eq => values_equal(actual, literal),
        Operator::Ne => !values_equal(actual, literal),
        Operator::Gt => order(actual, literal) == Ordering::Greater,
        Operator::Lt => order(actual, literal) == Ordering::Less,
        Operator::Ge => order(actual, literal) != Ordering::Less,
        Operator::Le => order(actual, literal) != Ordering::Greater,
    }
}

/// Strict equality; numbers compare by value so `2` equals `2.0`
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => x == y,
        _ => a == b,
    }
}

/// Numeric when both are numbers, otherwise by string form
pub fn order(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    text(a).cmp(&text(b))
}

/// String form used for lexicographic comparison and rendering
pub fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Stable sort; documents missing the field go last in either direction
pub fn sort_documents(documents: &mut [Document], sort: &Sort) {
    documents.sort_by(|a, b| {
        let a = field_value(a, &sort.field);
        let b = field_value(b, &sort.field);
        match (a, b) {
            (Some(a), Some(b)) => match sort.direction {
                SortDirection::Asc => sort_order(&a, &b),
                SortDirection::Desc => sort_order(&b, &a),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

/// Total order for sorting: numbers numerically and ahead of everything
/// else, the rest by string form
fn sort_order(a: &Value, b: &Value) -> Ordering {
    match (a.is_number(), b.is_number()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => order(a, b),
    }
}
