//! `#tag` shorthand
//!
//! `#rust #cli SORT title` becomes
//! `SORT title WHERE contains(tags, "rust") OR contains(tags, "cli")`.
//! Quoted strings are left alone. Combining shorthand with an explicit
//! `WHERE` produces a duplicate-clause error from the parser.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Quoted strings (kept) or a `#tag` token at the start or after whitespace.
/// Dots are allowed inside a tag but never at its end.
static SHORTHAND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#""[^"]*"|'[^']*'|(?:^|\s)#([\p{L}\p{N}_][\p{L}\p{N}_/\-]*(?:\.[\p{L}\p{N}_/\-]+)*)"#,
    )
    .unwrap()
});

/// Rewrite bare `#tag` tokens into a `WHERE` clause, keeping the rest of the
/// query. Returns the input unchanged when it has no tag tokens.
pub fn expand_tag_shorthand(query: &str) -> String {
    let mut tags: Vec<String> = Vec::new();

    let rest = SHORTHAND_RE.replace_all(query, |caps: &Captures<'_>| match caps.get(1) {
        Some(tag) => {
            let tag = tag.as_str().to_string();
            if !tags.contains(&tag) {
                tags.push(tag);
            }
            " ".to_string()
        }
        None => caps[0].to_string(),
    });

    if tags.is_empty() {
        return query.to_string();
    }

    let conditions = tags
        .iter()
        .map(|tag| format!("contains(tags, \"{tag}\")"))
        .collect::<Vec<_>>()
        .join(" OR ");

    let rest = rest.split_whitespace().collect::<Vec<_>>().join(" ");
    if rest.is_empty() {
        format!("WHERE {conditions}")
    } else {
        format!("{rest} WHERE {conditions}")
    }
}
