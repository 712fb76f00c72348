//! Document model and YAML frontmatter codec
//!
//! A document is a UTF-8 markdown file with an optional header block:
//!
//! ```text
//! ---
//! title: Weekly review
//! tags: [review, planning]
//! ---
//! Free-form body text.
//! ```
//!
//! The header is parsed with `serde_yaml` straight into `serde_json` values so
//! the rest of the system (query engine, tool arguments) works with a single
//! value type.

use serde::Serialize;
use serde_json::Value;

use crate::error::{StorageError, StorageResult};

/// Metadata parsed from a document header
pub type Metadata = serde_json::Map<String, Value>;

/// A parsed document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Path relative to the store root, `/`-separated
    pub path: String,
    /// Header key/value data
    pub metadata: Metadata,
    /// Everything after the header block
    pub body: String,
}

impl Document {
    /// Create a document from parts
    pub fn new(path: impl Into<String>, metadata: Metadata, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            metadata,
            body: body.into(),
        }
    }

    /// Parse raw file content into a document
    pub fn parse(path: impl Into<String>, content: &str) -> StorageResult<Self> {
        let path = path.into();
        let (metadata, body) = match split_frontmatter(content) {
            Some((yaml, body)) => (parse_metadata(&path, yaml)?, body.to_string()),
            None => (Metadata::new(), content.to_string()),
        };

        Ok(Self {
            path,
            metadata,
            body,
        })
    }

    /// Render the document back to file content
    pub fn to_markdown(&self) -> StorageResult<String> {
        if self.metadata.is_empty() {
            return Ok(self.body.clone());
        }

        let yaml = serde_yaml::to_string(&self.metadata)
            .map_err(|e| StorageError::Serialize(e.to_string()))?;
        Ok(format!("---\n{yaml}---\n{}", self.body))
    }

    /// Look up a metadata field, following `.` into nested maps
    pub fn field(&self, name: &str) -> Option<&Value> {
        let mut parts = name.split('.');
        let mut current = self.metadata.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// File name without the extension
    pub fn file_stem(&self) -> &str {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        name.strip_suffix(".md").unwrap_or(name)
    }

    /// Folder part of the path, empty at the root
    pub fn folder(&self) -> &str {
        self.path.rsplit_once('/').map_or("", |(folder, _)| folder)
    }

    /// `title` from the header, falling back to the file stem
    pub fn title(&self) -> String {
        self.metadata
            .get("title")
            .and_then(Value::as_str)
            .map_or_else(|| self.file_stem().to_string(), str::to_string)
    }

    /// Tag references carried by this document
    pub fn tags(&self) -> Vec<String> {
        crate::tags::extract_tags(&self.metadata)
    }
}

/// Split content into `(yaml, body)` when it opens with a `---` header block
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(|c| c == '\r' || c == '\n') == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }

    None
}

fn parse_metadata(path: &str, yaml: &str) -> StorageResult<Metadata> {
    if yaml.trim().is_empty() {
        return Ok(Metadata::new());
    }

    let value: Value = serde_yaml::from_str(yaml).map_err(|e| StorageError::Frontmatter {
        path: path.to_string(),
        message: e.to_string(),
    })?;

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Metadata::new()),
        other => Err(StorageError::Frontmatter {
            path: path.to_string(),
            message: format!("header must be a mapping, found {}", kind_of(&other)),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_with_frontmatter() {
        let doc = Document::parse(
            "notes/a.md",
            "---\ntitle: Test\ntags:\n  - rust\n  - code\n---\n# Body\n",
        )
        .unwrap();

        assert_eq!(doc.metadata["title"], "Test");
        assert_eq!(doc.metadata["tags"], json!(["rust", "code"]));
        assert_eq!(doc.body, "# Body\n");
    }

    #[test]
    fn test_parse_without_frontmatter() {
        let doc = Document::parse("a.md", "# Just a heading\n").unwrap();
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, "# Just a heading\n");
    }

    #[test]
    fn test_parse_windows_line_endings() {
        let doc = Document::parse("a.md", "---\r\ntitle: Test\r\n---\r\nbody").unwrap();
        assert_eq!(doc.metadata["title"], "Test");
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn test_parse_header_closing_at_eof() {
        let doc = Document::parse("a.md", "---\nstatus: open\n---").unwrap();
        assert_eq!(doc.metadata["status"], "open");
        assert_eq!(doc.body, "");
    }

    #[test]
    fn test_unclosed_header_is_body() {
        let content = "---\ntitle: nope\nno closing line";
        let doc = Document::parse("a.md", content).unwrap();
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, content);
    }

    #[test]
    fn test_empty_header() {
        let doc = Document::parse("a.md", "---\n---\nbody").unwrap();
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn test_non_mapping_header_is_rejected() {
        let err = Document::parse("a.md", "---\n- one\n- two\n---\n").unwrap_err();
        assert!(matches!(err, StorageError::Frontmatter { .. }));
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        let err = Document::parse("bad.md", "---\ntitle: [unclosed\n---\n").unwrap_err();
        match err {
            StorageError::Frontmatter { path, .. } => assert_eq!(path, "bad.md"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_to_markdown_reparses() {
        let mut metadata = Metadata::new();
        metadata.insert("title".into(), json!("Round"));
        metadata.insert("tags".into(), json!(["a", "b"]));
        let doc = Document::new("x.md", metadata, "Body text\n");

        let rendered = doc.to_markdown().unwrap();
        assert!(rendered.starts_with("---\n"));

        let parsed = Document::parse("x.md", &rendered).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_to_markdown_without_metadata_is_body() {
        let doc = Document::new("x.md", Metadata::new(), "plain");
        assert_eq!(doc.to_markdown().unwrap(), "plain");
    }

    #[test]
    fn test_nested_field_lookup() {
        let doc = Document::parse(
            "a.md",
            "---\nmetadata:\n  status: active\n  tags: [x]\n---\n",
        )
        .unwrap();
        assert_eq!(doc.field("metadata.status"), Some(&json!("active")));
        assert_eq!(doc.field("metadata.missing"), None);
        assert_eq!(doc.field("missing.status"), None);
    }

    #[test]
    fn test_path_helpers() {
        let doc = Document::new("goals/2024/ship-it.md", Metadata::new(), "");
        assert_eq!(doc.file_stem(), "ship-it");
        assert_eq!(doc.folder(), "goals/2024");
        assert_eq!(doc.title(), "ship-it");

        let root = Document::new("index.md", Metadata::new(), "");
        assert_eq!(root.folder(), "");
    }
}
