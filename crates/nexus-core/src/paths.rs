//! Root-relative path validation
//!
//! Every user-provided path goes through [`normalize_relative`] before it is
//! joined with the store root. The checks reject:
//!
//! - absolute paths (`/etc/passwd`, `C:\...`)
//! - parent traversal (`notes/../../etc`)
//! - any segment beginning with `.` (`.git/config`, `notes/.hidden.md`)
//!
//! Symlink escapes are caught separately by the store, which canonicalizes
//! the nearest existing ancestor and checks it is still under the root.

use std::path::Path;

use crate::error::{StorageError, StorageResult};

/// Extension given to document paths that have none
pub const DOCUMENT_EXTENSION: &str = "md";

/// Validate a root-relative path and return it `/`-separated without empty
/// segments. An empty input normalizes to the empty string (the root).
pub fn normalize_relative(path: &str) -> StorageResult<String> {
    let unified = path.trim().replace('\\', "/");

    if unified.starts_with('/') || Path::new(&unified).is_absolute() || has_drive_prefix(&unified)
    {
        return Err(StorageError::access_denied(path, "absolute paths are not allowed"));
    }

    let mut segments = Vec::new();
    for segment in unified.split('/') {
        if segment.is_empty() {
            continue;
        }
        if segment == ".." {
            return Err(StorageError::access_denied(path, "path traversal is not allowed"));
        }
        if segment.starts_with('.') {
            return Err(StorageError::access_denied(
                path,
                "hidden path segments are not allowed",
            ));
        }
        segments.push(segment);
    }

    Ok(segments.join("/"))
}

/// Normalize a document path, appending `.md` when there is no extension
pub fn normalize_document(path: &str) -> StorageResult<String> {
    let normalized = normalize_relative(path)?;
    if normalized.is_empty() {
        return Err(StorageError::access_denied(path, "document path is empty"));
    }

    let has_extension = normalized
        .rsplit('/')
        .next()
        .is_some_and(|name| name.contains('.'));

    if has_extension {
        Ok(normalized)
    } else {
        Ok(format!("{normalized}.{DOCUMENT_EXTENSION}"))
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
