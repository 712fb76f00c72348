//! Storage error types

use thiserror::Error;

/// Errors raised by the document store and frontmatter codec
#[derive(Debug, Error)]
pub enum StorageError {
    /// The path escapes the root or touches a hidden segment
    #[error("Access denied for '{path}': {reason}")]
    AccessDenied {
        /// Path as given by the caller
        path: String,
        /// Which check rejected it
        reason: String,
    },

    /// No document at the normalized path
    #[error("Document not found: {0}")]
    NotFound(String),

    /// A create hit an existing document
    #[error("Document already exists: {0}")]
    AlreadyExists(String),

    /// Read, write or scan failure
    #[error("I/O error on '{path}'")]
    Io {
        /// Root-relative path being accessed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The YAML header did not parse into a mapping
    #[error("Invalid frontmatter in '{path}': {message}")]
    Frontmatter {
        /// Root-relative document path
        path: String,
        /// Parser message
        message: String,
    },

    /// Metadata could not be written back as YAML
    #[error("Failed to serialize frontmatter: {0}")]
    Serialize(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Create an access-denied error
    pub fn access_denied(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AccessDenied {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error was raised by the path-safety checks
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }

    /// Whether the document or folder was missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_predicates() {
        assert!(StorageError::access_denied("../x", "traversal").is_access_denied());
        assert!(StorageError::NotFound("a.md".into()).is_not_found());
        assert!(!StorageError::AlreadyExists("a.md".into()).is_not_found());
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = StorageError::io(
            "notes/a.md",
            std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"),
        );
        assert_eq!(err.to_string(), "I/O error on 'notes/a.md'");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "disk on fire");
    }
}
