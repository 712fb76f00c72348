//! Tag graph errors

use thiserror::Error;

/// Errors raised by tag graph mutations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TagError {
    /// The requested parent link would close a loop
    #[error("Setting '{parent}' as parent of '{tag}' would create a cycle")]
    HierarchyCycle {
        /// Child side of the rejected edge
        tag: String,
        /// Parent side of the rejected edge
        parent: String,
    },

    /// Strength outside `[0, 1]`
    #[error("Relationship strength must be between 0 and 1, got {0}")]
    InvalidStrength(f64),

    /// A tag cannot relate to itself
    #[error("Tag '{0}' cannot have a relationship with itself")]
    SelfRelationship(String),

    /// Blank tag name
    #[error("Tag name must not be empty")]
    EmptyTag,
}

/// Result type for tag graph operations
pub type TagResult<T> = Result<T, TagError>;
