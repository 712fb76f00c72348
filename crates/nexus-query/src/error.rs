use nexus_core::StorageError;
use thiserror::Error;

/// Errors from parsing or running a query
#[derive(Debug, Error)]
pub enum QueryError {
    /// Grammar rejected the input
    #[error("Query parse error:\n{0}")]
    Parse(String),

    /// Same clause given twice
    #[error("Clause {0} given more than once")]
    DuplicateClause(&'static str),

    /// Scope could not be read
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
