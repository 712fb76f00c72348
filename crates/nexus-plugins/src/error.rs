use serde::Serialize;
use thiserror::Error;

/// One argument that failed its contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// JSON pointer into the arguments, empty for the root
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Bundle already loaded: {0}")]
    DuplicateBundle(String),

    #[error("Bundle not loaded: {0}")]
    UnknownBundle(String),

    #[error("Operation '{operation}' from bundle '{bundle}' is already provided by '{existing}'")]
    OperationConflict {
        operation: String,
        bundle: String,
        existing: String,
    },

    #[error("Unknown operation: {0}")]
    OperationNotFound(String),

    #[error("Invalid arguments for '{operation}': {}", join_violations(.violations))]
    InvalidArguments {
        operation: String,
        violations: Vec<FieldViolation>,
    },

    #[error("Operation '{operation}' failed: {message}")]
    OperationFailed { operation: String, message: String },

    #[error("Bundle '{bundle}' failed to load: {message}")]
    BundleLoad { bundle: String, message: String },

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Reading resource '{uri}' failed: {message}")]
    ResourceFailed { uri: String, message: String },

    #[error("Invalid contract for '{operation}': {message}")]
    Contract { operation: String, message: String },
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl HostError {
    /// Stable identifier used in transport error responses
    pub fn kind(&self) -> &'static str {
        match self {
            HostError::DuplicateBundle(_) => "duplicate_bundle",
            HostError::UnknownBundle(_) => "unknown_bundle",
            HostError::OperationConflict { .. } => "operation_conflict",
            HostError::OperationNotFound(_) => "operation_not_found",
            HostError::InvalidArguments { .. } => "invalid_arguments",
            HostError::OperationFailed { .. } => "operation_failed",
            HostError::BundleLoad { .. } => "bundle_load",
            HostError::ResourceNotFound(_) => "resource_not_found",
            HostError::ResourceFailed { .. } => "resource_failed",
            HostError::Contract { .. } => "contract",
        }
    }

    /// Field violations, when the error carries any
    pub fn violations(&self) -> Option<&[FieldViolation]> {
        match self {
            HostError::InvalidArguments { violations, .. } => Some(violations),
            _ => None,
        }
    }
}

pub type HostResult<T> = Result<T, HostError>;
