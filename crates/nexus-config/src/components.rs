//! Component configuration sections

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `nexus_tags=debug`
    pub level: String,
    /// Use ANSI colours on stderr
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: false,
        }
    }
}

/// Rendering shape for query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown table
    #[default]
    Table,
    /// Bullet list
    List,
}

/// Query engine defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Shape used when a query names neither TABLE nor LIST
    pub default_format: OutputFormat,
    /// Hard cap applied after the query's own LIMIT
    pub max_results: Option<usize>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_format: OutputFormat::Table,
            max_results: Some(500),
        }
    }
}
