//! Typed query representation

use serde::Serialize;
use serde_json::Value;

use nexus_config::OutputFormat;

/// Comparison operator in a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    /// Field is a list containing the literal
    Contains,
}

/// `field <op> value`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub field: String,
    pub op: Operator,
    pub value: Value,
}

/// WHERE clause as a disjunction of conjunctions.
///
/// `a AND b OR c` is `[[a, b], [c]]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter {
    pub groups: Vec<Vec<Condition>>,
}

impl Filter {
    /// Single-condition filter
    pub fn single(condition: Condition) -> Self {
        Self {
            groups: vec![vec![condition]],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// Projected field with optional display alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub field: String,
    pub alias: Option<String>,
}

impl Projection {
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            field: name.into(),
            alias: None,
        }
    }

    /// Header text: alias when present, else the field name
    pub fn label(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.field)
    }
}

/// Output clause: `TABLE ...` or `LIST ...`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Output {
    pub format: OutputFormat,
    pub fields: Vec<Projection>,
}

/// Parsed query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRequest {
    /// Folder prefix; `None` scans the whole store
    pub from: Option<String>,
    pub filter: Option<Filter>,
    pub sort: Option<Sort>,
    pub limit: Option<usize>,
    pub output: Option<Output>,
}
