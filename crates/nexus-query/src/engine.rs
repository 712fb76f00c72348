//! Running queries against a document store

use nexus_config::OutputFormat;
use nexus_core::{Document, DocumentStore, StorageError};
use tracing::{debug, warn};

use crate::ast::{Projection, QueryRequest};
use crate::error::QueryResult;
use crate::eval::{matches, sort_documents};
use crate::render::render;
use crate::shorthand::expand_tag_shorthand;
use crate::syntax::parse;

/// Caller-side settings for [`run`]
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Used when the query has no TABLE/LIST clause
    pub default_format: OutputFormat,
    /// Replaces the query's output format
    pub format: Option<OutputFormat>,
    /// Replaces the query's projected fields
    pub fields: Option<Vec<String>>,
    /// Cap applied after the query's own LIMIT
    pub max_results: Option<usize>,
}

/// Evaluate a parsed request.
///
/// A scope folder that does not exist yields no documents. Documents that
/// fail to parse are logged and skipped.
pub async fn execute(store: &DocumentStore, request: &QueryRequest) -> QueryResult<Vec<Document>> {
    let scope = request.from.as_deref().unwrap_or("");
    let paths = match store.list(scope).await {
        Ok(paths) => paths,
        Err(StorageError::NotFound(_)) => {
            debug!("Query scope '{}' does not exist", scope);
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut documents = Vec::new();
    for path in paths {
        let document = match store.read(&path).await {
            Ok(document) => document,
            Err(e) => {
                warn!("Skipping {} in query: {}", path, e);
                continue;
            }
        };

        if request
            .filter
            .as_ref()
            .map_or(true, |filter| matches(&document, filter))
        {
            documents.push(document);
        }
    }

    if let Some(sort) = &request.sort {
        sort_documents(&mut documents, sort);
    }
    if let Some(limit) = request.limit {
        documents.truncate(limit);
    }

    debug!("Query matched {} documents", documents.len());
    Ok(documents)
}

/// Expand shorthand, parse, execute and render a query string
pub async fn run(store: &DocumentStore, query: &str, options: &QueryOptions) -> QueryResult<String> {
    let request = parse(&expand_tag_shorthand(query))?;
    let mut documents = execute(store, &request).await?;

    if let Some(max) = options.max_results {
        documents.truncate(max);
    }

    let (query_format, query_fields) = match &request.output {
        Some(output) => (Some(output.format), output.fields.clone()),
        None => (None, Vec::new()),
    };
    let format = options
        .format
        .or(query_format)
        .unwrap_or(options.default_format);
    let fields = match &options.fields {
        Some(fields) => fields.iter().map(Projection::field).collect(),
        None => query_fields,
    };

    Ok(render(&documents, format, &fields))
}
