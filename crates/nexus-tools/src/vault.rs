//! Vault service shared by every built-in bundle
//!
//! All document writes go through [`Vault`] so the tag index is updated in
//! the same call that touches the file.

use std::sync::Arc;

use tracing::debug;

use nexus_config::{OutputFormat, QueryConfig};
use nexus_core::{Document, DocumentStore, Metadata, StorageResult};
use nexus_query::{QueryOptions, QueryResult};
use nexus_tags::TagIndex;

/// Document store plus the tag index kept in step with it
#[derive(Debug, Clone)]
pub struct Vault {
    store: Arc<DocumentStore>,
    tags: TagIndex,
    query: QueryConfig,
}

impl Vault {
    pub fn new(store: DocumentStore, query: QueryConfig) -> Self {
        Self {
            store: Arc::new(store),
            tags: TagIndex::new(),
            query,
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn tags(&self) -> &TagIndex {
        &self.tags
    }

    /// Build the tag index from a full scan if that hasn't happened yet
    pub async fn initialize_tags(&self) -> StorageResult<()> {
        self.tags.initialize(&self.store).await
    }

    pub async fn read(&self, path: &str) -> StorageResult<Document> {
        self.store.read(path).await
    }

    /// Create a new document; fails if the path is taken
    pub async fn create(&self, document: &Document) -> StorageResult<String> {
        let path = self.store.create(document).await?;
        self.index(&path, document);
        Ok(path)
    }

    /// Write a document, replacing any existing one
    pub async fn write(&self, document: &Document) -> StorageResult<String> {
        let path = self.store.write(document).await?;
        self.index(&path, document);
        Ok(path)
    }

    /// Merge `metadata` into the existing header and optionally replace the
    /// body. A `null` metadata value removes that key.
    pub async fn update(
        &self,
        path: &str,
        metadata: Option<Metadata>,
        body: Option<String>,
    ) -> StorageResult<Document> {
        let mut document = self.store.read(path).await?;

        if let Some(changes) = metadata {
            for (key, value) in changes {
                if value.is_null() {
                    document.metadata.remove(&key);
                } else {
                    document.metadata.insert(key, value);
                }
            }
        }
        if let Some(body) = body {
            document.body = body;
        }

        self.write(&document).await?;
        Ok(document)
    }

    pub async fn delete(&self, path: &str) -> StorageResult<String> {
        let path = self.store.delete(path).await?;
        self.tags.write().remove_document(&path);
        debug!("Removed {} from tag index", path);
        Ok(path)
    }

    pub async fn list(&self, folder: &str) -> StorageResult<Vec<String>> {
        self.store.list(folder).await
    }

    /// Run a query with the configured defaults, optionally overriding the
    /// output format and fields
    pub async fn query(
        &self,
        query: &str,
        format: Option<OutputFormat>,
        fields: Option<Vec<String>>,
    ) -> QueryResult<String> {
        let options = QueryOptions {
            default_format: self.query.default_format,
            format,
            fields,
            max_results: self.query.max_results,
        };
        nexus_query::run(&self.store, query, &options).await
    }

    fn index(&self, path: &str, document: &Document) {
        self.tags.write().index_document(path, &document.tags());
    }
}
